//! spectra — observed and expected summary statistics.
//!
//! Purpose
//! -------
//! Containers for the two statistic families the inference core fits:
//! two-locus heterozygosity spectra ([`h2::H2Spectrum`]) and joint
//! site-frequency spectra ([`sfs::Sfs`]), plus the block bootstrap that
//! produces H2 data and its covariances ([`bootstrap`]).
//!
//! Key behaviors
//! -------------
//! - Containers validate their shapes on construction and are immutable
//!   afterwards; transformations return new values.
//! - Archives are JSON files with ndarray's serde encoding.
//!
//! Downstream usage
//! ----------------
//! - `optimization::likelihood` scores model spectra against data.
//! - `inference` uses bootstrap replicates for Godambe estimation.
pub mod bootstrap;
pub mod errors;
pub mod h2;
pub mod sfs;

pub mod prelude {
    pub use super::bootstrap::{bootstrap_h2, H2Archive, WindowCounts};
    pub use super::errors::{StatsError, StatsResult};
    pub use super::h2::{pair_ids, H2Spectrum};
    pub use super::sfs::{read_sfs, sfs_log_likelihood, Sfs, SfsArchive, SfsSelection};
}
