//! The BUILD pipeline: per-sample reconstruction jobs and the parallel
//! driver that funnels them into the aggregation core.

pub mod reconstruct;
pub mod run;

pub use reconstruct::{derive_aminoacid_variants, reconstruct_feature, FeatureContext};
pub use run::{run, BuildArgs};
