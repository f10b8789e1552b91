//! Release-candidate verification pipeline.
//!
//! Mirrors a candidate's published artifact tree into a local staging
//! area, runs the bundled integrity validator, extracts the single
//! source distribution, and builds it once per installed toolchain
//! environment, aggregating everything into one run summary with a
//! single pass/fail exit code.
//!
//! The crate is organized around the pipeline's stages:
//!
//! - [`staging`]: staging directory lifecycle and artifact layout
//! - [`fetch`]: recursive mirroring and local exclusion pruning
//! - [`validate`]: integrity validator invocation and classification
//! - [`archive`]: source tarball location and extraction
//! - [`toolchain`]: environment enumeration and alternative switching
//! - [`build`]: per-environment build execution with failure isolation
//! - [`summary`]: run aggregation and the persisted run summary
//! - [`pipeline`]: the stage sequencer tying it all together
//!
//! Supporting modules: [`tool`] wraps external command invocation,
//! [`classifier`] scans tool output for success markers, [`config`]
//! carries the tunable surface, and [`signal`] handles interrupts.

pub mod archive;
pub mod build;
pub mod classifier;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod signal;
pub mod staging;
pub mod summary;
pub mod tool;
pub mod toolchain;
pub mod validate;

pub use config::VerifyConfig;
pub use pipeline::{Pipeline, PipelineError};
pub use summary::RunSummary;
