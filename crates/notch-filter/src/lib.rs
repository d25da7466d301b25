//! Pure, line-oriented filter pipeline for notch device command output.
//! No I/O, no blocking; the only signals this crate raises are encoded in
//! [`pipeline::PipelineOutcome`].

pub mod descriptor;
pub mod pipeline;

pub use descriptor::{Filter, FilterDescriptor, FilterSpec};
pub use pipeline::{apply, PipelineOutcome};
