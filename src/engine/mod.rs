//! Run engine: context, decisions and the per-descriptor pipeline.

pub mod context;
pub mod decision;
pub mod pipeline;

pub use context::{Overrides, RunContext};
pub use decision::{FetchReason, InstallDecision, PipelineState};
pub use pipeline::{DescriptorOutcome, Goal, Orchestrator, RunReport, deploy, install, resolve};
