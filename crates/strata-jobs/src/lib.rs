//! Background chunk work: a fixed worker pool that generates, meshes and
//! saves chunks from owned snapshots, handing results back by polling.

mod context;
mod job;
mod process;
mod scheduler;

pub use context::JobContext;
pub use job::{
    GenerateJob, GenerateResult, Job, JobFailure, JobKind, MeshJob, MeshResult, SaveJob,
    SaveResult,
};
pub use process::{JobOutput, run_generate, run_job, run_mesh, run_save};
pub use scheduler::{JobScheduler, default_worker_count};
