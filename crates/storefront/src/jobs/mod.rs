//! Background post generation.
//!
//! - `generator` - Runs the external generator process for one job
//! - `schedule` - Weekly triggers and the scheduler that fires them

pub mod generator;
pub mod schedule;

use std::future::Future;

use powerchip_core::JobResult;

pub use generator::{GenerationJob, GeneratorError, GeneratorInvoker};
pub use schedule::{Scheduler, SchedulerHandle, Trigger, WEEKLY_TRIGGERS};

/// Something that can execute a generation job.
///
/// Production code uses [`GeneratorInvoker`]; tests substitute recorders.
pub trait JobRunner: Send + Sync + 'static {
    /// Execute one job to completion.
    fn run(
        &self,
        job: &GenerationJob,
    ) -> impl Future<Output = Result<JobResult, GeneratorError>> + Send;
}
