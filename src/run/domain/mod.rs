//! Domain model for job-run orchestration.
//!
//! Runs are owned by the run state machine and mutate only in response to
//! completion of specific queue task instances, keeping every status change
//! behind the validated lifecycle methods on [`Run`].

mod error;
mod ids;
mod run;

pub use error::{ParseRunStatusError, RunDomainError};
pub use ids::{JobId, RunId, TaskOperationId};
pub use run::{PersistedRunData, Run, RunOutcome, RunStatus};
