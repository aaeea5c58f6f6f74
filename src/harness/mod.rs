//! Measurement-collection harness
//!
//! - `recorder`: one invocation attempt turned into one `Measurement`
//! - `scheduler`: randomized treatment order, paired A-then-B repetitions,
//!   failure isolation at invocation and treatment level

pub mod recorder;
pub mod scheduler;

pub use recorder::{InvocationOutcome, Recorder};
pub use scheduler::{
    ErrorPolicy, RunReport, RunResolution, Scheduler, SchedulerConfig, Treatment, FILTER_QUERIES, PAGE_RANGE, USER_LOGINS,
};
