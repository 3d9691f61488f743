//! File actions.
//!
//! The only mutation tunedupe ever performs is deleting a planned duplicate.
//! [`delete::execute_plan`] honours the simulate/execute mode:
//! - Simulate reports the plan and touches nothing
//! - Execute moves candidates to the system trash (recoverable), or removes
//!   them permanently when explicitly configured
//!
//! ```no_run
//! use tunedupe::actions::{execute_plan, ExecutionConfig};
//! use tunedupe::retention::RetentionPlan;
//!
//! let report = execute_plan(&RetentionPlan::default(), &ExecutionConfig::execute(false)).unwrap();
//! println!("{}", report.summary());
//! ```

pub mod delete;

pub use delete::{
    delete_to_trash, execute_plan, permanent_delete, verify_size, DeleteError, DeleteFailure,
    ExecutionConfig, ExecutionMode, ExecutionReport,
};
