//! RotaForge Engine - the constraint lifecycle of a shift schedule
//!
//! Natural-language constraints are translated to code, validated against a
//! disposable model instance, registered, and replayed onto a freshly rebuilt model
//! on every solve. Infeasible models are diagnosed with a conflict set mapped back
//! to phrases, then relaxed with slack variables.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rotaforge_config::EngineConfig;
//! use rotaforge_core::{Horizon, ProblemSpecification, SolveStatus};
//! use rotaforge_engine::ScheduleSession;
//! use rotaforge_test::ScriptedTranslator;
//!
//! let spec = ProblemSpecification::new(Horizon::new(1, 2), "x = binary[staff, days, slots];")
//!     .with_entity_list("staff", ["ana", "ben"]);
//! let translator = ScriptedTranslator::new().with_response(
//!     "someone covers every slot",
//!     "for d in days { for s in slots { constrain \"cover_{d}_{s}\": sum(e in staff: x[e, d, s]) >= 1; } }",
//! );
//!
//! let mut session = ScheduleSession::new(spec, EngineConfig::default(), Arc::new(translator)).unwrap();
//! session.add_constraint("someone covers every slot").unwrap();
//!
//! let report = session.solve();
//! assert_eq!(report.status, SolveStatus::Optimal);
//! assert!(report.assignment.as_ref().unwrap().count_at(0, 1) >= 1);
//! ```

pub mod analyzer;
pub mod assignment;
pub mod driver;
pub mod export;
pub mod factory;
pub mod instance;
pub mod manager;
mod objective;
pub mod provenance;
pub mod registry;
pub mod session;
pub mod validator;

#[cfg(test)]
mod tests;

pub use analyzer::{Diagnosis, InfeasibilityAnalyzer, RelaxationReport, SlackEntry};
pub use assignment::{Assignment, Shift, DEFAULT_ROUNDING_THRESHOLD};
pub use driver::{DriverState, OptimizerDriver, SolveReport};
pub use export::{ResultExporter, ScheduleRow, ScheduleTable, TableExporter};
pub use factory::VariableFactory;
pub use instance::ModelInstance;
pub use manager::SessionManager;
pub use objective::{ObjectiveKind, LOAD_MAX, LOAD_MIN};
pub use provenance::ProvenanceIndex;
pub use registry::{CommitOutcome, ConstraintRecord, ConstraintRegistry, ReplaySummary};
pub use session::{AddOutcome, ScheduleSession};
pub use validator::{
    retry_phrase, ConstraintValidator, ResubmitApproval, ValidationOutcome, ValidationResult, RETRY_PROMPT,
};
