//! RotaForge - natural-language constraints for shift scheduling
//!
//! Phrases are translated into constraint code, validated in a sandbox, kept in a
//! registry and replayed onto a freshly built MILP on every solve. Infeasible
//! schedules come back with the conflicting phrases and a slack relaxation.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rotaforge::prelude::*;
//! use rotaforge_test::ScriptedTranslator;
//!
//! let spec = ProblemSpecification::new(Horizon::new(2, 1), "x = binary[staff, days, slots];")
//!     .with_entity_list("staff", ["ana", "ben"]);
//! let translator = ScriptedTranslator::new().with_response(
//!     "ben covers day one",
//!     "constrain \"ben_on\": x[\"ben\", 0, 0] == 1; constrain \"ana_off\": x[\"ana\", 0, 0] == 0;",
//! );
//!
//! let mut session = ScheduleSession::new(spec, EngineConfig::default(), Arc::new(translator)).unwrap();
//! session.add_constraint("ben covers day one").unwrap();
//!
//! let report = session.solve();
//! assert_eq!(report.state, DriverState::Optimal);
//! assert_eq!(session.export().unwrap().cell(0, "ana"), Some("Rest"));
//! ```

// Shared vocabulary
pub use rotaforge_core::{
    Horizon, KeyPart, ProblemSpecification, Result, RotaForgeError, SolveStatus, SpecificationInput,
    TranslationError, Translator, VarKey,
};

pub use rotaforge_config::{ConfigError, EngineConfig};

// Lifecycle engine
pub use rotaforge_engine::{
    Assignment, CommitOutcome, ConstraintRecord, ConstraintRegistry, ConstraintValidator, Diagnosis,
    DriverState, ModelInstance, OptimizerDriver, ProvenanceIndex, RelaxationReport, ResubmitApproval,
    ResultExporter, ScheduleSession, ScheduleTable, SessionManager, SolveReport, TableExporter,
    ValidationOutcome, VariableFactory,
};

/// The solver session backing a model instance.
pub mod milp {
    pub use rotaforge_milp::*;
}

/// The sandboxed expression language.
pub mod expr {
    pub use rotaforge_expr::*;
}

/// Console output for engine events.
pub mod console {
    pub use rotaforge_console::init;
}

pub mod prelude {
    pub use super::{Horizon, ProblemSpecification, RotaForgeError, SolveStatus, Translator};
    pub use super::{DriverState, EngineConfig, ScheduleSession, SessionManager, SolveReport};
    pub use super::{ResultExporter, TableExporter};
}
