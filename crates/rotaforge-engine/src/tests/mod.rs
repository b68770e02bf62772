//! Tests for the constraint lifecycle.

use std::sync::Arc;

use rotaforge_config::EngineConfig;
use rotaforge_core::{ProblemSpecification, Translator};
use rotaforge_expr::Limits;

use crate::factory::VariableFactory;
use crate::session::ScheduleSession;

mod driver;
mod infeasibility;
mod registry;
mod session;
mod validator;

fn factory(spec: ProblemSpecification) -> Arc<VariableFactory> {
    Arc::new(VariableFactory::new(spec, Limits::default()).unwrap())
}

fn session(spec: ProblemSpecification, translator: Arc<dyn Translator>) -> ScheduleSession {
    ScheduleSession::new(spec, EngineConfig::default(), translator).unwrap()
}

fn session_with(spec: ProblemSpecification, config: EngineConfig, translator: Arc<dyn Translator>) -> ScheduleSession {
    ScheduleSession::new(spec, config, translator).unwrap()
}
