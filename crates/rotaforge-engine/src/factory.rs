//! Decision Variable Factory.
//!
//! Runs the specification's variable schema against a fresh solver session and
//! registers the resulting containers, including the primary container bound to `x`.

use rotaforge_core::{ProblemSpecification, Result, RotaForgeError};
use rotaforge_expr::{ContainerSet, Limits, Mode, Sandbox, Symbols, VarContainer};
use rotaforge_milp::Model;

/// True for container names that hold decision variables: `x` or `x_<suffix>`.
pub fn is_decision_container(name: &str) -> bool {
    name == "x" || name.starts_with("x_")
}

/// Builds variable containers from a [`ProblemSpecification`].
#[derive(Debug, Clone)]
pub struct VariableFactory {
    spec: ProblemSpecification,
    symbols: Symbols,
    limits: Limits,
}

impl VariableFactory {
    /// Validates the specification and binds its symbols.
    pub fn new(spec: ProblemSpecification, limits: Limits) -> Result<Self> {
        spec.validate()?;
        let symbols = Symbols::from_spec(&spec);
        Ok(Self {
            spec,
            symbols,
            limits,
        })
    }

    pub fn spec(&self) -> &ProblemSpecification {
        &self.spec
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// A sandbox reading this specification's symbols.
    pub fn sandbox(&self) -> Sandbox<'_> {
        Sandbox::new(&self.symbols, self.limits)
    }

    /// Declares the schema's containers on `model`.
    ///
    /// Fails with [`RotaForgeError::Schema`] when the schema does not run or declares
    /// no decision container. With several decision containers the primary one is
    /// their union, keyed by container name first.
    pub fn build(&self, model: &mut Model) -> Result<ContainerSet> {
        let mut containers = ContainerSet::new();
        self.sandbox()
            .run(
                self.spec.decision_variable_schema(),
                Mode::Schema,
                model,
                &mut containers,
            )
            .map_err(|e| RotaForgeError::Schema(e.to_string()))?;

        let decision: Vec<&VarContainer> = containers
            .iter()
            .filter(|c| is_decision_container(c.name()))
            .collect();
        let primary = match decision.as_slice() {
            [] => {
                return Err(RotaForgeError::Schema(
                    "schema declares no decision container (expected 'x' or 'x_<name>')".into(),
                ));
            }
            [single] => (*single).clone(),
            many => VarContainer::union(ContainerSet::PRIMARY, many.iter().copied()),
        };
        containers.set_primary(primary);
        Ok(containers)
    }
}

/// Position of the entity id within primary container keys.
pub fn entity_part(containers: &ContainerSet) -> usize {
    let decision = containers
        .iter()
        .filter(|c| is_decision_container(c.name()))
        .count();
    usize::from(decision > 1)
}
