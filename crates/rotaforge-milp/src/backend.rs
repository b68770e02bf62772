//! HiGHS backend: lowers a [`Model`] to a row problem and maps the result back.

use highs::{Col, HighsModelStatus, RowProblem, Sense as HighsSense};
use tracing::debug;

use crate::expr::Sense;
use crate::model::{Model, ObjectiveSense, Status};
use crate::settings::SolverSettings;

/// Which rows and which objective one backend call sees.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    /// Constraints to keep, by position; all of them when `None`.
    pub active: Option<&'a [bool]>,
    /// Solve the feasibility problem only.
    pub feasibility_only: bool,
}

impl Scope<'_> {
    pub fn full() -> Self {
        Scope {
            active: None,
            feasibility_only: false,
        }
    }

    fn keeps(&self, index: usize) -> bool {
        self.active.map_or(true, |a| a.get(index).copied().unwrap_or(true))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub status: Status,
    pub solution: Option<Vec<f64>>,
}

impl Outcome {
    fn without_solution(status: Status) -> Self {
        Self {
            status,
            solution: None,
        }
    }
}

pub(crate) fn solve(model: &Model, scope: Scope<'_>) -> Outcome {
    let tol = model.settings().feasibility_tol;

    let mut cost = vec![0.0; model.num_variables()];
    if !scope.feasibility_only {
        for (var, coef) in model.objective().expr.terms() {
            cost[var.index()] += coef;
        }
    }

    let mut problem = RowProblem::default();
    let mut cols: Vec<Col> = Vec::with_capacity(model.num_variables());
    for (id, var) in model.variables() {
        let bounds = var.lower..=var.upper;
        let col = if var.var_type.is_integral() {
            problem.add_integer_column(cost[id.index()], bounds)
        } else {
            problem.add_column(cost[id.index()], bounds)
        };
        cols.push(col);
    }

    for (index, c) in model.constraints().iter().enumerate() {
        if !scope.keeps(index) {
            continue;
        }
        let expr = c.row.expr.normalized();
        let rhs = c.row.rhs - expr.constant_value();
        if expr.terms().is_empty() {
            if !c.row.sense.holds(0.0, rhs, tol) {
                return Outcome::without_solution(Status::Infeasible);
            }
            continue;
        }
        let factors: Vec<(Col, f64)> = expr
            .terms()
            .iter()
            .map(|(var, coef)| (cols[var.index()], *coef))
            .collect();
        match c.row.sense {
            Sense::Le => problem.add_row(..=rhs, &factors),
            Sense::Ge => problem.add_row(rhs.., &factors),
            Sense::Eq => problem.add_row(rhs..=rhs, &factors),
        }
    }

    if cols.is_empty() {
        return Outcome {
            status: Status::Optimal,
            solution: Some(Vec::new()),
        };
    }

    let sense = match model.objective().sense {
        ObjectiveSense::Minimize => HighsSense::Minimise,
        ObjectiveSense::Maximize => HighsSense::Maximise,
    };
    let mut highs = match problem.try_optimise(sense) {
        Ok(highs) => highs,
        Err(status) => {
            debug!(component = "milp", operation = "load", model = %model.name(), status = ?status, "backend rejected model");
            return Outcome::without_solution(Status::NumericError);
        }
    };
    configure(&mut highs, model.settings());

    let solved = match highs.try_solve() {
        Ok(solved) => solved,
        Err(status) => {
            debug!(component = "milp", operation = "solve", model = %model.name(), status = ?status, "backend failed");
            return Outcome::without_solution(Status::NumericError);
        }
    };

    let values = round_integral(model, solved.get_solution().columns());
    match solved.status() {
        HighsModelStatus::Optimal => Outcome {
            status: Status::Optimal,
            solution: Some(values),
        },
        HighsModelStatus::Infeasible => Outcome::without_solution(Status::Infeasible),
        HighsModelStatus::Unbounded => Outcome::without_solution(Status::Unbounded),
        HighsModelStatus::UnboundedOrInfeasible => {
            if scope.feasibility_only {
                return Outcome::without_solution(Status::Infeasible);
            }
            let feasible = solve(
                model,
                Scope {
                    feasibility_only: true,
                    ..scope
                },
            );
            match feasible.status {
                Status::Infeasible => Outcome::without_solution(Status::Infeasible),
                Status::Optimal => Outcome::without_solution(Status::Unbounded),
                other => Outcome::without_solution(other),
            }
        }
        HighsModelStatus::LoadError
        | HighsModelStatus::ModelError
        | HighsModelStatus::PresolveError
        | HighsModelStatus::SolveError
        | HighsModelStatus::PostsolveError => Outcome::without_solution(Status::NumericError),
        // Time, node and iteration limits: keep the incumbent if the backend had one.
        _ if model.satisfies(&values, scope.active) => Outcome {
            status: Status::Suboptimal,
            solution: Some(values),
        },
        _ => Outcome::without_solution(Status::LimitReached),
    }
}

fn configure(highs: &mut highs::Model, settings: &SolverSettings) {
    highs.make_quiet();
    highs.set_option("threads", i32::try_from(settings.threads.max(1)).unwrap_or(1));
    highs.set_option("presolve", if settings.presolve { "on" } else { "off" });
    highs.set_option("random_seed", 0);
    highs.set_option("mip_rel_gap", settings.mip_gap);
    highs.set_option("mip_feasibility_tolerance", settings.integrality_tol);
    highs.set_option("primal_feasibility_tolerance", settings.feasibility_tol);
    if let Some(limit) = settings.time_limit {
        highs.set_option("time_limit", limit.as_secs_f64());
    }
    if let Some(nodes) = settings.node_limit {
        highs.set_option("mip_max_nodes", i32::try_from(nodes).unwrap_or(i32::MAX));
    }
}

fn round_integral(model: &Model, columns: &[f64]) -> Vec<f64> {
    model
        .variables()
        .zip(columns)
        .map(|((_, var), &value)| if var.var_type.is_integral() { value.round() } else { value })
        .collect()
}
