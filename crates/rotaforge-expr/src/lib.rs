//! Restricted expression language for RotaForge.
//!
//! Variable schemas, constraint code and objective code are small programs in this
//! language. They are parsed and interpreted, never executed as host code, and can
//! only read the symbols bound from the problem specification and the variable
//! containers of the model they run against.
//!
//! ```
//! use rotaforge_core::{Horizon, ProblemSpecification};
//! use rotaforge_expr::{ContainerSet, Limits, Mode, Sandbox, Symbols};
//! use rotaforge_milp::Model;
//!
//! let spec = ProblemSpecification::new(Horizon::new(2, 2), "x = binary[staff, days, slots];")
//!     .with_entity_list("staff", ["ana", "ben"]);
//! let symbols = Symbols::from_spec(&spec);
//! let sandbox = Sandbox::new(&symbols, Limits::default());
//!
//! let mut model = Model::new("doc");
//! let mut containers = ContainerSet::new();
//! sandbox
//!     .run(spec.decision_variable_schema(), Mode::Schema, &mut model, &mut containers)
//!     .unwrap();
//!
//! let code = r#"
//!     for d in days {
//!         for s in slots {
//!             constrain "cover_{d}_{s}": sum(e in staff: x[e, d, s]) >= 1;
//!         }
//!     }
//! "#;
//! let run = sandbox.run(code, Mode::Constraint, &mut model, &mut containers).unwrap();
//! assert_eq!(run.constraints, ["cover_0_0", "cover_0_1", "cover_1_0", "cover_1_1"]);
//! ```

pub mod ast;
mod container;
mod error;
mod interp;
mod lexer;
pub mod parser;
mod symbols;
mod value;


pub use container::{ContainerSet, VarContainer};
pub use error::{ExprError, ExprResult};
pub use interp::{Execution, Limits, Mode, Sandbox};
pub use parser::parse;
pub use symbols::Symbols;
pub use value::Value;
