//! Shared test fixtures for RotaForge crates.
//!
//! This crate depends only on `rotaforge-core`, so any crate can use it as a
//! dev-dependency without cycles.
//!
//! - [`specs`] - ready-made problem specifications
//! - [`snippets`] - constraint code in the RotaForge expression language
//! - [`translator`] - [`ScriptedTranslator`], a deterministic translation service
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rotaforge-test = { workspace = true }
//! ```
//!
//! ```
//! use rotaforge_core::Translator;
//! use rotaforge_test::{snippets, specs, ScriptedTranslator};
//!
//! let spec = specs::three_by_two_by_two();
//! let translator = ScriptedTranslator::new().with_response("cover", snippets::coverage(1, 2));
//! assert!(translator.translate("cover", &spec).is_ok());
//! ```

pub mod snippets;
pub mod specs;
pub mod translator;

pub use translator::ScriptedTranslator;
