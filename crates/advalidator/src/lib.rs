//! Declarative field validation driven by per-field tags.
//!
//! Fields carry a rule expression under the `validate` tag key and the
//! engine reports every violation of one record in a single pass:
//!
//! ```
//! use advalidator::Record;
//!
//! #[derive(Record)]
//! pub struct Ad {
//!     #[tag(validate = "len:20")]
//!     pub title: String,
//!     #[tag(validate = "len:5")]
//!     pub slug: String,
//! }
//!
//! let ad = Ad { title: String::new(), slug: "too-long".into() };
//! let err = advalidator::validate(&ad).unwrap_err();
//! assert_eq!(err.validation_errors().map(|e| e.len()), Some(2));
//! ```

// Lets the derive output, which names `::advalidator`, build inside this crate.
extern crate self as advalidator;

mod config;
mod engine;
mod error;
pub mod inspect;
pub mod rules;

pub use advalidator_macros::{validation_rule, Record};
pub use config::{load_config, EngineConfig, DEFAULT_TAG_KEY};
pub use engine::{validate, Engine};
pub use error::{Error, RuleError, ValidationError, ValidationErrors};
pub use inspect::{Field, Inspect, Kind, Record, Tags, Value};
pub use rules::{LenRule, Rule, RuleRegistration, RuleSet};

#[doc(hidden)]
pub use inventory;
