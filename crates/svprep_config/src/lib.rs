//! Lowering options that control how a design is prepared for emission.
//!
//! Options can be read from the `[lowering]` table of a TOML file or parsed
//! from the comma-separated option string accepted on the command line
//! (`disallowLocalVariables,maximumNumberOfTermsPerExpression=16`).

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod options;

pub use error::ConfigError;
pub use loader::{load_options, load_options_from_str};
pub use options::{LoweringOptions, WireSpillingHeuristic};
