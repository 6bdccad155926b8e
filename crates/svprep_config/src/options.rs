//! The lowering options recognized by emission preparation.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An output-quality heuristic deciding which expressions get their own wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireSpillingHeuristic {
    /// Spill every expression carrying a user name hint; spill hints starting
    /// with `_` only once their term count reaches
    /// [`LoweringOptions::wire_spilling_namehint_term_limit`].
    SpillLargeTermsWithNamehints,
}

impl WireSpillingHeuristic {
    /// The spelling used in option strings and TOML files.
    pub fn as_str(self) -> &'static str {
        match self {
            WireSpillingHeuristic::SpillLargeTermsWithNamehints => "spillLargeTermsWithNamehints",
        }
    }
}

impl FromStr for WireSpillingHeuristic {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spillLargeTermsWithNamehints" => Ok(Self::SpillLargeTermsWithNamehints),
            _ => Err(ConfigError::InvalidValue {
                key: "wireSpillingHeuristic".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Target-language restrictions and output-quality knobs.
///
/// Defaults describe a modern SystemVerilog target: local variables are
/// allowed, expressions may be inlined into instance ports, event controls
/// must name a wire, and no spilling heuristic is active.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LoweringOptions {
    /// Forbid `automatic logic` declarations inside procedural code; forces
    /// expressions and side effects out to the enclosing graph region.
    pub disallow_local_variables: bool,
    /// Force every instance input through an explicit wire.
    pub disallow_expression_inlining_in_ports: bool,
    /// Allow arbitrary expressions in `always @(...)` event controls.
    pub allow_expr_in_event_control: bool,
    /// Never emit a mux (`?:`) inline.
    pub disallow_mux_inlining: bool,
    /// Expressions estimated larger than this are always spilled.
    pub maximum_number_of_terms_per_expression: usize,
    /// The active spilling heuristics.
    pub wire_spilling_heuristic: Vec<WireSpillingHeuristic>,
    /// Term threshold for `_`-prefixed name hints under
    /// [`WireSpillingHeuristic::SpillLargeTermsWithNamehints`].
    pub wire_spilling_namehint_term_limit: usize,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            disallow_local_variables: false,
            disallow_expression_inlining_in_ports: false,
            allow_expr_in_event_control: false,
            disallow_mux_inlining: false,
            maximum_number_of_terms_per_expression: 256,
            wire_spilling_heuristic: Vec::new(),
            wire_spilling_namehint_term_limit: 3,
        }
    }
}

impl LoweringOptions {
    /// Returns `true` if the given spilling heuristic is enabled.
    pub fn is_wire_spilling_heuristic_enabled(&self, heuristic: WireSpillingHeuristic) -> bool {
        self.wire_spilling_heuristic.contains(&heuristic)
    }

    /// Parses a comma-separated option string such as
    /// `"disallowLocalVariables,maximumNumberOfTermsPerExpression=16"`.
    ///
    /// Boolean options may be given bare (meaning `true`) or as `key=true|false`.
    /// Unlisted options keep their defaults.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match item.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (item, None),
            };
            options.set(key, value)?;
        }
        options.validate()?;
        Ok(options)
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), ConfigError> {
        match key {
            "disallowLocalVariables" => self.disallow_local_variables = parse_flag(key, value)?,
            "disallowExpressionInliningInPorts" => {
                self.disallow_expression_inlining_in_ports = parse_flag(key, value)?
            }
            "allowExprInEventControl" => {
                self.allow_expr_in_event_control = parse_flag(key, value)?
            }
            "disallowMuxInlining" => self.disallow_mux_inlining = parse_flag(key, value)?,
            "maximumNumberOfTermsPerExpression" => {
                self.maximum_number_of_terms_per_expression = parse_count(key, value)?
            }
            "wireSpillingNamehintTermLimit" => {
                self.wire_spilling_namehint_term_limit = parse_count(key, value)?
            }
            "wireSpillingHeuristic" => {
                let value = value.ok_or_else(|| missing_value(key))?;
                let heuristic: WireSpillingHeuristic = value.parse()?;
                if !self.wire_spilling_heuristic.contains(&heuristic) {
                    self.wire_spilling_heuristic.push(heuristic);
                }
            }
            _ => return Err(ConfigError::UnknownOption(key.to_string())),
        }
        Ok(())
    }

    /// Checks that numeric thresholds are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_number_of_terms_per_expression == 0 {
            return Err(ConfigError::ValidationError(
                "maximumNumberOfTermsPerExpression must be at least 1".to_string(),
            ));
        }
        if self.wire_spilling_namehint_term_limit == 0 {
            return Err(ConfigError::ValidationError(
                "wireSpillingNamehintTermLimit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn missing_value(key: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: String::new(),
    }
}

fn parse_flag(key: &str, value: Option<&str>) -> Result<bool, ConfigError> {
    match value {
        None | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_count(key: &str, value: Option<&str>) -> Result<usize, ConfigError> {
    let value = value.ok_or_else(|| missing_value(key))?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Prints the options that differ from the defaults, in option-string syntax.
impl fmt::Display for LoweringOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defaults = Self::default();
        let mut items: Vec<String> = Vec::new();
        if self.disallow_local_variables {
            items.push("disallowLocalVariables".to_string());
        }
        if self.disallow_expression_inlining_in_ports {
            items.push("disallowExpressionInliningInPorts".to_string());
        }
        if self.allow_expr_in_event_control {
            items.push("allowExprInEventControl".to_string());
        }
        if self.disallow_mux_inlining {
            items.push("disallowMuxInlining".to_string());
        }
        if self.maximum_number_of_terms_per_expression
            != defaults.maximum_number_of_terms_per_expression
        {
            items.push(format!(
                "maximumNumberOfTermsPerExpression={}",
                self.maximum_number_of_terms_per_expression
            ));
        }
        for heuristic in &self.wire_spilling_heuristic {
            items.push(format!("wireSpillingHeuristic={}", heuristic.as_str()));
        }
        if self.wire_spilling_namehint_term_limit != defaults.wire_spilling_namehint_term_limit {
            items.push(format!(
                "wireSpillingNamehintTermLimit={}",
                self.wire_spilling_namehint_term_limit
            ));
        }
        f.write_str(&items.join(","))
    }
}
