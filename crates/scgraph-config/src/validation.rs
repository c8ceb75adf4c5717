//! SynthDef interface validation.
//!
//! Catches what the builder or encoder would reject later (unencodable
//! names, duplicate parameters, unknown rates) and reports every problem at
//! once instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use scgraph_config::{ParameterConfig, SynthDefConfig, ValidationError, validate_config};
//!
//! let config = SynthDefConfig::new("sine")
//!     .with_parameter(ParameterConfig::new("frequency", 440.0))
//!     .with_parameter(ParameterConfig::new("frequency", 880.0));
//!
//! assert_eq!(
//!     validate_config(&config),
//!     Err(ValidationError::DuplicateParameter("frequency".to_string()))
//! );
//! ```

use std::collections::HashSet;

use scgraph_core::ParameterRate;
use thiserror::Error;

use crate::synthdef_config::{ParameterConfig, SynthDefConfig};

/// Longest name the SCgf length prefix can hold.
const MAX_NAME_LEN: usize = 255;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The SynthDef name is empty.
    #[error("SynthDef name is empty")]
    EmptyName,

    /// A name cannot be encoded.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Why it cannot be encoded.
        reason: &'static str,
    },

    /// A parameter name appears more than once.
    #[error("duplicate parameter name: {0}")]
    DuplicateParameter(String),

    /// A rate string is not recognized.
    #[error("unknown rate '{rate}' for parameter '{parameter}'")]
    InvalidRate {
        /// Name of the parameter.
        parameter: String,
        /// The rate as written.
        rate: String,
    },

    /// A parameter has an empty value array.
    #[error("parameter '{0}' has no values")]
    EmptyValue(String),

    /// A parameter value is NaN or infinite.
    #[error("parameter '{parameter}' value {value} is not finite")]
    NonFiniteValue {
        /// Name of the parameter.
        parameter: String,
        /// The offending value.
        value: f32,
    },

    /// A lag is negative, not finite, or set on a rate that cannot lag.
    #[error("invalid lag for parameter '{parameter}': {reason}")]
    InvalidLag {
        /// Name of the parameter.
        parameter: String,
        /// Description of the problem.
        reason: &'static str,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_name(name: &str, errors: &mut Vec<ValidationError>) {
    let reason = if !name.is_ascii() {
        "must be ASCII"
    } else if name.len() > MAX_NAME_LEN {
        "longer than 255 bytes"
    } else {
        return;
    };
    errors.push(ValidationError::InvalidName {
        name: name.to_string(),
        reason,
    });
}

fn parameter_errors(parameter: &ParameterConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if parameter.name.is_empty() {
        errors.push(ValidationError::InvalidName {
            name: String::new(),
            reason: "parameter name is empty",
        });
    }
    check_name(&parameter.name, &mut errors);

    let values = parameter.value.to_vec();
    if values.is_empty() {
        errors.push(ValidationError::EmptyValue(parameter.name.clone()));
    }
    if let Some(&value) = values.iter().find(|v| !v.is_finite()) {
        errors.push(ValidationError::NonFiniteValue {
            parameter: parameter.name.clone(),
            value,
        });
    }

    let rate = parameter.parameter_rate();
    if let Err(error) = &rate {
        errors.push(error.clone());
    }
    if let Some(lag) = parameter.lag {
        let reason = if !lag.is_finite() || lag < 0.0 {
            Some("must be finite and non-negative")
        } else if matches!(rate, Ok(r) if r != ParameterRate::Control) {
            Some("only control-rate parameters can lag")
        } else {
            None
        };
        if let Some(reason) = reason {
            errors.push(ValidationError::InvalidLag {
                parameter: parameter.name.clone(),
                reason,
            });
        }
    }
    errors
}

fn collapse(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validate a single parameter entry.
pub fn validate_parameter(parameter: &ParameterConfig) -> ValidationResult<()> {
    collapse(parameter_errors(parameter))
}

/// Validate a whole config, collecting every problem.
pub fn validate_config(config: &SynthDefConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if config.name.is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    check_name(&config.name, &mut errors);

    let mut seen = HashSet::new();
    for parameter in &config.parameters {
        if !seen.insert(parameter.name.as_str()) {
            errors.push(ValidationError::DuplicateParameter(parameter.name.clone()));
        }
        errors.extend(parameter_errors(parameter));
    }
    collapse(errors)
}
