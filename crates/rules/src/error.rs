//! Construction and execution errors for conditions, actions and rules.

/// Errors raised while building or executing a rule.
///
/// All of them are deterministic: retrying with the same input fails the
/// same way, so callers report the rule and move on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// Missing or unrecognised condition operator.
    #[error("Invalid operation: '{0}'")]
    InvalidOperation(String),

    /// Field is not part of the entity type's effective schema.
    #[error("Invalid field: {field} for entity type: {entity_type}")]
    InvalidField { field: String, entity_type: String },

    /// A field was given an empty-string value.
    #[error("Field cannot be empty: {0}")]
    EmptyField(String),

    /// Action operation outside `set` / `delete-entity`.
    #[error("Unknown action: '{0}'")]
    UnknownAction(String),

    /// `set` action without a target field.
    #[error("Action '{0}' requires a field")]
    MissingField(String),

    /// Value cannot take the shape its operator requires.
    #[error("Invalid value for '{op}' on field '{field}': {reason}")]
    InvalidValue {
        field: String,
        op: String,
        reason: String,
    },

    /// Stored rule record could not be decoded.
    #[error("Failed to decode stored rule: {0}")]
    Decode(String),
}

impl RuleError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            RuleError::InvalidOperation(_) => "invalid-operation",
            RuleError::InvalidField { .. } => "invalid-field",
            RuleError::EmptyField(_) => "empty-field",
            RuleError::UnknownAction(_) => "unknown-action",
            RuleError::MissingField(_) => "missing-field",
            RuleError::InvalidValue { .. } => "invalid-value",
            RuleError::Decode(_) => "decode",
        }
    }

    /// Message suitable for showing next to the offending rule.
    pub fn user_message(&self) -> String {
        match self {
            RuleError::InvalidField { field, entity_type } => {
                format!("invalid field {} for entity type {}", field, entity_type)
            }
            RuleError::EmptyField(_) => "Value cannot be empty".to_string(),
            RuleError::MissingField(_) => {
                "Please choose a valid field for this type of rule".to_string()
            }
            RuleError::InvalidValue { reason, .. } => format!("Invalid value: {}", reason),
            other => other.to_string(),
        }
    }
}

/// Result alias for rule construction and execution.
pub type Result<T> = std::result::Result<T, RuleError>;
