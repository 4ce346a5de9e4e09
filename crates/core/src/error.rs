use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown operator: '{0}'")]
    UnknownOperator(String),

    #[error("Unknown field type: '{0}'")]
    UnknownFieldType(String),

    #[error("Invalid config value for {key}: '{value}'")]
    InvalidConfig { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
