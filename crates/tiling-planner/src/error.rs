use thiserror::Error;

/// Every way a planning call (or the configuration feeding it) can fail.
///
/// The planning variants carry the path of the offending input and its
/// value so the operator invocation that asked for a plan can report
/// exactly what it got wrong.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid shape: {field} = {value}")]
    InvalidShape { field: String, value: String },

    #[error("Invalid platform: {field} = {value}")]
    InvalidPlatform { field: String, value: String },

    #[error("Capacity exceeded: {field} = {value}")]
    CapacityExceeded { field: String, value: String },

    #[error("Unsupported configuration: {field} = {value}")]
    UnsupportedConfiguration { field: String, value: String },

    #[error("Serialization overflow: {field} = {value}")]
    SerializationOverflow { field: String, value: String },

    #[error("Malformed plan record: expected {expected} bytes, got {actual}")]
    MalformedRecord { expected: usize, actual: usize },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Coarse classification of a [`PlanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidShape,
    InvalidPlatform,
    CapacityExceeded,
    UnsupportedConfiguration,
    SerializationOverflow,
    Decode,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidShape => "invalid_shape",
            Self::InvalidPlatform => "invalid_platform",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::UnsupportedConfiguration => "unsupported_configuration",
            Self::SerializationOverflow => "serialization_overflow",
            Self::Decode => "decode",
            Self::Config => "config",
        };
        write!(f, "{s}")
    }
}

impl PlanError {
    pub fn invalid_shape(field: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidShape {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn invalid_platform(field: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidPlatform {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn capacity_exceeded(field: impl Into<String>, value: impl ToString) -> Self {
        Self::CapacityExceeded {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn unsupported(field: impl Into<String>, value: impl ToString) -> Self {
        Self::UnsupportedConfiguration {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn overflow(field: impl Into<String>, value: impl ToString) -> Self {
        Self::SerializationOverflow {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidShape { .. } => ErrorKind::InvalidShape,
            Self::InvalidPlatform { .. } => ErrorKind::InvalidPlatform,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::UnsupportedConfiguration { .. } => ErrorKind::UnsupportedConfiguration,
            Self::SerializationOverflow { .. } => ErrorKind::SerializationOverflow,
            Self::MalformedRecord { .. } => ErrorKind::Decode,
            Self::Io(_) | Self::Yaml(_) => ErrorKind::Config,
        }
    }

    /// Path of the offending input, for the planning variants.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidShape { field, .. }
            | Self::InvalidPlatform { field, .. }
            | Self::CapacityExceeded { field, .. }
            | Self::UnsupportedConfiguration { field, .. }
            | Self::SerializationOverflow { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Offending value rendered as text, for the planning variants.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::InvalidShape { value, .. }
            | Self::InvalidPlatform { value, .. }
            | Self::CapacityExceeded { value, .. }
            | Self::UnsupportedConfiguration { value, .. }
            | Self::SerializationOverflow { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Violation {
    pub severity: Severity,
    pub rule: String,
    pub message: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        };
        write!(f, "[{prefix}] {}: {}", self.rule, self.message)
    }
}
