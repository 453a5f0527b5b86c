//! Error taxonomy of the modelling runtime.

use std::fmt;

use mre_linalg::LinalgError;
use mre_random::RandomError;
use thiserror::Error;

use crate::kind::ValueKind;

/// Which constructor argument of a range carried an unusable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangePosition {
    /// The first value.
    First,
    /// The optional second value fixing the increment.
    Second,
    /// The last value.
    Last,
}

impl fmt::Display for RangePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Last => "last",
        };
        f.write_str(name)
    }
}

/// Errors raised by the value system and the numerical engine.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A range was constructed from a kind other than Integer or Real.
    #[error("invalid {position} range parameter of kind {kind}")]
    InvalidRangeParameter {
        /// Offending argument.
        position: RangePosition,
        /// Kind of the offending value.
        kind: ValueKind,
    },

    /// A 1-based index lies outside `[1, size]`.
    #[error("index {index} out of bounds for size {size}")]
    InvalidIndex {
        /// Requested index.
        index: i64,
        /// Current size of the container.
        size: u64,
    },

    /// A value lies outside the domain of an operation.
    #[error("invalid parameter value: {0}")]
    InvalidParameterValue(String),

    /// A value cannot be represented in the requested kind.
    #[error("cannot convert {from} to {to}")]
    InvalidRuntimeConversion {
        /// Kind of the source value.
        from: ValueKind,
        /// Requested kind.
        to: ValueKind,
    },

    /// A binary matrix operation received operands of mismatched shape.
    #[error("incompatible matrix dimensions {left:?} and {right:?}")]
    IncompatibleMatrixDimensions {
        /// Shape of the left operand as `(rows, cols)`.
        left: (usize, usize),
        /// Shape of the right operand as `(rows, cols)`.
        right: (usize, usize),
    },

    /// The matrix is singular to working precision.
    #[error("matrix is singular")]
    MatrixIsSingular,

    /// A unary matrix operation does not accept this shape.
    #[error("invalid matrix dimensions {rows}x{cols}")]
    InvalidMatrixDimensions {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// A byte string is not well-formed UTF-8.
    #[error("malformed UTF-8 at byte offset {offset}")]
    MalformedString {
        /// Offset of the first offending byte.
        offset: usize,
    },

    /// No implicit promotion joins the two kinds.
    #[error("no implicit conversion between {left} and {right}")]
    TypeConversionError {
        /// Kind of the left operand.
        left: ValueKind,
        /// Kind of the right operand.
        right: ValueKind,
    },

    /// The engine configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures while reading an engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A field holds an unusable value.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<RandomError> for ModelError {
    fn from(err: RandomError) -> Self {
        Self::InvalidParameterValue(err.to_string())
    }
}

impl From<LinalgError> for ModelError {
    fn from(err: LinalgError) -> Self {
        match err {
            LinalgError::DimensionMismatch { expected, got } => {
                Self::IncompatibleMatrixDimensions {
                    left: expected,
                    right: got,
                }
            }
            other => Self::InvalidParameterValue(other.to_string()),
        }
    }
}

/// Result type for the modelling runtime.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Shorthand for an [`ModelError::InvalidParameterValue`].
pub(crate) fn invalid(message: impl Into<String>) -> ModelError {
    ModelError::InvalidParameterValue(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ModelError::InvalidRangeParameter {
            position: RangePosition::Second,
            kind: ValueKind::Set,
        };
        assert_eq!(err.to_string(), "invalid second range parameter of kind Set");

        let err = ModelError::InvalidIndex { index: 4, size: 3 };
        assert_eq!(err.to_string(), "index 4 out of bounds for size 3");
    }

    #[test]
    fn test_from_random() {
        let err: ModelError = RandomError::InvalidParameterValue {
            name: "rate",
            value: -1.0,
        }
        .into();
        assert!(matches!(err, ModelError::InvalidParameterValue(ref m) if m.contains("rate")));
    }
}
