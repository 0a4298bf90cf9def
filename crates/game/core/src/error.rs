//! Common error infrastructure for tactics-core.
//!
//! This module provides shared types and traits used across all error types in
//! the crate. Domain-specific errors (e.g. `SlotError`, `EffectError`) live in
//! their respective modules alongside the operations that raise them.
//!
//! # Error Taxonomy
//!
//! - **Configuration errors** ([`DefinitionError`]): malformed resources abort
//!   construction of that single definition. Loaders log and continue.
//! - **Script errors** ([`crate::script::ScriptError`]): contained inside
//!   [`crate::script::Scriptable`]; callers only ever see `None`.
//! - **Invariant warnings**: logged at construction time, never fatal.
//! - **Save/load reference errors**: logged, the entity or effect is skipped.

/// How a caller should treat an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The same request may succeed later, e.g. once a cooldown runs out.
    Recoverable,
    /// The request names something that does not exist or is malformed.
    Validation,
    /// World bookkeeping disagrees with itself, e.g. a slot whose owner is gone.
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// An engine bug rather than bad input.
    pub const fn is_bug(self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Classification shared by every error enum of the engine.
pub trait GameError: std::error::Error {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier, suitable for logs and UI lookups.
    fn error_code(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while building an immutable definition from a resource.
///
/// These abort construction of the one definition being parsed. The caller
/// wraps them with the resource id and decides whether to continue.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// A required field is absent or empty.
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A textual enum value does not match any known variant.
    #[error("unknown value `{value}` for `{field}`")]
    UnknownEnumValue { field: &'static str, value: String },

    /// A field is present but its value is out of the accepted range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The attached script could not be loaded or scanned.
    #[error("script `{location}` could not be loaded: {reason}")]
    Script { location: String, reason: String },
}

impl DefinitionError {
    pub fn unknown(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownEnumValue {
            field,
            value: value.into(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

impl GameError for DefinitionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "DEFINITION_MISSING_FIELD",
            Self::UnknownEnumValue { .. } => "DEFINITION_UNKNOWN_ENUM_VALUE",
            Self::InvalidValue { .. } => "DEFINITION_INVALID_VALUE",
            Self::Script { .. } => "DEFINITION_SCRIPT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_errors_are_validation_errors() {
        let err = DefinitionError::unknown("actionType", "Explode");
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "DEFINITION_UNKNOWN_ENUM_VALUE");
        assert_eq!(
            err.to_string(),
            "unknown value `Explode` for `actionType`"
        );
    }

    #[test]
    fn severity_classification() {
        assert!(ErrorSeverity::Recoverable.is_retryable());
        assert!(!ErrorSeverity::Validation.is_retryable());
        assert!(ErrorSeverity::Fatal.is_bug());
        assert_eq!(ErrorSeverity::Internal.label(), "internal");
    }
}
