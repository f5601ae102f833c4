//! Tagged result of an accessor call

use crate::accessor::error::AccessorError;

/// Result of a capability call. A degraded call still carries a value
/// (usually the empty shape) alongside the reason it could not do better.
#[derive(Debug)]
pub enum Outcome<T> {
    Complete(T),
    Degraded { value: T, reason: AccessorError },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: AccessorError) -> Self {
        Self::Degraded { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Complete(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Complete(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&AccessorError> {
        match self {
            Self::Complete(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Complete(value) => Outcome::Complete(f(value)),
            Self::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }

    /// Chains a further step. The earliest degradation reason wins.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Complete(value) => f(value),
            Self::Degraded { value, reason } => Outcome::Degraded {
                value: f(value).into_value(),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn not_found() -> AccessorError {
        AccessorError::ExecutableNotFound(Some(PathBuf::from("/nope")))
    }

    #[test]
    fn and_then_keeps_first_reason() {
        let outcome = Outcome::degraded("[]".to_string(), not_found()).and_then(|raw| {
            let parsed: Outcome<Vec<u32>> = Outcome::degraded(
                Vec::new(),
                AccessorError::MalformedOutput {
                    capability: "test",
                    source: serde_json::from_str::<Vec<u32>>(&raw[..1]).unwrap_err(),
                },
            );
            parsed
        });

        assert!(matches!(
            outcome.reason(),
            Some(AccessorError::ExecutableNotFound(_))
        ));
        assert!(outcome.into_value().is_empty());
    }

    #[test]
    fn and_then_propagates_later_degradation() {
        let outcome = Outcome::Complete("x".to_string()).and_then(|_| {
            Outcome::<Vec<u32>>::degraded(Vec::new(), not_found())
        });

        assert!(outcome.is_degraded());
    }

    #[test]
    fn map_preserves_tag() {
        let complete = Outcome::Complete(2).map(|n| n * 2);
        assert!(!complete.is_degraded());
        assert_eq!(*complete.value(), 4);

        let degraded = Outcome::degraded(2, not_found()).map(|n| n * 2);
        assert!(degraded.is_degraded());
        assert_eq!(degraded.into_value(), 4);
    }
}
