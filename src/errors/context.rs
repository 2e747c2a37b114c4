//! Error context enhancement utilities
//!
//! Extension trait for attaching an operation or component description to any
//! error as it crosses a module boundary.

use super::types::AppError;

/// Extension trait for adding context to error types
///
/// Similar to anyhow's context functionality, but the result is always an
/// `AppError` so library code keeps a typed error.
pub trait ErrorContextExt<T> {
    /// Add operation context to the error
    fn with_context(self, operation: impl Into<String>) -> Result<T, AppError>;

    /// Add operation context with a closure (lazy evaluation)
    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;

    /// Add component context
    fn in_component(self, component: impl Into<String>) -> Result<T, AppError>;
}

impl<T, E> ErrorContextExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context(self, operation: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| {
            let operation = operation.into();
            AppError::Other {
                message: format!("{}: {}", operation, e),
                source: Some(Box::new(e)),
            }
        })
    }

    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let operation = f();
            AppError::Other {
                message: format!("{}: {}", operation, e),
                source: Some(Box::new(e)),
            }
        })
    }

    fn in_component(self, component: impl Into<String>) -> Result<T, AppError> {
        let component = component.into();
        self.map_err(|e| {
            AppError::Other {
                message: format!("in component '{}': {}", component, e),
                source: Some(Box::new(e)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_prefixes_message() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = result.with_context("reading payload").unwrap_err();
        assert_eq!(err.to_string(), "reading payload: boom");
    }

    #[test]
    fn test_in_component() {
        let result: Result<(), AppError> = Err(AppError::NotificationNotFound { id: "n-1".into() });
        let err = result.in_component("sync").unwrap_err();
        assert!(err.to_string().starts_with("in component 'sync'"));
    }

    #[test]
    fn test_lazy_context_not_evaluated_on_success() {
        let result: Result<u8, std::io::Error> = Ok(7);
        let value = result
            .with_context_lazy(|| panic!("closure must not run"))
            .unwrap();
        assert_eq!(value, 7);
    }
}
