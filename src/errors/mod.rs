//! Errors for the push worker and its collaborator clients
//!
//! Handlers never let an `AppError` escape their event; they fold it into a
//! `HandlerOutcome` (`Rejected` for unusable input, `Failed` for host or
//! store calls). Store and config code propagate with `?`, and the CLI turns
//! whatever reaches it into `anyhow::Error`.

pub mod types;
pub mod context;

pub use types::{AppError, AppResult};
pub use context::ErrorContextExt;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        AppError::Other {
            message: format!("{:#}", err),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_anyhow_chain_is_flattened() {
        let err = Err::<(), _>(anyhow::anyhow!("store offline"))
            .context("loading pending notifications")
            .unwrap_err();

        let app_err: AppError = err.into();
        assert_eq!(app_err.to_string(), "loading pending notifications: store offline");
        assert_eq!(app_err.category(), "internal");
    }
}
