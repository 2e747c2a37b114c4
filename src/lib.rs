//! Quick Clinic push worker
//!
//! Event-driven push-notification handling for the Quick Clinic booking
//! system, together with typed clients for the clinic's notification store
//! and the external OTP provider.

pub mod cli;
pub mod config;
pub mod errors;
pub mod otp;
pub mod shared;
pub mod store;
pub mod worker;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigManager};
pub use errors::{AppError, AppResult};
pub use worker::{EventRegistry, HandlerOutcome, WorkerContext, WorkerEvent, WorkerRuntime};
