//! OTP provider client
//!
//! Phone verification is delegated to an external SMS provider. Both
//! operations always resolve to an `OtpResponse`; transport, status and
//! decode failures become `success: false` with a readable message.

pub mod client;

pub use client::{normalize_phone, validate_code, OtpClient, OtpResponse};
