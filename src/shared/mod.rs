//! Shared modules used by both the worker and its collaborator clients
//!
//! Configuration types and retry policy live here so the store and OTP
//! clients do not depend on each other.

pub mod config;
pub mod retry;
