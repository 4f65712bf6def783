//! Validation, request security, and notification services for the vehicle maintenance
//! platform. The `autocare-api` binary wires these into an HTTP server.

pub mod clock;
pub mod config;
pub mod error;
pub mod notifications;
pub mod response;
pub mod security;
pub mod telemetry;
pub mod validation;
