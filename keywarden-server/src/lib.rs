//! License verification service and HTTP API for KeyWarden.
//!
//! Wires the pure lockout policy (`keywarden-core`) to a revision-guarded
//! store (`keywarden-store`) and a best-effort alert sink
//! (`keywarden-notify`), and exposes the result over HTTP.

mod api;
mod service;

pub use api::{build_router, AppState};
pub use service::{
    VerificationService, VerifyError, VerifyResult, DEFAULT_MAX_COMMIT_ATTEMPTS,
};
