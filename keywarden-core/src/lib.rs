//! License state model and anti-sharing lockout policy for KeyWarden.
//!
//! This crate holds the pure domain logic:
//! - The [`LicenseRecord`] aggregate and its invariants
//! - The [`BoundedLog`] ring buffer backing the per-record histories
//! - The [`evaluate`] decision function (allow / deny / escalate)
//!
//! # Design Principles
//!
//! - **No I/O**: everything here is a pure function of its inputs. Time is an
//!   explicit parameter, never read from the system clock.
//! - **Decision vs. mutation**: [`evaluate`] returns the decision together with
//!   the new record state (if any); committing that state durably is the
//!   caller's job.
//! - **One state machine per record**: a license record is only ever mutated
//!   through the evaluation path.

mod bounded_log;
mod policy;
mod record;

pub use bounded_log::BoundedLog;
pub use policy::{evaluate, Decision, Evaluation, GRACE_WINDOW_HOURS, MAX_LOCKOUT_DAYS};
pub use record::{ActivationBinding, LicenseRecord, HISTORY_CAPACITY};
