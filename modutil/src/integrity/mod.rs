//! Integrity checks of installed content against the trust manifest.
//!
//! Every manifest target is fingerprinted and compared with its expected
//! digest. A target that cannot be fingerprinted fails; it never aborts the
//! check, so the report always covers every target.

mod checker;
mod error;
mod report;

pub use checker::{check, resolve_target};
pub use error::{IntegrityError, IntegrityResult};
pub use report::{IntegrityReport, TargetOutcome, TargetResult};
