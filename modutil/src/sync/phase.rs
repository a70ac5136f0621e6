//! Controller phases.

use std::fmt;

/// Where the controller is in a fetch/install cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    FetchingBase,
    InstallingBase,
    FetchingUpdate,
    InstallingUpdate,
    /// The last action failed; the next action starts from `Idle` again.
    Failed(String),
}

impl SyncPhase {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::FetchingBase => f.write_str("downloading base pack"),
            Self::InstallingBase => f.write_str("installing base pack"),
            Self::FetchingUpdate => f.write_str("downloading update"),
            Self::InstallingUpdate => f.write_str("installing update"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
