//! Session bookkeeping and results

use std::fmt;

use crate::wishlist::{Wishlist, WishlistEntry};

/// Where the interaction currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Waiting for a wake
    #[default]
    Idle,
    /// Prompting for and listening to a name
    AwaitingName,
    /// Reading the wishlist to the administrator
    AdministratorReview,
    /// Prompting for and listening to an item
    AwaitingItem,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingName => "awaiting-name",
            Self::AdministratorReview => "administrator-review",
            Self::AwaitingItem => "awaiting-item",
        };
        f.write_str(name)
    }
}

/// Which recognition stage an outcome refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Speaker identification
    Name,
    /// Free-form item capture
    Item,
}

/// How a completed session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A recognizer failed; the apology was spoken
    EngineFailure {
        /// Stage that failed
        stage: Stage,
    },
    /// No trusted roster name was heard
    SpeakerNotRecognized,
    /// The administrator heard the list read back
    ListReviewed {
        /// Number of entries announced
        entries: usize,
    },
    /// A known speaker asked for something that was not understood
    ItemNotUnderstood {
        /// Who was asking
        requestor: String,
    },
    /// An item was appended to the wishlist
    ItemAdded(WishlistEntry),
}

/// Why a wake did not start a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// Recognizers have not been configured successfully
    NotReady,
    /// Another session is in flight
    Busy,
}

/// Result of `SessionController::on_wake`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    /// Wake was dropped without any state change
    Ignored(IgnoreReason),
    /// A full session ran
    Completed(SessionOutcome),
}

/// Everything a session mutates, guarded together by the controller
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) active: bool,
    pub(crate) phase: SessionPhase,
    pub(crate) requestor: Option<String>,
    pub(crate) wishlist: Wishlist,
}
