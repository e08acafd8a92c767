//! Speech capabilities used by the session controller
//!
//! The controller only sees the `Recognizer` and `Announcer` traits; the
//! cloud implementations here sit on top of `crate::voice`.

mod announcer;
mod constraints;
mod outcome;
mod recognizer;

pub use announcer::{Announcer, CloudAnnouncer, ConsoleAnnouncer};
pub use constraints::{SpeechConstraintSet, validate_roster};
pub use outcome::{Confidence, RecognitionOutcome};
pub use recognizer::{CloudRecognizer, Recognizer, Vocabulary};
