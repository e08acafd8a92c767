//! Wishlist Kiosk - a button-triggered voice kiosk
//!
//! A button press wakes the kiosk, which asks for the speaker's name, then
//! either reads the wishlist back (administrator) or records a spoken item
//! for that speaker. Every step is confirmed out loud.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Wake sources                       │
//! │        GPIO button  │  Keyboard  │  WakeHandle       │
//! └────────────────────┬────────────────────────────────┘
//!                      │ on_wake()
//! ┌────────────────────▼────────────────────────────────┐
//! │               SessionController                      │
//! │   Idle → AwaitingName → Review | AwaitingItem → Idle │
//! └──────┬──────────────────┬───────────────────┬───────┘
//!        │                  │                   │
//! ┌──────▼──────┐   ┌───────▼───────┐   ┌───────▼───────┐
//! │ Recognizers │   │   Announcer   │   │   Wishlist    │
//! │ (mic + STT) │   │ (TTS + audio) │   │  (in memory)  │
//! └─────────────┘   └───────────────┘   └───────────────┘
//! ```

pub mod config;
pub mod error;
pub mod kiosk;
pub mod session;
pub mod speech;
pub mod voice;
pub mod wake;
pub mod wishlist;

pub use config::Config;
pub use error::{Error, Result};
pub use kiosk::Kiosk;
pub use session::{
    IgnoreReason, SessionController, SessionOutcome, SessionPhase, Stage, Timing, WakeOutcome,
};
pub use speech::{Announcer, Confidence, RecognitionOutcome, Recognizer, SpeechConstraintSet};
pub use wake::{WakeEvent, WakeOrigin, WakeSource};
pub use wishlist::{Wishlist, WishlistEntry};
