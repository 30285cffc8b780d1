//! Moderator
//!
//! Follow-up detection for persona responses.

pub mod detector;

pub use detector::{detect, detect_intervention, follow_up_question, Intervention};
