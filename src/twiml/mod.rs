//! TwiML generation
//!
//! Builds the voice response returned to the IVR for each decision.

pub mod emitter;
pub mod response;

pub use emitter::{ResponseEmitter, ResponseSettings};
pub use response::{Verb, VoiceResponse, EMPTY_RESPONSE};
