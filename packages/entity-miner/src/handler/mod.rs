//! Request handling around the workflow: event shapes, upload guard, outcome.

pub mod event;
pub mod upload;

pub use event::{handle_event, DirectRequest, HandlerOutcome, MiningEvent, OutcomeStatus};
pub use upload::{content_hash, mark_mined, prepare_upload, should_mine};
