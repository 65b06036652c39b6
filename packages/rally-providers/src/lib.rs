pub mod telephony;
pub mod twiml;

mod error;

pub use error::{Error, Result};
pub use telephony::{CallRequest, PlacedCall, STATUS_EVENTS};
