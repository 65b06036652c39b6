pub mod phone;
pub mod progress;
pub mod status;

pub use progress::{Bucket, ProgressCounts};
pub use status::{CallStatus, ParseStatusError, Transition};
