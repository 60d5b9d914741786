//! Session clock module
//!
//! Maps exchange-local wall-clock time to a coarse trading-session label
//! and to the (trading date, minute bucket) pair that keys price history.

mod clock;
mod types;

pub use clock::{bucket_for, SessionClock, SessionStamp};
pub use types::Session;
