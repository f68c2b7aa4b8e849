pub mod clock;

pub use clock::{Clock, HighPrecisionClock, ManualClock};
