pub mod dwell;
pub mod error;
pub mod region;
pub mod rule;
pub mod trial;

pub use dwell::Dwell;
pub use error::ConfigError;
pub use region::{Command, Region};
pub use rule::{StoppingRule, Verdict};
pub use trial::{TrialConfig, format_duration, serialize_secs};
