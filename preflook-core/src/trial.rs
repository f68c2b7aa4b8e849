use crate::error::ConfigError;
use crate::rule::StoppingRule;
use serde::Serializer;
use std::time::Duration;

/// Immutable definition of one trial
///
/// Only constructible through [`TrialConfig::new`], so a value of this type
/// always has a stopping rule that can terminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialConfig {
    name: String,
    prompt: String,
    rule: StoppingRule,
}

impl TrialConfig {
    pub fn new(
        name: impl Into<String>,
        prompt: impl Into<String>,
        rule: StoppingRule,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if !rule.terminates() {
            return Err(ConfigError::NeverEnds { trial: name });
        }
        Ok(Self {
            name,
            prompt: prompt.into(),
            rule,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn rule(&self) -> &StoppingRule {
        &self.rule
    }

    /// Trial name made safe for use as a file name stem
    pub fn file_stem(&self) -> String {
        self.name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect()
    }
}

/// `<seconds>.<microseconds>`, microseconds zero-padded to six digits
pub fn format_duration(d: Duration) -> String {
    format!("{}.{:06}", d.as_secs(), d.subsec_micros())
}

/// Serializes a duration as fractional seconds
pub fn serialize_secs<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}
