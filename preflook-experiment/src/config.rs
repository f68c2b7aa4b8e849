use log::{debug, info};
use preflook_core::{ConfigError, StoppingRule, TrialConfig};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_PROMPT: &str = "\
A child will be presented with two images

Press the LEFT ARROW KEY when the child looks at the LEFT IMAGE

Press the RIGHT ARROW KEY when the child looks at the RIGHT IMAGE

Press the UP ARROW KEY when the child looks AWAY from both images.";

/// Trial list used when no trial file is given
pub fn default_trials() -> Result<Vec<TrialConfig>, ConfigError> {
    let trials = vec![TrialConfig::new(
        "Trial 1",
        DEFAULT_PROMPT,
        StoppingRule::image_time(Duration::from_secs(2)),
    )?];
    validate_trials(&trials)?;
    Ok(trials)
}

/// Checks the list as a whole; each `TrialConfig` is already valid on its own.
pub fn validate_trials(trials: &[TrialConfig]) -> Result<(), ConfigError> {
    if trials.is_empty() {
        return Err(ConfigError::NoTrials);
    }
    let mut seen = HashSet::new();
    for trial in trials {
        if !seen.insert(trial.file_stem()) {
            return Err(ConfigError::DuplicateName {
                trial: trial.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Loads and validates every trial in a `.toml` or `.json` file.
pub fn load_trials(path: &Path) -> Result<Vec<TrialConfig>, ConfigError> {
    info!("Loading trials from: {:?}", path);
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let file: TrialFile = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&text).map_err(|e| parse_error(Box::new(e)))?,
        Some("json") => serde_json::from_str(&text).map_err(|e| parse_error(Box::new(e)))?,
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let trials = file
        .trials
        .into_iter()
        .map(TrialSpec::into_config)
        .collect::<Result<Vec<_>, _>>()?;
    validate_trials(&trials)?;
    debug!("{} trials loaded", trials.len());
    Ok(trials)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrialFile {
    #[serde(default, rename = "trial")]
    trials: Vec<TrialSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrialSpec {
    name: String,
    #[serde(default)]
    prompt: String,
    #[serde(default, deserialize_with = "human_duration")]
    total_image_time: Option<Duration>,
    #[serde(default, deserialize_with = "human_duration")]
    post_first_look_window: Option<Duration>,
    #[serde(default, deserialize_with = "human_duration")]
    min_image_time: Option<Duration>,
}

impl TrialSpec {
    fn into_config(self) -> Result<TrialConfig, ConfigError> {
        let rule = StoppingRule {
            total_image_time: self.total_image_time,
            post_first_look_window: self.post_first_look_window,
            min_image_time: self.min_image_time,
        };
        TrialConfig::new(self.name, self.prompt, rule)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Text(String),
    Seconds(f64),
}

/// Accepts `"2s"`, `"1500ms"` or a number of seconds.
fn human_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<RawDuration>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawDuration::Text(s)) => humantime::parse_duration(&s)
            .map(Some)
            .map_err(D::Error::custom),
        Some(RawDuration::Seconds(secs)) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(D::Error::custom),
    }
}
