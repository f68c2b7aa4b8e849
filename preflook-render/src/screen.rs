use preflook_core::{Region, TrialConfig, format_duration};
use preflook_experiment::Snapshot;

/// What a front-end should currently show
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Idle,
    Prompt { name: String, prompt: String },
    Status { trial: String, snapshot: Snapshot },
}

#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Body,
    Hint,
}

/// One line of text placed relative to the vertical centre
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub offset: i32,
    pub style: LineStyle,
    pub text: String,
}

impl Line {
    fn new(offset: i32, style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            offset,
            style,
            text: text.into(),
        }
    }
}

pub const CONTINUE_HINT: &str = "(press SPACE to continue)";

impl Screen {
    pub fn prompt(trial: &TrialConfig) -> Self {
        Screen::Prompt {
            name: trial.name().to_string(),
            prompt: trial.prompt().to_string(),
        }
    }

    pub fn status(trial: &TrialConfig, snapshot: &Snapshot) -> Self {
        Screen::Status {
            trial: trial.name().to_string(),
            snapshot: *snapshot,
        }
    }

    /// Text layout shared by the terminal and window front-ends
    pub fn lines(&self) -> Vec<Line> {
        match self {
            Screen::Idle => Vec::new(),
            Screen::Prompt { name, prompt } => {
                let mut lines = vec![
                    Line::new(-3, LineStyle::Title, name.as_str()),
                    Line::new(-2, LineStyle::Title, "=".repeat(name.chars().count())),
                    Line::new(0, LineStyle::Hint, CONTINUE_HINT),
                ];
                lines.extend(
                    prompt
                        .lines()
                        .enumerate()
                        .map(|(i, text)| Line::new(2 + i as i32, LineStyle::Body, text)),
                );
                lines
            }
            Screen::Status { trial, snapshot } => {
                let mut lines = vec![
                    Line::new(-2, LineStyle::Title, trial.as_str()),
                    Line::new(0, LineStyle::Body, format!("Current focus: {}", snapshot.focus)),
                ];
                lines.extend(Region::ALL.iter().enumerate().map(|(i, region)| {
                    Line::new(
                        1 + i as i32,
                        LineStyle::Body,
                        format!(
                            "Time spent {}: {} seconds",
                            region,
                            format_duration(snapshot.dwell[*region])
                        ),
                    )
                }));
                lines
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflook_core::{Dwell, StoppingRule, Verdict};
    use std::time::Duration;

    #[test]
    fn prompt_layout() {
        let trial = TrialConfig::new(
            "Trial 1",
            "first line\nsecond line",
            StoppingRule::image_time(Duration::from_secs(2)),
        )
        .unwrap();
        let lines = Screen::prompt(&trial).lines();
        let texts: Vec<(i32, &str)> = lines.iter().map(|l| (l.offset, l.text.as_str())).collect();
        assert_eq!(
            texts,
            [
                (-3, "Trial 1"),
                (-2, "======="),
                (0, CONTINUE_HINT),
                (2, "first line"),
                (3, "second line"),
            ]
        );
    }

    #[test]
    fn status_layout() {
        let rule = StoppingRule::image_time(Duration::from_secs(2));
        let trial = TrialConfig::new("t", "", rule).unwrap();
        let snapshot = Snapshot {
            focus: Region::Left,
            dwell: Dwell {
                away: Duration::from_millis(250),
                left: Duration::from_millis(1500),
                right: Duration::ZERO,
            },
            elapsed: Duration::from_millis(1750),
            verdict: Verdict::Running,
        };
        let lines = Screen::status(&trial, &snapshot).lines();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "t",
                "Current focus: left",
                "Time spent away: 0.250000 seconds",
                "Time spent left: 1.500000 seconds",
                "Time spent right: 0.000000 seconds",
            ]
        );
        assert!(Screen::Idle.lines().is_empty());
    }
}
