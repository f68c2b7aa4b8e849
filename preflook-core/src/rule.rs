use crate::dwell::Dwell;
use serde::Serialize;
use std::time::Duration;

/// Outcome of evaluating the stopping rule
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Running,
    Success,
    Failed,
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// When a trial ends and whether it counts
///
/// At least one of `total_image_time` or `post_first_look_window` has to be
/// set; `min_image_time` only qualifies the window rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoppingRule {
    pub total_image_time: Option<Duration>,
    pub post_first_look_window: Option<Duration>,
    pub min_image_time: Option<Duration>,
}

impl StoppingRule {
    pub fn image_time(total: Duration) -> Self {
        Self {
            total_image_time: Some(total),
            ..Self::default()
        }
    }

    pub fn window(window: Duration, min_image_time: Option<Duration>) -> Self {
        Self {
            post_first_look_window: Some(window),
            min_image_time,
            ..Self::default()
        }
    }

    /// Whether the rule can ever produce a terminal verdict
    pub fn terminates(&self) -> bool {
        self.total_image_time.is_some() || self.post_first_look_window.is_some()
    }

    /// Thresholds are strict: reaching a limit exactly does not end the trial.
    pub fn evaluate(&self, dwell: &Dwell, since_first_look: Option<Duration>) -> Verdict {
        let image_time = dwell.image_time();

        if let Some(total) = self.total_image_time {
            if image_time > total {
                return Verdict::Success;
            }
        }

        if let (Some(window), Some(looked)) = (self.post_first_look_window, since_first_look) {
            if looked > window {
                return match self.min_image_time {
                    Some(min) if image_time < min => Verdict::Failed,
                    _ => Verdict::Success,
                };
            }
        }

        Verdict::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dwell(left_ms: u64, right_ms: u64) -> Dwell {
        Dwell {
            away: Duration::ZERO,
            left: Duration::from_millis(left_ms),
            right: Duration::from_millis(right_ms),
        }
    }

    #[test]
    fn image_time_threshold_is_strict() {
        let rule = StoppingRule::image_time(Duration::from_secs(2));
        assert_eq!(rule.evaluate(&dwell(1000, 1000), None), Verdict::Running);
        assert_eq!(rule.evaluate(&dwell(1000, 1001), None), Verdict::Success);
    }

    #[test]
    fn window_needs_a_first_look() {
        let rule = StoppingRule::window(Duration::from_secs(1), None);
        assert_eq!(rule.evaluate(&dwell(0, 0), None), Verdict::Running);
        assert_eq!(
            rule.evaluate(&dwell(0, 0), Some(Duration::from_secs(1))),
            Verdict::Running
        );
        assert_eq!(
            rule.evaluate(&dwell(0, 0), Some(Duration::from_millis(1001))),
            Verdict::Success
        );
    }

    #[test]
    fn window_with_minimum_can_fail() {
        let rule = StoppingRule::window(Duration::from_secs(1), Some(Duration::from_millis(500)));
        let after = Some(Duration::from_millis(1001));
        assert_eq!(rule.evaluate(&dwell(300, 0), after), Verdict::Failed);
        assert_eq!(rule.evaluate(&dwell(300, 300), after), Verdict::Success);
        // exactly the minimum is not below it
        assert_eq!(rule.evaluate(&dwell(500, 0), after), Verdict::Success);
    }

    #[test]
    fn image_time_wins_over_window() {
        let rule = StoppingRule {
            total_image_time: Some(Duration::from_millis(400)),
            post_first_look_window: Some(Duration::from_secs(1)),
            min_image_time: Some(Duration::from_secs(5)),
        };
        let verdict = rule.evaluate(&dwell(450, 0), Some(Duration::from_secs(2)));
        assert_eq!(verdict, Verdict::Success);
    }

    #[test]
    fn minimum_alone_never_terminates() {
        let rule = StoppingRule {
            min_image_time: Some(Duration::from_secs(1)),
            ..StoppingRule::default()
        };
        assert!(!rule.terminates());
        assert!(StoppingRule::image_time(Duration::ZERO).terminates());
    }
}
