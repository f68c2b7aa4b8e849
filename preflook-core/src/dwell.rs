use crate::region::Region;
use crate::trial::serialize_secs;
use serde::Serialize;
use std::ops::{Index, IndexMut};
use std::time::Duration;

/// Cumulative time spent in each region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dwell {
    #[serde(serialize_with = "serialize_secs")]
    pub away: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub left: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub right: Duration,
}

impl Dwell {
    /// Combined left + right dwell
    pub fn image_time(&self) -> Duration {
        self.left + self.right
    }

    pub fn total(&self) -> Duration {
        self.away + self.left + self.right
    }
}

impl Index<Region> for Dwell {
    type Output = Duration;

    fn index(&self, region: Region) -> &Duration {
        match region {
            Region::Away => &self.away,
            Region::Left => &self.left,
            Region::Right => &self.right,
        }
    }
}

impl IndexMut<Region> for Dwell {
    fn index_mut(&mut self, region: Region) -> &mut Duration {
        match region {
            Region::Away => &mut self.away,
            Region::Left => &mut self.left,
            Region::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_time_excludes_away() {
        let mut dwell = Dwell::default();
        dwell[Region::Away] += Duration::from_millis(700);
        dwell[Region::Left] += Duration::from_millis(200);
        dwell[Region::Right] += Duration::from_millis(300);

        assert_eq!(dwell.image_time(), Duration::from_millis(500));
        assert_eq!(dwell.total(), Duration::from_millis(1200));
        assert_eq!(
            Region::ALL.map(|r| dwell[r]),
            [700, 200, 300].map(Duration::from_millis)
        );
    }

    #[test]
    fn serializes_as_seconds() {
        let dwell = Dwell {
            away: Duration::from_millis(250),
            left: Duration::from_millis(2050),
            right: Duration::ZERO,
        };
        assert_eq!(
            serde_json::to_value(dwell).unwrap(),
            serde_json::json!({"away": 0.25, "left": 2.05, "right": 0.0})
        );
    }
}
