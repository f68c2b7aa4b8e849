use std::fmt;

/// Where the observer reports the subject is looking
#[derive(Copy, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Region {
    #[default]
    Away,
    Left,
    Right,
}

impl Region {
    /// Log column order
    pub const ALL: [Region; 3] = [Region::Away, Region::Left, Region::Right];

    /// True for the two image regions
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Away => "away",
            Region::Left => "left",
            Region::Right => "right",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract input vocabulary shared by every front-end
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Focus(Region),
    Continue,
    Abort,
}
