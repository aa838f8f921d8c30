use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown video state {0:?} (expected off, on or on-mirrored)")]
pub struct UnknownVideoState(pub String);

/// Whether the feed is consuming frames, and how the host shows them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoState {
    #[default]
    Off,
    On,
    OnMirrored,
}

impl VideoState {
    pub const ALL: &[VideoState] = &[VideoState::Off, VideoState::On, VideoState::OnMirrored];

    pub fn from_mirror(mirrored: bool) -> Self {
        if mirrored {
            VideoState::OnMirrored
        } else {
            VideoState::On
        }
    }

    pub fn is_on(self) -> bool {
        self != VideoState::Off
    }

    pub fn is_mirrored(self) -> bool {
        self == VideoState::OnMirrored
    }

    /// Block menu value.
    pub fn as_str(self) -> &'static str {
        match self {
            VideoState::Off => "off",
            VideoState::On => "on",
            VideoState::OnMirrored => "on-mirrored",
        }
    }
}

impl fmt::Display for VideoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoState {
    type Err = UnknownVideoState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "off" => Ok(VideoState::Off),
            "on" => Ok(VideoState::On),
            "on-mirrored" => Ok(VideoState::OnMirrored),
            other => Err(UnknownVideoState(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("off", VideoState::Off)]
    #[case("on", VideoState::On)]
    #[case("on-mirrored", VideoState::OnMirrored)]
    #[case(" on ", VideoState::On)]
    fn test_parse(#[case] arg: &str, #[case] expected: VideoState) {
        assert_eq!(arg.parse::<VideoState>(), Ok(expected));
    }

    #[rstest]
    #[case("sideways")]
    #[case("on-flipped")]
    #[case("ON")]
    fn test_parse_unknown(#[case] arg: &str) {
        assert_eq!(
            arg.parse::<VideoState>(),
            Err(UnknownVideoState(arg.to_string()))
        );
    }

    #[test]
    fn test_display_parses_back() {
        for state in VideoState::ALL {
            assert_eq!(state.to_string().parse::<VideoState>(), Ok(*state));
        }
    }

    #[test]
    fn test_flags() {
        assert!(!VideoState::Off.is_on());
        assert!(VideoState::On.is_on() && !VideoState::On.is_mirrored());
        assert!(VideoState::OnMirrored.is_mirrored());
        assert_eq!(VideoState::from_mirror(true), VideoState::OnMirrored);
        assert_eq!(VideoState::default(), VideoState::Off);
    }
}
