use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Window of history a query covers, as accepted by the `time_range` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl TimeRange {
    /// Every range the API accepts, shortest first.
    pub const ALL: [TimeRange; 3] = [
        TimeRange::FifteenMinutes,
        TimeRange::OneHour,
        TimeRange::TwentyFourHours,
    ];

    /// The subset offered by the per-view selectors (Services, Dependency Map).
    pub const SELECTOR: [TimeRange; 2] = [TimeRange::OneHour, TimeRange::TwentyFourHours];

    /// Value sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::FifteenMinutes => "15m",
            TimeRange::OneHour => "1h",
            TimeRange::TwentyFourHours => "24h",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::FifteenMinutes => "15 minutes",
            TimeRange::OneHour => "1 hour",
            TimeRange::TwentyFourHours => "24 hours",
        }
    }

    /// Cycle to the next range among `options`.
    ///
    /// A range that is not part of `options` jumps to the first option.
    pub fn next_in(self, options: &[TimeRange]) -> Self {
        let next = match options.iter().position(|r| *r == self) {
            Some(i) => options.get((i + 1) % options.len()),
            None => options.first(),
        };
        next.copied().unwrap_or(self)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "15m" => Ok(TimeRange::FifteenMinutes),
            "1h" => Ok(TimeRange::OneHour),
            "24h" => Ok(TimeRange::TwentyFourHours),
            other => Err(format!("unknown time range '{}' (expected 15m, 1h or 24h)", other)),
        }
    }
}
