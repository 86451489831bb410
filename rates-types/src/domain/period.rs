//! Look-back windows for history queries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::DomainError;

/// A bounded window ending "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPeriod {
    FifteenMinutes,
    Hour,
    Day,
    Week,
    Month,
}

impl HistoryPeriod {
    pub fn duration(&self) -> Duration {
        match self {
            HistoryPeriod::FifteenMinutes => Duration::minutes(15),
            HistoryPeriod::Hour => Duration::hours(1),
            HistoryPeriod::Day => Duration::days(1),
            HistoryPeriod::Week => Duration::weeks(1),
            HistoryPeriod::Month => Duration::days(30),
        }
    }

    /// Start of the window relative to `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::FifteenMinutes => "15m",
            HistoryPeriod::Hour => "1h",
            HistoryPeriod::Day => "1d",
            HistoryPeriod::Week => "1w",
            HistoryPeriod::Month => "1mo",
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HistoryPeriod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "15m" | "15min" => Ok(HistoryPeriod::FifteenMinutes),
            "1h" | "hour" => Ok(HistoryPeriod::Hour),
            "1d" | "day" => Ok(HistoryPeriod::Day),
            "1w" | "week" => Ok(HistoryPeriod::Week),
            "1mo" | "month" => Ok(HistoryPeriod::Month),
            _ => Err(DomainError::InvalidPeriod(s.to_string())),
        }
    }
}
