//! Tool-call metrics bucketed over time.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{MetaError, Result, ValidationError};
use crate::model::{ToolCall, STATUS_ERROR};
use crate::util::parse_timestamp;

/// Bucket width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interval {
    /// One hour.
    #[default]
    Hour,
    /// One calendar day (UTC).
    Day,
    /// One ISO week, Monday to Sunday (UTC).
    Week,
}

impl Interval {
    const VALID: &'static [&'static str] = &["hour", "day", "week"];

    /// Start of the bucket containing `t`.
    #[must_use]
    pub fn truncate(self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Hour => {
                let hour = NaiveTime::from_hms_opt(t.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
                t.date_naive().and_time(hour).and_utc()
            }
            Self::Day => t.date_naive().and_time(NaiveTime::MIN).and_utc(),
            Self::Week => {
                let back = Duration::days(i64::from(t.weekday().num_days_from_monday()));
                (t.date_naive() - back).and_time(NaiveTime::MIN).and_utc()
            }
        }
    }

    /// Length of one bucket.
    #[must_use]
    pub fn step(self) -> Duration {
        match self {
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
        }
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(ValidationError::new("interval", s, Self::VALID)),
        }
    }
}

/// Value computed for each bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Metric {
    /// Number of calls in the bucket.
    #[default]
    ToolCalls,
    /// Fraction of calls in the bucket with status `error`.
    ErrorRate,
}

impl Metric {
    const VALID: &'static [&'static str] = &["tool-calls", "error-rate"];
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tool-calls" => Ok(Self::ToolCalls),
            "error-rate" => Ok(Self::ErrorRate),
            _ => Err(ValidationError::new("metric", s, Self::VALID)),
        }
    }
}

/// One bucket of a time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Bucket start.
    pub timestamp: DateTime<Utc>,
    /// Metric value; 0 for empty buckets.
    pub value: f64,
}

#[derive(Default)]
struct Bucket {
    calls: usize,
    errors: usize,
}

impl Bucket {
    fn value(&self, metric: Metric) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        match metric {
            Metric::ToolCalls => self.calls as f64,
            Metric::ErrorRate => self.errors as f64 / self.calls as f64,
        }
    }
}

/// Bucket tool calls by `interval` from the first call to the last, empty
/// buckets included.
///
/// Fails on the first call whose timestamp is not RFC 3339.
#[instrument(skip(tool_calls), fields(tool_calls = tool_calls.len()))]
pub fn analyze_time_series(tool_calls: &[ToolCall], metric: Metric, interval: Interval) -> Result<Vec<TimeSeriesPoint>> {
    let mut buckets: HashMap<DateTime<Utc>, Bucket> = HashMap::new();
    let mut range: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

    for call in tool_calls {
        let t = parse_timestamp(&call.timestamp).ok_or_else(|| MetaError::InvalidTimestamp {
            value: call.timestamp.clone(),
        })?;
        let start = interval.truncate(t);
        let bucket = buckets.entry(start).or_default();
        bucket.calls += 1;
        if call.status == STATUS_ERROR {
            bucket.errors += 1;
        }
        range = Some(match range {
            Some((lo, hi)) => (lo.min(start), hi.max(start)),
            None => (start, start),
        });
    }

    let Some((first, last)) = range else {
        return Ok(Vec::new());
    };

    let empty = Bucket::default();
    let mut points = Vec::new();
    let mut current = first;
    while current <= last {
        points.push(TimeSeriesPoint {
            timestamp: current,
            value: buckets.get(&current).unwrap_or(&empty).value(metric),
        });
        current += interval.step();
    }

    debug!(points = points.len(), "Built time series");
    Ok(points)
}
