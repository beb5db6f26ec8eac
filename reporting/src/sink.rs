//! Contract of the storage backend that receives normalized records.
//!
//! The warehouse client itself lives outside this crate; the collector ships
//! an in-memory and a log-only implementation.

use crate::service_tag::ServiceTag;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::NormalizedRecord;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
    #[error("sink rejected records: {0}")]
    Rejected(String),
}

/// Half-open interval `[start, end)` of ingestion times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The `days` days up to and including `now`. Starts at the earliest
    /// representable time if `days` reaches past it.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        TimeWindow {
            start,
            end: now + Duration::milliseconds(1),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// One row of a per-service summary: records of one kind ingested on one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub day: NaiveDate,
    /// Report family (`csp`, `expect-ct`, ...) or web vital name
    pub kind: String,
    pub count: u64,
    /// Mean metric value, for web vitals only
    pub average: Option<f64>,
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn insert(&self, records: Vec<NormalizedRecord>) -> Result<(), SinkError>;

    async fn query(
        &self,
        service: &ServiceTag,
        window: TimeWindow,
    ) -> Result<Vec<SummaryRow>, SinkError>;

    /// Distinct service tags with at least one record, sorted.
    async fn services(&self) -> Result<Vec<ServiceTag>, SinkError>;
}
