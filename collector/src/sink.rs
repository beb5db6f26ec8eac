use crate::config::SinkConfig;
use async_trait::async_trait;
use chrono::NaiveDate;
use reporting::types::Report;
use reporting::{NormalizedRecord, ReportSink, ServiceTag, SinkError, SummaryRow, TimeWindow};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

pub fn build_sink(config: &SinkConfig) -> Arc<dyn ReportSink> {
    match config {
        SinkConfig::Memory { max_records } => Arc::new(MemorySink::new(*max_records)),
        SinkConfig::Log => Arc::new(LogSink),
    }
}

/// Keeps the most recent records in memory.
///
/// Security reports with the same checksum and service are collapsed into a
/// single record whose `report_count` is the number of times it was seen.
pub struct MemorySink {
    max_records: usize,
    records: RwLock<VecDeque<NormalizedRecord>>,
}

impl MemorySink {
    pub fn new(max_records: usize) -> Self {
        MemorySink {
            max_records,
            records: RwLock::new(VecDeque::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

fn find_duplicate<'a>(
    records: &'a mut VecDeque<NormalizedRecord>,
    record: &NormalizedRecord,
) -> Option<&'a mut reporting::SecurityReport> {
    let Report::Security(incoming) = &record.report else {
        return None;
    };

    records
        .iter_mut()
        .rev()
        .filter(|existing| existing.service == record.service)
        .find_map(|existing| match &mut existing.report {
            Report::Security(stored) if stored.report_checksum == incoming.report_checksum => {
                Some(stored)
            }
            _ => None,
        })
}

#[async_trait]
impl ReportSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, records: Vec<NormalizedRecord>) -> Result<(), SinkError> {
        let mut stored = self.records.write().await;

        for record in records {
            if let Some(existing) = find_duplicate(&mut stored, &record) {
                if let Report::Security(incoming) = &record.report {
                    existing.report_count += incoming.report_count;
                }
                continue;
            }

            stored.push_back(record);
            while stored.len() > self.max_records {
                stored.pop_front();
            }
        }

        Ok(())
    }

    async fn query(
        &self,
        service: &ServiceTag,
        window: TimeWindow,
    ) -> Result<Vec<SummaryRow>, SinkError> {
        #[derive(Default)]
        struct Group {
            count: u64,
            vital_count: u64,
            vital_sum: f64,
        }

        let stored = self.records.read().await;
        let mut groups: BTreeMap<(NaiveDate, String), Group> = BTreeMap::new();

        for record in stored
            .iter()
            .filter(|r| &r.service == service && window.contains(r.ingested_at))
        {
            let key = (record.ingested_at.date_naive(), record.report.kind().to_string());
            let group = groups.entry(key).or_default();

            match &record.report {
                Report::Security(report) => {
                    group.count += u64::try_from(report.report_count).unwrap_or(1)
                }
                Report::WebVital(vital) => {
                    group.count += 1;
                    group.vital_count += 1;
                    group.vital_sum += vital.value;
                }
                _ => group.count += 1,
            }
        }

        Ok(groups
            .into_iter()
            .map(|((day, kind), group)| SummaryRow {
                day,
                kind,
                count: group.count,
                average: (group.vital_count > 0)
                    .then(|| group.vital_sum / group.vital_count as f64),
            })
            .collect())
    }

    async fn services(&self) -> Result<Vec<ServiceTag>, SinkError> {
        let stored = self.records.read().await;
        let services: BTreeSet<&ServiceTag> = stored.iter().map(|r| &r.service).collect();
        Ok(services.into_iter().cloned().collect())
    }
}

/// Logs every record and keeps nothing.
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn insert(&self, records: Vec<NormalizedRecord>) -> Result<(), SinkError> {
        for record in &records {
            let report = serde_json::to_string(&record.report)
                .map_err(|e| SinkError::Rejected(e.to_string()))?;
            tracing::info!(
                service = %record.service,
                kind = record.report.kind(),
                ingested_at = %record.ingested_at,
                report = %report,
                "report received"
            );
        }
        Ok(())
    }

    async fn query(
        &self,
        _service: &ServiceTag,
        _window: TimeWindow,
    ) -> Result<Vec<SummaryRow>, SinkError> {
        Ok(Vec::new())
    }

    async fn services(&self) -> Result<Vec<ServiceTag>, SinkError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use reporting::types::{CspViolation, Disposition, ReportExtension, SecurityReport, WebVital};

    fn tag(s: &str) -> ServiceTag {
        ServiceTag::parse(s).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn record(report: Report, service: &str, ingested_at: DateTime<Utc>) -> NormalizedRecord {
        NormalizedRecord {
            report,
            ingested_at,
            service: tag(service),
        }
    }

    fn vital(name: &str, value: f64) -> Report {
        Report::WebVital(WebVital {
            name: name.into(),
            value,
            ..WebVital::default()
        })
    }

    fn security(checksum: &str) -> Report {
        let mut report = SecurityReport::new(
            checksum.into(),
            ReportExtension::CspReport(CspViolation::default()),
        );
        report.disposition = Disposition::Enforced;
        Report::Security(report)
    }

    // 2023-11-14T22:13:20Z
    const NOW: i64 = 1_700_000_000;

    #[tokio::test]
    async fn test_eviction() {
        let sink = MemorySink::new(2);
        let records = (0..3)
            .map(|i| record(vital("LCP", f64::from(i)), "a", at(NOW + i64::from(i))))
            .collect();
        sink.insert(records).await.unwrap();

        assert_eq!(sink.len().await, 2);
        let stored = sink.records.read().await;
        assert_eq!(stored[0].ingested_at, at(NOW + 1));
    }

    #[tokio::test]
    async fn test_security_reports_collapse_by_checksum() {
        let sink = MemorySink::new(10);
        sink.insert(vec![
            record(security("abc"), "a", at(NOW)),
            record(security("abc"), "a", at(NOW)),
            record(security("abc"), "b", at(NOW)),
            record(security("def"), "a", at(NOW)),
        ])
        .await
        .unwrap();
        sink.insert(vec![record(security("abc"), "a", at(NOW))])
            .await
            .unwrap();

        assert_eq!(sink.len().await, 3);
        let stored = sink.records.read().await;
        match &stored[0].report {
            Report::Security(report) => assert_eq!(report.report_count, 3),
            other => panic!("unexpected report {other:?}"),
        }

        drop(stored);
        let rows = sink
            .query(&tag("a"), TimeWindow::last_days(at(NOW), 1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "security");
        assert_eq!(rows[0].count, 4);
        assert_eq!(rows[0].average, None);
    }

    #[tokio::test]
    async fn test_query_groups_by_day_and_kind() {
        let sink = MemorySink::new(100);
        let now = at(NOW);
        let yesterday = now - Duration::days(1);
        sink.insert(vec![
            record(vital("LCP", 1000.0), "a", now),
            record(vital("LCP", 3000.0), "a", now),
            record(vital("CLS", 0.1), "a", yesterday),
            record(Report::Csp(CspViolation::default()), "a", now),
            record(vital("LCP", 5.0), "b", now),
            record(vital("LCP", 5.0), "a", now - Duration::days(30)),
        ])
        .await
        .unwrap();

        let rows = sink
            .query(&tag("a"), TimeWindow::last_days(now, 7))
            .await
            .unwrap();

        let summary: Vec<_> = rows
            .iter()
            .map(|r| (r.day.to_string(), r.kind.as_str(), r.count, r.average))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("2023-11-13".to_string(), "CLS", 1, Some(0.1)),
                ("2023-11-14".to_string(), "LCP", 2, Some(2000.0)),
                ("2023-11-14".to_string(), "csp", 1, None),
            ]
        );
    }

    #[tokio::test]
    async fn test_services_sorted_and_distinct() {
        let sink = MemorySink::new(100);
        sink.insert(vec![
            record(vital("LCP", 1.0), "zeta", at(NOW)),
            record(vital("LCP", 1.0), "alpha", at(NOW)),
            record(security("x"), "zeta", at(NOW)),
        ])
        .await
        .unwrap();

        assert_eq!(
            sink.services().await.unwrap(),
            vec![tag("alpha"), tag("zeta")]
        );
    }

    #[tokio::test]
    async fn test_log_sink() {
        let sink = build_sink(&SinkConfig::Log);
        assert_eq!(sink.name(), "log");
        sink.insert(vec![record(vital("LCP", 1.0), "a", at(NOW))])
            .await
            .unwrap();
        assert!(sink.services().await.unwrap().is_empty());
    }
}
