use crate::service_tag::ServiceTag;
use crate::types::{NormalizedRecord, Report};
use chrono::{DateTime, Utc};

/// Wraps a validated report with its ingestion time and service tag.
pub fn annotate(report: Report, service: &ServiceTag, ingested_at: DateTime<Utc>) -> NormalizedRecord {
    NormalizedRecord {
        report,
        ingested_at,
        service: service.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WebVital;

    #[test]
    fn test_annotate() {
        let service = ServiceTag::parse("reportd").unwrap();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let record = annotate(Report::WebVital(WebVital::default()), &service, at);

        assert_eq!(record.service, service);
        assert_eq!(record.ingested_at, at);
        assert_eq!(record.report, Report::WebVital(WebVital::default()));
    }
}
