use crate::errors::{ParseError, Result};
use crate::types::{Disposition, Report, SecurityReport};

/// Enforces the required fields of a decoded report.
///
/// Only security reports have required fields. Everything decoded through the
/// tolerant path is accepted once its outer shape decoded.
pub fn validate(report: &Report) -> Result<()> {
    match report {
        Report::Security(security) => validate_security_report(security),
        Report::Csp(_) | Report::ExpectCt(_) | Report::ReportingApi(_) | Report::WebVital(_) => {
            Ok(())
        }
    }
}

pub fn validate_security_report(report: &SecurityReport) -> Result<()> {
    if report.report_checksum.is_empty() {
        return Err(ParseError::MissingRequiredField("report_checksum"));
    }

    if !report.report_time.is_some_and(|t| t > 0) {
        return Err(ParseError::MissingRequiredField("report_time"));
    }

    if report.report_count < 1 {
        return Err(ParseError::MissingRequiredField("report_count"));
    }

    if report.user_agent.is_empty() {
        return Err(ParseError::MissingRequiredField("user_agent"));
    }

    if report.browser_name.is_empty() {
        return Err(ParseError::MissingRequiredField("browser_name"));
    }

    if report.browser_major_version == 0 {
        return Err(ParseError::MissingRequiredField("browser_major_version"));
    }

    if report.disposition == Disposition::Unknown {
        return Err(ParseError::MissingRequiredField("disposition"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CspViolation, ReportExtension, WebVital};

    fn valid() -> SecurityReport {
        let mut report = SecurityReport::new(
            "ab".repeat(32),
            ReportExtension::CspReport(CspViolation::default()),
        );
        report.report_time = Some(1_700_000_000_000);
        report.user_agent = "Mozilla/5.0 Chrome/120.0.0.0".into();
        report.browser_name = "Chrome".into();
        report.browser_major_version = 120;
        report.disposition = Disposition::Enforced;
        report
    }

    #[test]
    fn test_valid_report() {
        assert_eq!(validate_security_report(&valid()), Ok(()));
        assert_eq!(validate(&Report::Security(valid())), Ok(()));
    }

    #[test]
    fn test_each_required_field() {
        let cases: Vec<(&str, fn(&mut SecurityReport))> = vec![
            ("report_checksum", |r| r.report_checksum.clear()),
            ("report_time", |r| r.report_time = None),
            ("report_time", |r| r.report_time = Some(0)),
            ("report_count", |r| r.report_count = 0),
            ("user_agent", |r| r.user_agent.clear()),
            ("browser_name", |r| r.browser_name.clear()),
            ("browser_major_version", |r| r.browser_major_version = 0),
            ("disposition", |r| r.disposition = Disposition::Unknown),
        ];

        for (field, break_it) in cases {
            let mut report = valid();
            break_it(&mut report);
            assert_eq!(
                validate_security_report(&report),
                Err(ParseError::MissingRequiredField(field))
            );
        }
    }

    #[test]
    fn test_tolerant_reports_pass() {
        assert_eq!(validate(&Report::Csp(CspViolation::default())), Ok(()));
        assert_eq!(validate(&Report::WebVital(WebVital::default())), Ok(()));
    }
}
