use reporting::content_type::is_security_batch;
use reporting::types::SecurityReport;
use reporting::{LogWarnings, ParseError, ProductTokenDetector, Rejection, ServiceTag};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct ParseArgs {
    /// Content-Type the report was sent with. When omitted, the file is read
    /// as a security report batch if it looks like one, otherwise as a web
    /// vitals sample.
    #[arg(long)]
    pub content_type: Option<String>,

    /// Service tag to annotate the records with
    #[arg(long, default_value = "reportd")]
    pub service: String,

    pub file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum ParseCommandError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("could not encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct SecurityOutput<'a> {
    service: &'a ServiceTag,
    accepted: Vec<SecurityReport>,
    rejected: Vec<Rejection>,
}

/// Parses the file named by `args` and renders the result as pretty JSON.
pub fn run(args: &ParseArgs) -> Result<String, ParseCommandError> {
    let body = fs::read(&args.file).map_err(|source| ParseCommandError::Read {
        path: args.file.clone(),
        source,
    })?;

    let output = parse_body(args.content_type.as_deref(), &body, &args.service)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

fn parse_body(
    content_type: Option<&str>,
    body: &[u8],
    service: &str,
) -> Result<Value, ParseCommandError> {
    let mut warnings = LogWarnings::default();

    let output = match content_type {
        Some(content_type) => {
            let records = reporting::parse(content_type, body, service, &mut warnings)?;
            serde_json::to_value(records)?
        }
        None => {
            let value: Value = serde_json::from_slice(body).map_err(ParseError::from)?;
            if is_security_batch(&value) {
                let service = ServiceTag::parse(service)?;
                let batch =
                    reporting::parse_security_reports(body, &ProductTokenDetector, &mut warnings)?;
                serde_json::to_value(SecurityOutput {
                    service: &service,
                    accepted: batch.accepted,
                    rejected: batch.rejected,
                })?
            } else {
                let record = reporting::parse_analytics(body, service, &mut warnings)?;
                serde_json::to_value(vec![record])?
            }
        }
    };

    if warnings.count > 0 {
        tracing::info!(warnings = warnings.count, "fields defaulted while parsing");
    }
    Ok(output)
}
