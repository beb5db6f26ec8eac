use crate::errors::CollectorError;
use crate::metrics_defs::{
    ANALYTICS_RECEIVED, REPORTS_FIELD_WARNINGS, REPORTS_RECEIVED, REPORTS_REJECTED,
    SECURITY_REPORTS_ACCEPTED, SECURITY_REPORTS_REJECTED, SINK_INSERT_DURATION,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
    routing::{get, post},
};
use chrono::Utc;
use reporting::annotate::annotate;
use reporting::types::Report;
use reporting::{
    BrowserDetector, LogWarnings, NormalizedRecord, ParseError, ProductTokenDetector, Rejection,
    ReportSink, ServiceTag, SinkError, SummaryRow, TimeWindow,
};
use serde::Serialize;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<dyn ReportSink>,
    pub detector: Arc<dyn BrowserDetector>,
    pub summary_days: u32,
}

impl AppState {
    pub fn new(sink: Arc<dyn ReportSink>, summary_days: u32) -> Self {
        AppState {
            sink,
            detector: Arc::new(ProductTokenDetector),
            summary_days,
        }
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/report/{service}", post(post_report).options(preflight))
        .route(
            "/security/{service}",
            post(post_security).options(preflight),
        )
        .route("/analytics", get(list_services))
        .route(
            "/analytics/{service}",
            get(get_summary).post(post_analytics).options(preflight),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors_layer())
        .with_state(state)
}

/// Browsers send reports cross-origin, some with credentials, so the
/// request origin is mirrored back instead of answering with `*`.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .max_age(Duration::from_secs(300))
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    accepted: usize,
    warnings: usize,
}

#[derive(Debug, Serialize)]
struct SecurityResponse {
    accepted: usize,
    rejected: Vec<Rejection>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    service: ServiceTag,
    days: u32,
    rows: Vec<SummaryRow>,
}

async fn healthz() -> &'static str {
    "ok."
}

// Preflights are answered by the CORS layer; a bare OPTIONS still gets an
// empty 200.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Web vitals the dashboards know about. Anything else is tagged `other`
/// so the `name` tag stays bounded.
fn vital_tag(name: &str) -> &'static str {
    match name {
        "CLS" => "CLS",
        "FCP" => "FCP",
        "FID" => "FID",
        "INP" => "INP",
        "LCP" => "LCP",
        "TTFB" => "TTFB",
        _ => "other",
    }
}

fn rejected(error: ParseError, service: &str) -> CollectorError {
    tracing::debug!(service, %error, "report rejected");
    counter!(REPORTS_REJECTED, "error" => error.kind()).increment(1);
    error.into()
}

async fn store(sink: &dyn ReportSink, records: Vec<NormalizedRecord>) -> Result<(), SinkError> {
    let start = Instant::now();
    let result = sink.insert(records).await;
    histogram!(SINK_INSERT_DURATION, "sink" => sink.name()).record(start.elapsed().as_secs_f64());
    result
}

async fn post_report(
    State(state): State<AppState>,
    Path(service): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, CollectorError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let mut warnings = LogWarnings::default();
    let records = reporting::parse(content_type, &body, &service, &mut warnings)
        .map_err(|error| rejected(error, &service))?;

    counter!(REPORTS_FIELD_WARNINGS).increment(warnings.count as u64);
    for record in &records {
        counter!(REPORTS_RECEIVED, "kind" => record.report.kind().to_string()).increment(1);
    }
    tracing::debug!(
        service = %service,
        content_type,
        records = records.len(),
        warnings = warnings.count,
        "reports parsed"
    );

    let accepted = records.len();
    store(state.sink.as_ref(), records).await?;

    Ok(Json(IngestResponse {
        accepted,
        warnings: warnings.count,
    }))
}

async fn post_security(
    State(state): State<AppState>,
    Path(service): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SecurityResponse>, CollectorError> {
    let service_tag = ServiceTag::parse(&service).map_err(|error| rejected(error, &service))?;

    let mut warnings = LogWarnings::default();
    let batch = reporting::parse_security_reports(&body, state.detector.as_ref(), &mut warnings)
        .map_err(|error| rejected(error, &service))?;

    counter!(REPORTS_FIELD_WARNINGS).increment(warnings.count as u64);
    counter!(SECURITY_REPORTS_ACCEPTED).increment(batch.accepted.len() as u64);
    for rejection in &batch.rejected {
        counter!(SECURITY_REPORTS_REJECTED, "error" => rejection.error.kind()).increment(1);
    }
    if !batch.rejected.is_empty() {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        tracing::info!(
            service = %service,
            user_agent,
            rejected = batch.rejected.len(),
            "security reports rejected"
        );
    }

    let now = Utc::now();
    let accepted = batch.accepted.len();
    let records = batch
        .accepted
        .into_iter()
        .map(|report| annotate(Report::Security(report), &service_tag, now))
        .collect();
    store(state.sink.as_ref(), records).await?;

    Ok(Json(SecurityResponse {
        accepted,
        rejected: batch.rejected,
    }))
}

async fn post_analytics(
    State(state): State<AppState>,
    Path(service): Path<String>,
    body: Bytes,
) -> Result<Json<IngestResponse>, CollectorError> {
    let mut warnings = LogWarnings::default();
    let record = reporting::parse_analytics(&body, &service, &mut warnings)
        .map_err(|error| rejected(error, &service))?;

    counter!(REPORTS_FIELD_WARNINGS).increment(warnings.count as u64);
    counter!(ANALYTICS_RECEIVED, "name" => vital_tag(record.report.kind())).increment(1);

    store(state.sink.as_ref(), vec![record]).await?;

    Ok(Json(IngestResponse {
        accepted: 1,
        warnings: warnings.count,
    }))
}

async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceTag>>, CollectorError> {
    Ok(Json(state.sink.services().await?))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Result<Json<SummaryResponse>, CollectorError> {
    let service = ServiceTag::parse(&service)?;
    let window = TimeWindow::last_days(Utc::now(), state.summary_days);
    let rows = state.sink.query(&service, window).await?;

    Ok(Json(SummaryResponse {
        service,
        days: state.summary_days,
        rows,
    }))
}
