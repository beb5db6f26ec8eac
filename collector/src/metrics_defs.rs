//! Metrics definitions for the collector.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REPORTS_RECEIVED: MetricDef = MetricDef {
    name: "reports.received",
    metric_type: MetricType::Counter,
    description: "Normalized records produced from report requests. Tagged with kind.",
};

pub const REPORTS_REJECTED: MetricDef = MetricDef {
    name: "reports.rejected",
    metric_type: MetricType::Counter,
    description: "Requests rejected by the parser. Tagged with error kind.",
};

pub const REPORTS_FIELD_WARNINGS: MetricDef = MetricDef {
    name: "reports.field_warnings",
    metric_type: MetricType::Counter,
    description: "Missing or mistyped optional fields that were defaulted",
};

pub const SECURITY_REPORTS_ACCEPTED: MetricDef = MetricDef {
    name: "security_reports.accepted",
    metric_type: MetricType::Counter,
    description: "Security report items that passed validation",
};

pub const SECURITY_REPORTS_REJECTED: MetricDef = MetricDef {
    name: "security_reports.rejected",
    metric_type: MetricType::Counter,
    description: "Security report items rejected individually. Tagged with error kind.",
};

pub const ANALYTICS_RECEIVED: MetricDef = MetricDef {
    name: "analytics.received",
    metric_type: MetricType::Counter,
    description: "Web vitals samples accepted. Tagged with metric name.",
};

pub const SINK_INSERT_DURATION: MetricDef = MetricDef {
    name: "sink.insert.duration",
    metric_type: MetricType::Histogram,
    description: "Time to hand a batch of records to the sink in seconds. Tagged with sink.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REPORTS_RECEIVED,
    REPORTS_REJECTED,
    REPORTS_FIELD_WARNINGS,
    SECURITY_REPORTS_ACCEPTED,
    SECURITY_REPORTS_REJECTED,
    ANALYTICS_RECEIVED,
    SINK_INSERT_DURATION,
];
