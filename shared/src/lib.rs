//! Plumbing shared by the reportd services.

pub mod admin_service;
pub mod http;
pub mod metrics_defs;
