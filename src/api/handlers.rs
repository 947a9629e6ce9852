use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::routes::CACHE_HIT_HEADER;
use crate::visitor::{DeviceClass, VisitorMetadata};
use crate::visits::{StatsSnapshot, VisitCounter, VisitReport, VisitStatus};

pub struct AppState {
    pub counter: VisitCounter,
}

#[derive(Serialize)]
pub struct VisitorInfo<'a> {
    pub country: &'a str,
    pub device: DeviceClass,
}

#[derive(Serialize)]
pub struct VisitResponse<'a> {
    pub status: VisitStatus,
    pub visitor: VisitorInfo<'a>,
    pub statistics: &'a StatsSnapshot,
}

impl<'a> From<&'a VisitReport> for VisitResponse<'a> {
    fn from(report: &'a VisitReport) -> Self {
        Self {
            status: report.status,
            visitor: VisitorInfo {
                country: &report.country,
                device: report.device,
            },
            statistics: &report.stats,
        }
    }
}

/// Count a visit and return the current statistics
pub async fn count_visit(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let visitor = VisitorMetadata::from_headers(&headers);
    let report = state.counter.record_visit(&visitor).await;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        CACHE_HIT_HEADER,
        HeaderValue::from_static(if report.cache_hit { "true" } else { "false" }),
    );

    (response_headers, Json(VisitResponse::from(&report))).into_response()
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
