//! Metrics collection and exposition.
//!
//! # Metrics
//! - `valkyrja_requests_total` (counter): requests by method, status, route
//! - `valkyrja_request_duration_seconds` (histogram): latency by method, route
//! - `valkyrja_route_misses_total` (counter): unmatched requests by method, kind
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Route label is the route name, else its path pattern, never the raw
//!   request path (bounded cardinality)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "valkyrja_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "valkyrja_request_duration_seconds";
pub const ROUTE_MISSES_TOTAL: &str = "valkyrja_route_misses_total";

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a request no route matched.
pub fn record_route_miss(method: &str, method_not_allowed: bool) {
    let kind = if method_not_allowed { "method_not_allowed" } else { "not_found" };
    metrics::counter!(ROUTE_MISSES_TOTAL, "method" => method.to_string(), "kind" => kind).increment(1);
}
