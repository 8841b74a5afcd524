//! Request counters rendered in Prometheus text format on `/metrics`.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use storekeep_core::LimiterStats;

use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RouteKey {
    method: &'static str,
    route: String,
    status: u16,
}

#[derive(Debug, Default)]
struct RouteStats {
    count: AtomicU64,
    duration_micros: AtomicU64,
}

#[derive(Debug, Default)]
pub struct HttpMetrics {
    routes: DashMap<RouteKey, RouteStats>,
    in_flight: AtomicI64,
}

struct InFlight<'a>(&'a AtomicI64);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlight(&self.in_flight)
    }

    pub fn record(&self, method: &Method, route: &str, status: u16, elapsed: Duration) {
        let key = RouteKey {
            method: method_label(method),
            route: route.to_string(),
            status,
        };
        let stats = self.routes.entry(key).or_default();
        stats.count.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        stats.duration_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition of the request and limiter counters.
    pub fn render(&self, limiter: LimiterStats) -> String {
        let mut rows: Vec<(RouteKey, u64, u64)> = self
            .routes
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.count.load(Ordering::Relaxed),
                    entry.duration_micros.load(Ordering::Relaxed),
                )
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::new();
        out.push_str("# HELP http_requests_total Total number of HTTP requests.\n");
        out.push_str("# TYPE http_requests_total counter\n");
        for (key, count, _) in &rows {
            let _ = writeln!(out, "http_requests_total{{{}}} {count}", labels(key));
        }

        out.push_str("# HELP http_request_duration_seconds HTTP request latency.\n");
        out.push_str("# TYPE http_request_duration_seconds summary\n");
        for (key, count, micros) in &rows {
            let labels = labels(key);
            let secs = *micros as f64 / 1_000_000.0;
            let _ = writeln!(out, "http_request_duration_seconds_sum{{{labels}}} {secs}");
            let _ = writeln!(out, "http_request_duration_seconds_count{{{labels}}} {count}");
        }

        out.push_str("# HELP http_active_connections Requests currently being served.\n");
        out.push_str("# TYPE http_active_connections gauge\n");
        let _ = writeln!(out, "http_active_connections {}", self.in_flight());

        out.push_str("# HELP rate_limiter_decisions_total Rate limiter decisions.\n");
        out.push_str("# TYPE rate_limiter_decisions_total counter\n");
        let _ = writeln!(out, "rate_limiter_decisions_total{{decision=\"allowed\"}} {}", limiter.allowed);
        let _ = writeln!(out, "rate_limiter_decisions_total{{decision=\"denied\"}} {}", limiter.denied);

        out.push_str("# HELP rate_limiter_tracked_clients Client keys with a live bucket.\n");
        out.push_str("# TYPE rate_limiter_tracked_clients gauge\n");
        let _ = writeln!(out, "rate_limiter_tracked_clients {}", limiter.tracked_keys);

        out
    }
}

/// Extension methods share one label so clients cannot mint new series.
fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        Method::CONNECT => "CONNECT",
        Method::TRACE => "TRACE",
        _ => "OTHER",
    }
}

fn labels(key: &RouteKey) -> String {
    format!(
        "method=\"{}\",endpoint=\"{}\",status=\"{}\"",
        key.method, key.route, key.status
    )
}

/// Counts every request, including those the rate limiter rejects.
pub async fn track_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let _in_flight = state.metrics.enter();
    let start = Instant::now();
    let response = next.run(req).await;
    state
        .metrics
        .record(&method, &route, response.status().as_u16(), start.elapsed());

    response
}
