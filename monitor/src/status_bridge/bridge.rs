use crate::status_bridge::model::StatusReport;
use anyhow::Context;
use log::info;
use samcamcore::telemetry::MetricsRecorder;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tokio::runtime::Builder;
use warp::Filter;

/// Read-only HTTP view of the monitor, served from a background thread.
pub struct StatusBridge;

impl StatusBridge {
    /// Binds `addr` before spawning, so a taken port is reported to the caller.
    /// Returns the bound address.
    pub fn spawn(addr: SocketAddr, metrics: Arc<MetricsRecorder>) -> anyhow::Result<SocketAddr> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for status bridge")?;
        let routes = routes(metrics, Instant::now());

        let (bound, server) = {
            let _entered = runtime.enter();
            warp::serve(routes)
                .try_bind_ephemeral(addr)
                .with_context(|| format!("binding status bridge to {}", addr))?
        };

        thread::spawn(move || {
            runtime.block_on(server);
        });

        info!("status bridge listening on http://{}", bound);
        Ok(bound)
    }
}

pub fn routes(
    metrics: Arc<MetricsRecorder>,
    started: Instant,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let metrics_filter = warp::any().map(move || metrics.clone());

    let status_route = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(metrics_filter)
        .and_then(move |metrics: Arc<MetricsRecorder>| async move {
            let report = StatusReport::new(metrics.snapshot(), started.elapsed().as_secs());
            Ok::<_, Infallible>(warp::reply::json(&report))
        });

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })));

    status_route.or(health_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use samcamcore::monitor::MonitorState;
    use std::net::TcpListener;

    #[tokio::test]
    async fn status_reflects_recorder() {
        let metrics = Arc::new(MetricsRecorder::new());
        metrics.set_capacity(5);
        metrics.set_state(MonitorState::Sleeping);

        let response = warp::test::request()
            .method("GET")
            .path("/status")
            .reply(&routes(metrics, Instant::now()))
            .await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["service"], "samcam");
        assert_eq!(body["monitor"]["state"], "sleeping");
        assert_eq!(body["monitor"]["history_capacity"], 5);
        assert_eq!(body["history_full"], false);
        assert_eq!(body["running"], true);
    }

    #[tokio::test]
    async fn stopped_monitor_is_not_running() {
        let metrics = Arc::new(MetricsRecorder::new());
        metrics.set_state(MonitorState::Stopped);

        let response = warp::test::request()
            .path("/status")
            .reply(&routes(metrics, Instant::now()))
            .await;

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["running"], false);
    }

    #[test]
    fn spawn_reports_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let err = StatusBridge::spawn(addr, Arc::new(MetricsRecorder::new())).unwrap_err();
        assert!(err.to_string().contains("binding status bridge"));
    }

    #[test]
    fn spawn_returns_bound_address() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let bound = StatusBridge::spawn(addr, Arc::new(MetricsRecorder::new())).unwrap();
        assert_ne!(bound.port(), 0);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = warp::test::request()
            .path("/health")
            .reply(&routes(Arc::new(MetricsRecorder::new()), Instant::now()))
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn unknown_path_is_rejected() {
        let response = warp::test::request()
            .path("/history")
            .reply(&routes(Arc::new(MetricsRecorder::new()), Instant::now()))
            .await;
        assert_eq!(response.status(), 404);
    }
}
