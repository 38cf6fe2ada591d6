//! HTTP readiness probing for the worker's `/health` endpoint.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use higgs_core::SupervisorError;

/// Delay between probe attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-request timeout for a single probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Attempts after which a 403/404 is treated as "some other service owns the port".
const WRONG_SERVICE_ATTEMPTS: u32 = 3;

fn health_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}/health")
}

fn probe_client() -> Result<reqwest::Client, SupervisorError> {
    reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| SupervisorError::Client(e.to_string()))
}

/// Single probe: `true` when `/health` answers 200.
pub async fn check_http_health(port: u16) -> bool {
    let Ok(client) = probe_client() else {
        return false;
    };

    client
        .get(health_url(port))
        .send()
        .await
        .is_ok_and(|r| r.status().is_success())
}

/// Poll `/health` until it answers 200.
///
/// Runs until success or until a clear wrong-service answer; the caller bounds
/// the total wait.
pub async fn wait_for_http_health(port: u16) -> Result<(), SupervisorError> {
    let url = health_url(port);
    let client = probe_client()?;
    info!("Waiting for worker to be ready at {}", url);

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;

        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Worker is ready on port {}", port);
                return Ok(());
            }
            Ok(response) => {
                let status = response.status();
                debug!("Health check returned status {}, retrying...", status);

                if matches!(status.as_u16(), 403 | 404) && attempt > WRONG_SERVICE_ATTEMPTS {
                    return Err(SupervisorError::HealthProbe(format!(
                        "port {port} appears to be in use by another service (status {status})"
                    )));
                }
            }
            Err(e) => {
                debug!("Health check failed: {}, retrying...", e);
            }
        }

        sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn test_healthy_endpoint() {
        let port = serve(Router::new().route("/health", get(|| async { "ok" }))).await;

        assert!(check_http_health(port).await);
        assert!(wait_for_http_health(port).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_service_fails_fast() {
        let port = serve(Router::new().route("/", get(|| async { StatusCode::OK }))).await;

        let err = wait_for_http_health(port).await.unwrap_err();
        assert!(matches!(err, SupervisorError::HealthProbe(_)));
    }

    #[tokio::test]
    async fn test_nothing_listening() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(!check_http_health(port).await);
    }
}
