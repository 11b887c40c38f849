//! HTTP server implementation using Axum.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rollcall_channels::TelegramUpdate;
use rollcall_core::IncomingEvent;
use tokio::sync::mpsc::UnboundedSender;
use tower_http::trace::TraceLayer;

const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state for the gateway server.
pub struct GatewayState {
    pub start_time: Instant,
    /// Where decoded webhook updates go (the bot's event loop).
    pub events: UnboundedSender<IncomingEvent>,
    /// Expected secret header value; `None` accepts any delivery.
    pub webhook_secret: Option<String>,
}

impl GatewayState {
    pub fn new(events: UnboundedSender<IncomingEvent>, webhook_secret: &str) -> Self {
        Self {
            start_time: Instant::now(),
            events,
            webhook_secret: Some(webhook_secret.to_string()).filter(|s| !s.is_empty()),
        }
    }
}

async fn index() -> &'static str {
    "rollcall is running ✅"
}

async fn health_check(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "rollcall",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Telegram webhook delivery. Always answers 200 for well-authenticated
/// requests so Telegram does not redeliver updates we chose to ignore.
async fn telegram_webhook(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = &state.webhook_secret {
        let given = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if given != expected {
            tracing::warn!("Rejected webhook delivery with wrong secret");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!("Unreadable webhook update: {e}");
            return StatusCode::OK;
        }
    };

    if let Some(event) = update.to_incoming()
        && state.events.send(event).is_err()
    {
        tracing::error!("Event loop is gone; dropping update {}", update.update_id);
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

/// Build the Axum router. The webhook route is mounted only when a path is given.
pub fn build_router(state: Arc<GatewayState>, webhook_path: Option<&str>) -> Router {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check));

    if let Some(path) = webhook_path {
        router = router.route(path, post(telegram_webhook));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Start the HTTP server.
pub async fn start(host: &str, port: u16, router: Router) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn router(secret: &str) -> (Router, mpsc::UnboundedReceiver<IncomingEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(GatewayState::new(tx, secret));
        (build_router(state, Some("/webhook")), rx)
    }

    fn answer_body() -> String {
        serde_json::json!({
            "update_id": 1,
            "poll_answer": {
                "poll_id": "p1",
                "user": {"id": 3, "is_bot": false, "first_name": "Vera"},
                "option_ids": [1]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _rx) = router("");
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "rollcall");
    }

    #[tokio::test]
    async fn test_index() {
        let (app, _rx) = router("");
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_forwards_answer() {
        let (app, mut rx) = router("s3cret");
        let req = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(SECRET_HEADER, "s3cret")
            .header("Content-Type", "application/json")
            .body(Body::from(answer_body()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        match rx.try_recv().unwrap() {
            IncomingEvent::Answer { poll_ref, option_ids, .. } => {
                assert_eq!(poll_ref, "p1");
                assert_eq!(option_ids, vec![1]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_webhook_rejects_wrong_secret() {
        let (app, mut rx) = router("s3cret");
        let req = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(SECRET_HEADER, "guess")
            .body(Body::from(answer_body()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_webhook_ignores_garbage() {
        let (app, mut rx) = router("");
        let req = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from("not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_webhook_not_mounted_in_polling_mode() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let app = build_router(Arc::new(GatewayState::new(tx, "")), None);
        let req = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from(answer_body()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
