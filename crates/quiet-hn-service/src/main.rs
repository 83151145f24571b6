use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use quiet_hn_api::{QuietHnApi, TopStoriesPage, API_CONTRACT_VERSION};
use quiet_hn_client::{HackerNewsClient, DEFAULT_BASE_URL};
use quiet_hn_core::{
    AggregationConfig, SharedItemCache, DEFAULT_OVERFETCH_FACTOR, DEFAULT_TARGET_COUNT,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod render;

const SERVICE_CONTRACT_VERSION: &str = "service.v1";

#[derive(Debug, Clone)]
struct ServiceState {
    api: QuietHnApi,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceEnvelope<T>
where
    T: Serialize,
{
    service_contract_version: &'static str,
    api_contract_version: &'static str,
    data: T,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    service_contract_version: &'static str,
    error: String,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    cached_items: usize,
}

#[derive(Debug, Parser)]
#[command(name = "quiet-hn-service")]
#[command(about = "Hacker News top stories, links only")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    /// Number of stories to show.
    #[arg(long, default_value_t = DEFAULT_TARGET_COUNT)]
    num_stories: usize,
    /// Extra share of ranked items fetched to make up for non-story items.
    #[arg(long, default_value_t = DEFAULT_OVERFETCH_FACTOR)]
    overfetch_factor: f64,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    hn_base_url: String,
    #[arg(long, default_value_t = 10)]
    http_timeout_secs: u64,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

impl ServiceState {
    fn error(message: impl Into<String>) -> ServiceError {
        ServiceError { service_contract_version: SERVICE_CONTRACT_VERSION, error: message.into() }
    }
}

fn envelope<T>(data: T) -> ServiceEnvelope<T>
where
    T: Serialize,
{
    ServiceEnvelope {
        service_contract_version: SERVICE_CONTRACT_VERSION,
        api_contract_version: API_CONTRACT_VERSION,
        data,
    }
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/v1/health", get(health))
        .route("/v1/top", get(top))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AggregationConfig::new(args.num_stories, args.overfetch_factor)?;
    let client = Arc::new(HackerNewsClient::new(
        args.hn_base_url,
        Duration::from_secs(args.http_timeout_secs),
    )?);
    let api = QuietHnApi::new(client.clone(), client, SharedItemCache::new(), config)?;

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(
        bind = %args.bind,
        num_stories = config.target_count,
        overfetch_factor = config.overfetch_factor,
        "quiet-hn-service listening"
    );
    axum::serve(listener, app(ServiceState { api })).await?;
    Ok(())
}

async fn index(State(state): State<ServiceState>) -> Response {
    match state.api.top_stories().await {
        Ok(page) => Html(render::page(&page)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to load top stories");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load top stories").into_response()
        }
    }
}

async fn health(State(state): State<ServiceState>) -> Json<ServiceEnvelope<HealthResponse>> {
    Json(envelope(HealthResponse { status: "ok", cached_items: state.api.cache().len() }))
}

async fn top(
    State(state): State<ServiceState>,
) -> Result<Json<ServiceEnvelope<TopStoriesPage>>, ServiceError> {
    let page = state.api.top_stories().await.map_err(|err| {
        tracing::error!(error = %err, "failed to load top stories");
        ServiceState::error(err.to_string())
    })?;
    Ok(Json(envelope(page)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use http::Request;
    use quiet_hn_core::fixture::{comment, story, FixtureItems, FixtureRanking};
    use quiet_hn_core::ItemProvider;
    use tower::ServiceExt;

    fn state(ranking: FixtureRanking, items: FixtureItems, target_count: usize) -> ServiceState {
        let items: Arc<dyn ItemProvider> = items.into_shared();
        let config = AggregationConfig { target_count, ..AggregationConfig::default() };
        match QuietHnApi::new(Arc::new(ranking), items, SharedItemCache::new(), config) {
            Ok(api) => ServiceState { api },
            Err(err) => panic!("fixture api should build: {err}"),
        }
    }

    fn fixture_state() -> ServiceState {
        state(
            FixtureRanking::new([5, 4, 3, 2, 1]),
            FixtureItems::new().with_records([story(5), comment(4), story(3), story(2), story(1)]),
            2,
        )
    }

    async fn get(router: Router, uri: &str) -> Response {
        match router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .method("GET")
                    .body(axum::body::Body::empty())
                    .unwrap_or_else(|err| panic!("failed to build request: {err}")),
            )
            .await
        {
            Ok(response) => response,
            Err(err) => panic!("router request failed: {err}"),
        }
    }

    async fn response_text(response: Response) -> String {
        let bytes = match to_bytes(response.into_body(), 1024 * 1024).await {
            Ok(bytes) => bytes,
            Err(err) => panic!("failed to read response body: {err}"),
        };
        match String::from_utf8(bytes.to_vec()) {
            Ok(body) => body,
            Err(err) => panic!("response body is not UTF-8: {err}"),
        }
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let body = response_text(response).await;
        match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => panic!("response body is not JSON: {err}; body={body}"),
        }
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let response = get(app(fixture_state()), "/v1/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(
            value.get("service_contract_version").and_then(serde_json::Value::as_str),
            Some(SERVICE_CONTRACT_VERSION)
        );
        assert_eq!(value["data"]["status"], serde_json::json!("ok"));
        assert_eq!(value["data"]["cached_items"], serde_json::json!(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn top_endpoint_returns_ranked_stories() {
        let state = fixture_state();
        let response = get(app(state.clone()), "/v1/top").await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        let ids = value["data"]["stories"]
            .as_array()
            .unwrap_or_else(|| panic!("missing data.stories in response: {value}"))
            .iter()
            .filter_map(|story| story.get("id").and_then(serde_json::Value::as_u64))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![5, 3]);
        assert_eq!(value["data"]["ranked_count"], serde_json::json!(5));
        assert_eq!(
            value.get("api_contract_version").and_then(serde_json::Value::as_str),
            Some(API_CONTRACT_VERSION)
        );
        assert_eq!(state.api.cache().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn index_renders_html_page() {
        let response = get(app(fixture_state()), "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_text(response).await;
        assert!(body.contains("<h1>Quiet Hacker News</h1>"));
        let five = body.find("Story 5").unwrap_or_else(|| panic!("missing story 5: {body}"));
        let three = body.find("Story 3").unwrap_or_else(|| panic!("missing story 3: {body}"));
        assert!(five < three);
        assert!(!body.contains("Story 2"));
    }

    #[tokio::test]
    async fn ranking_outage_fails_both_views() {
        let down = state(FixtureRanking::unavailable(), FixtureItems::new(), 30);

        let html = get(app(down.clone()), "/").await;
        assert_eq!(html.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_text(html).await, "Failed to load top stories");

        let json = get(app(down), "/v1/top").await;
        assert_eq!(json.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let value = response_json(json).await;
        assert!(value["error"]
            .as_str()
            .is_some_and(|message| message.contains("ranking snapshot unavailable")));
    }
}
