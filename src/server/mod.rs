mod cors;
mod error;
mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use log::info;

use crate::config::Config;
use crate::pipeline::Pipeline;

pub use cors::CorsPolicy;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        Ok(Self {
            pipeline: Arc::new(Pipeline::new(config)?),
        })
    }
}

/// All routes behind the CORS middleware.
pub fn router(state: AppState, cors: CorsPolicy) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/ingest", post(handlers::ingest))
        .route("/api/generate-actions", post(handlers::generate_actions))
        .route("/api/structure", post(handlers::structure))
        .route("/api/export", post(handlers::export))
        .route("/api/pipeline", post(handlers::pipeline))
        .layer(from_fn_with_state(Arc::new(cors), cors::enforce))
        .with_state(state)
}

/// Serve the API until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::new(config)?;
    let cors = CorsPolicy::new(&config.server.cors_allowed_origins)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state, cors))
        .await
        .context("HTTP server stopped")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{analysis_json, dust_reply, structured_json, test_config, RouteExt};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use mockito::Matcher;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(url: &str) -> Router {
        let config = test_config(url);
        router(
            AppState::new(&config).unwrap(),
            CorsPolicy::new(&["https://app.example.com".to_string()]).unwrap(),
        )
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app("http://127.0.0.1:1")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_payloads_are_bad_requests() {
        let cases = [
            ("/api/generate-actions", "{}", "Missing analysis payload"),
            ("/api/structure", r#"{"actions": ""}"#, "Missing actions payload"),
            ("/api/export", r#"{"summary": "x"}"#, "Missing tickets payload"),
            ("/api/export", r#"{"structured": {"tickets": 3}}"#, "Missing tickets payload"),
            ("/api/ingest", "{}", "Provide either repoUrl or codeInput"),
        ];

        for (uri, body, message) in cases {
            let response = app("http://127.0.0.1:1")
                .oneshot(post_json(uri, body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json_body(response).await["error"], message, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unparsable_body_is_bad_request() {
        let response = app("http://127.0.0.1:1")
            .oneshot(post_json("/api/pipeline", "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_structure_route_returns_tickets() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock_dust()
            .with_body(dust_reply(&structured_json()))
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(post_json("/api/structure", r#"{"actions": "1. Port it"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["tickets"][0]["priority"], "P1");
        assert_eq!(body["tickets"][0]["acceptanceCriteria"][1], "No print statements remain");
    }

    #[tokio::test]
    async fn test_generate_actions_reads_analysis_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock_gemini()
            .match_body(Matcher::Regex("A tiny script".to_string()))
            .with_body(crate::test_support::gemini_reply("no markers here"))
            .expect(2)
            .create_async()
            .await;

        let body = format!(r#"{{"analysis": {}}}"#, analysis_json());
        let response = app(&server.url())
            .oneshot(post_json("/api/generate-actions", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["actions"], "no markers here");
        assert_eq!(body["verificationNotes"], "");
    }

    #[tokio::test]
    async fn test_export_fallback_is_ok_with_success_false() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock_codewords()
            .with_status(500)
            .create_async()
            .await;

        let body = format!(
            r#"{{"structured": {}, "repoContext": {{"owner": "octo"}}}}"#,
            structured_json()
        );
        let response = app(&server.url())
            .oneshot(post_json("/api/export", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["provider"], "fallback");
        assert_eq!(body["ticketsCreated"], 1);
        assert!(body["csvContent"]
            .as_str()
            .unwrap()
            .starts_with("id,priority,title,description,category,effort,acceptanceCriteria"));
        assert!(body.get("rawResponse").is_none());
    }

    #[tokio::test]
    async fn test_allowed_origin_gets_cors_headers() {
        let response = app("http://127.0.0.1:1")
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(headers[header::VARY], "Origin");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[tokio::test]
    async fn test_disallowed_origin_is_forbidden_without_reaching_the_handler() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let mut request = post_json("/api/structure", r#"{"actions": "1. Port it"}"#);
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://evil.example".parse().unwrap());
        let response = app(&server.url()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
        assert_eq!(
            json_body(response).await["error"],
            "Origin is not allowed by CORS policy"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_preflight() {
        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/api/export")
                .header(header::ORIGIN, origin)
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app("http://127.0.0.1:1")
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );

        let rejected = app("http://127.0.0.1:1")
            .oneshot(preflight("https://evil.example"))
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_same_origin_is_allowed() {
        let response = app("http://127.0.0.1:1")
            .oneshot(
                Request::get("/health")
                    .header(header::HOST, "surgeon.internal:3000")
                    .header(header::ORIGIN, "http://surgeon.internal:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://surgeon.internal:3000"
        );
    }
}
