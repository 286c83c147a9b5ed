use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    middleware::map_response,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, error::ApiError, posts, state::AppState};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(posts::router())
                .route("/help", get(help)),
        )
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .fallback(not_found)
        .with_state(state)
        .layer(map_response(method_not_allowed_as_json))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn help() -> Json<Value> {
    Json(json!({
        "create user": "/api/user method POST. Requires fields email and password",
        "get auth token": "/api/token method GET. Requires email and password via basic auth",
        "create post": "/api/post method POST. Requires field title, optional field body",
        "get users profile": "/api/user method GET. Requires token or email and password",
        "get users posts": "/api/posts method GET. Requires token or email and password",
        "get all posts": "/api/posts/all method GET. Requires token or email and password. Paged by 5, argument page",
        "post search": "/api/posts/search method GET. Requires token or email and password, argument q",
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Method routers answer a wrong verb with an empty 405; give it the JSON body.
async fn method_not_allowed_as_json(res: Response) -> Response {
    if res.status() == StatusCode::METHOD_NOT_ALLOWED {
        return ApiError::MethodNotAllowed.into_response();
    }
    res
}
