use std::fmt;
use std::net::SocketAddr;

use axum::extract::{Path, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, ErrorCode, LeaderboardEntry, McqAnswerRequest, McqOutcome, NextMcq, NextProblem,
    PlayerProfile, ProblemView, SubmissionOutcome, SubmissionRequest, ZoneSummary,
    SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::QuestApi;

include!("error.rs");
include!("state.rs");
include!("routes.rs");

pub async fn serve(addr: SocketAddr, api: QuestApi) -> Result<(), ServerError> {
    let state = AppState::new(api);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/player", get(get_player))
        .route("/api/v1/player/reset", post(reset_player))
        .route("/api/v1/player/name", post(set_name))
        .route("/api/v1/zones", get(list_zones))
        .route("/api/v1/zones/{zone_id}/problems", get(list_problems))
        .route("/api/v1/zones/{zone_id}/next", get(next_problem))
        .route("/api/v1/zones/{zone_id}/mcq", get(next_mcq))
        .route("/api/v1/submissions", post(submit_code))
        .route("/api/v1/mcq/answers", post(answer_mcq))
        .route("/api/v1/leaderboard", get(leaderboard))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
}

#[cfg(test)]
mod tests;
