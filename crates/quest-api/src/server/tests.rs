use super::*;

use contracts::EngineConfig;

#[test]
fn error_codes_map_to_http_statuses() {
    assert_eq!(
        HttpApiError::status_for(ErrorCode::ProblemNotFound),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        HttpApiError::status_for(ErrorCode::ZoneNotFound),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        HttpApiError::status_for(ErrorCode::McqNotFound),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        HttpApiError::status_for(ErrorCode::ZoneLocked),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        HttpApiError::status_for(ErrorCode::ValidationFailed),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        HttpApiError::status_for(ErrorCode::InternalError),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn api_error_payload_survives_the_http_wrapper() {
    let wrapped: HttpApiError =
        ApiError::new(ErrorCode::ValidationFailed, "name must not be empty", None).into();
    assert_eq!(wrapped.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrapped.error.message, "name must not be empty");
}

#[test]
fn cors_headers_allow_any_origin() {
    let mut headers = axum::http::HeaderMap::new();
    apply_cors_headers(&mut headers);
    assert_eq!(
        headers.get("access-control-allow-origin"),
        Some(&HeaderValue::from_static("*"))
    );
}

#[test]
fn router_builds_with_a_fresh_facade() {
    let state = AppState::new(QuestApi::from_config(EngineConfig::default()));
    let _ = router(state);
}
