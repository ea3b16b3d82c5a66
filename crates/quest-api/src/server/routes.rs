#[derive(Debug, Serialize)]
struct ZonesResponse {
    schema_version: String,
    zones: Vec<ZoneSummary>,
}

#[derive(Debug, Serialize)]
struct ProblemsResponse {
    schema_version: String,
    problems: Vec<ProblemView>,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
    schema_version: String,
    entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
struct SetNameRequest {
    name: String,
}

async fn get_player(State(state): State<AppState>) -> Json<PlayerProfile> {
    let mut api = state.inner.lock().await;
    Json(api.player_profile())
}

async fn reset_player(
    State(state): State<AppState>,
) -> Result<Json<PlayerProfile>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let profile = api.reset_player()?;
    Ok(Json(profile))
}

async fn set_name(
    State(state): State<AppState>,
    Json(request): Json<SetNameRequest>,
) -> Result<Json<PlayerProfile>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let profile = api.set_name(&request.name)?;
    Ok(Json(profile))
}

async fn list_zones(State(state): State<AppState>) -> Json<ZonesResponse> {
    let mut api = state.inner.lock().await;
    Json(ZonesResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        zones: api.list_zones(),
    })
}

async fn list_problems(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> Result<Json<ProblemsResponse>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let problems = api.problems_in_zone(&zone_id)?;
    Ok(Json(ProblemsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        problems,
    }))
}

async fn next_problem(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> Result<Json<NextProblem>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let next = api.next_problem(&zone_id)?;
    Ok(Json(next))
}

async fn next_mcq(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> Result<Json<NextMcq>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let next = api.next_mcq(&zone_id)?;
    Ok(Json(next))
}

async fn submit_code(
    State(state): State<AppState>,
    Json(request): Json<SubmissionRequest>,
) -> Result<Json<SubmissionOutcome>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let outcome = api.evaluate_submission(&request)?;
    Ok(Json(outcome))
}

async fn answer_mcq(
    State(state): State<AppState>,
    Json(request): Json<McqAnswerRequest>,
) -> Result<Json<McqOutcome>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let outcome = api.answer_mcq(&request)?;
    Ok(Json(outcome))
}

async fn leaderboard(State(state): State<AppState>) -> Json<LeaderboardResponse> {
    let mut api = state.inner.lock().await;
    Json(LeaderboardResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        entries: api.leaderboard(),
    })
}
