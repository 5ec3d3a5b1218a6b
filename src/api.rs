// 🌐 HTTP API (feature = "server")
// Local JSON surface over one shared ledger: food lookup, entry submission,
// and read-only day summaries for a dashboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::entities::FoodItem;
use crate::error::LedgerError;
use crate::intake::{IntakeOutcome, TranscriptionResult, VoiceIntake};
use crate::ledger::LoggedFood;
use crate::nutrition::DailyGoal;
use crate::resolver::ResolvedEntry;
use crate::summary::DaySummary;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub intake: VoiceIntake,
    goal: Arc<RwLock<DailyGoal>>,
}

impl AppState {
    pub fn new(intake: VoiceIntake, goal: DailyGoal) -> Self {
        AppState {
            intake,
            goal: Arc::new(RwLock::new(goal)),
        }
    }

    pub fn goal(&self) -> Result<DailyGoal, LedgerError> {
        self.goal
            .read()
            .map(|goal| *goal)
            .map_err(|_| LedgerError::LockPoisoned)
    }

    /// Replace the daily goal. Invalid goals leave the current one in place.
    pub fn set_goal(&self, goal: DailyGoal) -> Result<(), LedgerError> {
        goal.validate()?;
        *self.goal.write().map_err(|_| LedgerError::LockPoisoned)? = goal;
        Ok(())
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Error → HTTP status + envelope
enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Ledger(err) => {
                let status = match &err {
                    LedgerError::InvalidMealSlot(_)
                    | LedgerError::InvalidQuantity(_)
                    | LedgerError::InvalidNutrient { .. }
                    | LedgerError::InvalidGoal { .. } => StatusCode::BAD_REQUEST,
                    LedgerError::EntryNotFound(_) => StatusCode::NOT_FOUND,
                    LedgerError::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                (status, err.to_string())
            }
        };
        (status, Json(ApiResponse::err(message))).into_response()
    }
}

fn parse_entry_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid entry id: {:?}", raw)))
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewEntry {
    pub meal: String,
    pub food: String,
    pub quantity: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub quantity: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/foods?search=&category= - List reference foods
async fn list_foods(State(state): State<AppState>, Query(query): Query<FoodQuery>) -> Json<ApiResponse<Vec<FoodItem>>> {
    let foods = state
        .intake
        .resolver()
        .database()
        .filter(query.category.as_deref(), query.search.as_deref());

    Json(ApiResponse::ok(foods))
}

/// GET /api/foods/categories
async fn list_categories(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::ok(state.intake.resolver().database().categories()))
}

/// GET /api/resolve?q= - Resolve free text without logging it
async fn resolve_food(State(state): State<AppState>, Query(query): Query<ResolveQuery>) -> Json<ApiResponse<ResolvedEntry>> {
    Json(ApiResponse::ok(state.intake.resolver().resolve(&query.q)))
}

/// GET /api/entries - Logged entries for the current day
async fn list_entries(State(state): State<AppState>) -> ApiResult<Vec<LoggedFood>> {
    Ok(Json(ApiResponse::ok(state.intake.ledger().entries()?)))
}

/// POST /api/entries - Resolve and log a food
async fn create_entry(
    State(state): State<AppState>,
    Json(body): Json<NewEntry>,
) -> Result<(StatusCode, Json<ApiResponse<LoggedFood>>), ApiError> {
    let entry = state
        .intake
        .resolver()
        .resolve_entry(&body.food, body.quantity.unwrap_or(1.0))?;
    let logged = state.intake.ledger().apply_entry(&body.meal, &entry)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(logged))))
}

/// GET /api/entries/:id
async fn get_entry(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<LoggedFood> {
    let id = parse_entry_id(&id)?;
    Ok(Json(ApiResponse::ok(state.intake.ledger().entry(id)?)))
}

/// PUT /api/entries/:id - Change the serving count
async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EntryUpdate>,
) -> ApiResult<LoggedFood> {
    let id = parse_entry_id(&id)?;
    Ok(Json(ApiResponse::ok(state.intake.ledger().update_entry(id, body.quantity)?)))
}

/// DELETE /api/entries/:id
async fn delete_entry(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_entry_id(&id)?;
    state.intake.ledger().remove_entry(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/transcriptions - Apply a speech-to-text result
async fn submit_transcription(
    State(state): State<AppState>,
    Json(result): Json<TranscriptionResult>,
) -> ApiResult<IntakeOutcome> {
    Ok(Json(ApiResponse::ok(state.intake.process(&result)?)))
}

/// GET /api/summary - Day snapshot against the current goal
async fn get_summary(State(state): State<AppState>) -> ApiResult<DaySummary> {
    Ok(Json(ApiResponse::ok(state.intake.ledger().summary(&state.goal()?)?)))
}

/// GET /api/goals
async fn get_goals(State(state): State<AppState>) -> ApiResult<DailyGoal> {
    Ok(Json(ApiResponse::ok(state.goal()?)))
}

/// PUT /api/goals - Replace the daily targets
async fn update_goals(State(state): State<AppState>, Json(goal): Json<DailyGoal>) -> ApiResult<DailyGoal> {
    state.set_goal(goal)?;
    tracing::info!(calories = goal.calories, "Daily goal updated");
    Ok(Json(ApiResponse::ok(goal)))
}

/// POST /api/day - Start a fresh ledger for today
async fn start_new_day(State(state): State<AppState>) -> ApiResult<DaySummary> {
    let ledger = state.intake.ledger();
    ledger.new_day(Local::now().date_naive())?;
    Ok(Json(ApiResponse::ok(ledger.summary(&state.goal()?)?)))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/foods", get(list_foods))
        .route("/foods/categories", get(list_categories))
        .route("/resolve", get(resolve_food))
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/:id", get(get_entry).put(update_entry).delete(delete_entry))
        .route("/transcriptions", post(submit_transcription))
        .route("/summary", get(get_summary))
        .route("/goals", get(get_goals).put(update_goals))
        .route("/day", post(start_new_day))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
