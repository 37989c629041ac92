use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use mealbook_core::db::Database;
use mealbook_core::mealdb::transform_meal;
use mealbook_core::models::{
    Favorite, Meal, MealCategory, RecipeIdInput, ServingsInput, parse_recipe_id,
    validate_new_favorite,
};
use mealbook_core::service::{DEFAULT_RANDOM_COUNT, MealCatalog};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MiB

#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Database>>,
    catalog: Arc<MealCatalog>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFavoriteRequest {
    user_id: Option<String>,
    recipe_id: Option<RecipeIdInput>,
    title: Option<String>,
    image: Option<String>,
    cook_time: Option<String>,
    servings: Option<ServingsInput>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Deserialize)]
struct RandomQuery {
    count: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Rejected(JsonRejection),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Rejected(rejection) => return rejection.into_response(),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::MissingJsonContentType(_) => {
                Self::BadRequest(rejection.body_text())
            }
            // Oversized bodies keep their 413
            other => Self::Rejected(other),
        }
    }
}

// --- Middleware ---

async fn log_requests(request: Request, next: Next) -> Response {
    tracing::info!(method = %request.method(), path = %request.uri().path(), "incoming request");
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    response
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

// --- Favorites handlers ---

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { success: true })
}

async fn create_favorite(
    State(state): State<AppState>,
    payload: Result<Json<CreateFavoriteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    let Json(req) = payload?;

    let new_favorite = validate_new_favorite(
        req.user_id,
        req.recipe_id.as_ref(),
        req.title,
        req.image,
        req.cook_time,
        req.servings,
    )
    .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let favorite = db
        .insert_favorite(&new_favorite)
        .context("failed to add favorite")?;

    Ok((StatusCode::CREATED, Json(favorite)))
}

async fn list_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Favorite>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let favorites = db
        .list_favorites(&user_id)
        .context("failed to fetch favorites")?;
    Ok(Json(favorites))
}

async fn delete_favorite(
    State(state): State<AppState>,
    Path((user_id, recipe_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let recipe_id = parse_recipe_id(&recipe_id).map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let removed = {
        let db = state
            .db
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        db.delete_favorite(&user_id, recipe_id)
            .context("failed to remove favorite")?
    };
    tracing::debug!(%user_id, recipe_id, removed, "favorite removed");

    Ok(Json(MessageResponse {
        message: "Favorite removed successfully",
    }))
}

// --- Meal handlers ---

async fn search_meals(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<Meal>> {
    let meals = state.catalog.search_by_name(&params.q).await;
    Json(meals.iter().map(transform_meal).collect())
}

async fn random_meals(
    State(state): State<AppState>,
    Query(params): Query<RandomQuery>,
) -> Json<Vec<Meal>> {
    let count = params.count.unwrap_or(DEFAULT_RANDOM_COUNT);
    let meals = state.catalog.random_meals(count).await;
    Json(meals.iter().map(transform_meal).collect())
}

async fn random_meal(State(state): State<AppState>) -> Result<Json<Meal>, ApiError> {
    let meal = state
        .catalog
        .random_meal()
        .await
        .ok_or_else(|| ApiError::NotFound("No meals available".to_string()))?;
    Ok(Json(transform_meal(&meal)))
}

async fn list_categories(State(state): State<AppState>) -> Json<Vec<MealCategory>> {
    Json(state.catalog.categories().await)
}

async fn meals_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Json<Vec<Meal>> {
    let meals = state.catalog.filter_by_category(&category).await;
    Json(meals.iter().map(transform_meal).collect())
}

async fn meals_by_ingredient(
    State(state): State<AppState>,
    Path(ingredient): Path<String>,
) -> Json<Vec<Meal>> {
    let meals = state.catalog.filter_by_ingredient(&ingredient).await;
    Json(meals.iter().map(transform_meal).collect())
}

async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Meal>, ApiError> {
    let meal = state
        .catalog
        .get_by_id(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Meal '{id}' not found")))?;
    Ok(Json(transform_meal(&meal)))
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/favorites", post(create_favorite))
        .route("/api/favorites/{user_id}", get(list_favorites))
        .route(
            "/api/favorites/{user_id}/{recipe_id}",
            delete(delete_favorite),
        )
        .route("/api/meals/search", get(search_meals))
        .route("/api/meals/random", get(random_meals))
        .route("/api/meals/random/one", get(random_meal))
        .route("/api/meals/categories", get(list_categories))
        .route("/api/meals/category/{name}", get(meals_by_category))
        .route("/api/meals/ingredient/{name}", get(meals_by_ingredient))
        .route("/api/meals/{id}", get(get_meal))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(cors_layer())
        .layer(middleware::from_fn(log_requests))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    db: Database,
    catalog: MealCatalog,
    bind: &str,
    port: u16,
    network_host: &str,
) -> anyhow::Result<()> {
    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        catalog: Arc::new(catalog),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!("server running on port {port}");
    tracing::info!("local: http://localhost:{port}");
    tracing::info!("network: http://{network_host}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
