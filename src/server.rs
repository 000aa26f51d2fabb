// Church Admin - HTTP API
//
// JSON API over the registries and the authentication gate. Everything
// except health and the auth routes requires a signed-in user.

use crate::auth::{AuthError, User};
use crate::context::ChurchContext;
use crate::entities::{
    categories_for, ChurchEvent, ChurchEventPatch, Entity, EventType, FinanceRecord,
    FinanceRecordPatch, FinanceType, Member, MemberPatch, NewChurchEvent, NewFinanceRecord,
    NewMember, EXPENSE_CATEGORIES, INCOME_CATEGORIES,
};
use crate::error::StoreError;
use crate::registry::Registry;
use crate::views::{filter_events, filter_finance, parse_filter, search_members, FinanceSummary};
use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    ctx: Arc<ChurchContext>,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::ok(data))).into_response()
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

fn store_error(err: StoreError) -> Response {
    let status = match &err {
        StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Backend { .. } | StoreError::EmptyInsert(_) | StoreError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        warn!(error = %err, "request rejected");
    } else {
        error!(error = %err, "store request failed");
    }
    fail(status, err.to_string())
}

fn auth_error(err: AuthError) -> Response {
    let status = match &err {
        AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        AuthError::Rejected { status, .. } if *status < 500 => StatusCode::UNAUTHORIZED,
        AuthError::Rejected { .. } | AuthError::Store(StoreError::Http(_)) => {
            StatusCode::BAD_GATEWAY
        }
        AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %err, "auth request failed");
    }
    fail(status, err.to_string())
}

// ============================================================================
// Auth gate
// ============================================================================

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.ctx.auth.is_authenticated() {
        return fail(StatusCode::UNAUTHORIZED, "not signed in");
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// POST /api/auth/login
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match state.ctx.auth.login(&req.username, &req.password).await {
        Ok(user) => respond(StatusCode::OK, user),
        Err(e) => auth_error(e),
    }
}

/// POST /api/auth/signup
async fn signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    match state.ctx.auth.signup(&req.email, &req.password).await {
        Ok(user) => respond(StatusCode::CREATED, user),
        Err(e) => auth_error(e),
    }
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>) -> Response {
    match state.ctx.auth.logout().await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::empty())).into_response(),
        Err(e) => auth_error(e),
    }
}

/// GET /api/auth/session
async fn session(State(state): State<AppState>) -> Response {
    let user = state.ctx.auth.current_user();
    respond(
        StatusCode::OK,
        SessionResponse {
            authenticated: user.is_some(),
            user,
        },
    )
}

// ============================================================================
// Generic CRUD helpers
// ============================================================================

async fn create_in<E: Entity>(registry: &Registry<E>, new: E::New) -> Response {
    match registry.create(new).await {
        Ok(created) => respond(StatusCode::CREATED, created),
        Err(e) => store_error(e),
    }
}

/// Update, then answer with the record as the store now has it.
async fn update_in<E: Entity>(registry: &Registry<E>, id: &str, patch: E::Patch) -> Response {
    if let Err(e) = registry.update(id, patch).await {
        return store_error(e);
    }
    match registry.find(id).await {
        Ok(Some(item)) => respond(StatusCode::OK, item),
        Ok(None) => fail(StatusCode::NOT_FOUND, format!("no {} with id '{}'", E::KIND, id)),
        Err(e) => store_error(e),
    }
}

async fn delete_in<E: Entity>(registry: &Registry<E>, id: &str) -> Response {
    match registry.delete(id).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::empty())).into_response(),
        Err(e) => store_error(e),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard
async fn dashboard(State(state): State<AppState>) -> Response {
    match state.ctx.registry.dashboard().await {
        Ok(summary) => respond(StatusCode::OK, summary),
        Err(e) => store_error(e),
    }
}

/// GET /api/members?q=
async fn list_members(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    match state.ctx.registry.members.all().await {
        Ok(members) => respond(
            StatusCode::OK,
            search_members(&members, query.q.as_deref().unwrap_or_default()),
        ),
        Err(e) => store_error(e),
    }
}

async fn create_member(State(state): State<AppState>, Json(new): Json<NewMember>) -> Response {
    create_in(&state.ctx.registry.members, new).await
}

async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<MemberPatch>,
) -> Response {
    update_in::<Member>(&state.ctx.registry.members, &id, patch).await
}

async fn delete_member(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    delete_in::<Member>(&state.ctx.registry.members, &id).await
}

/// GET /api/events?type=
async fn list_events(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let event_type = match parse_filter::<EventType>(query.kind.as_deref()) {
        Ok(t) => t,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e),
    };
    match state.ctx.registry.events.all().await {
        Ok(events) => respond(StatusCode::OK, filter_events(&events, event_type)),
        Err(e) => store_error(e),
    }
}

async fn create_event(State(state): State<AppState>, Json(new): Json<NewChurchEvent>) -> Response {
    create_in(&state.ctx.registry.events, new).await
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ChurchEventPatch>,
) -> Response {
    update_in::<ChurchEvent>(&state.ctx.registry.events, &id, patch).await
}

async fn delete_event(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    delete_in::<ChurchEvent>(&state.ctx.registry.events, &id).await
}

/// GET /api/finance?type=
async fn list_finance(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let kind = match parse_filter::<FinanceType>(query.kind.as_deref()) {
        Ok(k) => k,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e),
    };
    match state.ctx.registry.finance.all().await {
        Ok(records) => respond(StatusCode::OK, filter_finance(&records, kind)),
        Err(e) => store_error(e),
    }
}

async fn create_finance(
    State(state): State<AppState>,
    Json(new): Json<NewFinanceRecord>,
) -> Response {
    create_in(&state.ctx.registry.finance, new).await
}

async fn update_finance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<FinanceRecordPatch>,
) -> Response {
    update_in::<FinanceRecord>(&state.ctx.registry.finance, &id, patch).await
}

async fn delete_finance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    delete_in::<FinanceRecord>(&state.ctx.registry.finance, &id).await
}

/// GET /api/finance/summary
async fn finance_summary(State(state): State<AppState>) -> Response {
    match state.ctx.registry.finance.all().await {
        Ok(records) => respond(StatusCode::OK, FinanceSummary::from_records(&records)),
        Err(e) => store_error(e),
    }
}

/// GET /api/finance/categories?type= - both lists when no type is given
async fn finance_categories(Query(query): Query<ListQuery>) -> Response {
    match parse_filter::<FinanceType>(query.kind.as_deref()) {
        Ok(Some(kind)) => respond(StatusCode::OK, categories_for(kind)),
        Ok(None) => {
            let all: Vec<&str> = INCOME_CATEGORIES
                .iter()
                .chain(EXPENSE_CATEGORIES.iter())
                .copied()
                .collect();
            respond(StatusCode::OK, all)
        }
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the `/api` router.
///
/// The API is single-session: the gate asks the shared authenticator whether
/// anyone is signed in, so after one client logs in every client passes
/// until someone logs out.
pub fn router(ctx: Arc<ChurchContext>) -> Router {
    let state = AppState { ctx };

    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/members", get(list_members).post(create_member))
        .route("/members/:id", patch(update_member).delete(delete_member))
        .route("/events", get(list_events).post(create_event))
        .route("/events/:id", patch(update_event).delete(delete_event))
        .route("/finance", get(list_finance).post(create_finance))
        .route("/finance/summary", get(finance_summary))
        .route("/finance/categories", get(finance_categories))
        .route("/finance/:id", patch(update_finance).delete(delete_finance))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session))
        .merge(protected)
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}
