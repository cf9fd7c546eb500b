use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::NewAccount;
use crate::errors::AppError;
use crate::AppState;

use super::blocking;
use super::extract::BearerToken;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Honoured only when the request is made by an authenticated admin.
    #[serde(default)]
    pub admin: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant form fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: &'static str,
}

impl TokenResponse {
    fn access(access_token: String) -> Self {
        Self {
            access_token,
            refresh_token: None,
            token_type: "Bearer",
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /auth
#[utoipa::path(
    get,
    path = "/auth",
    responses((status = 200, description = "Auth routes are reachable")),
    tag = "auth"
)]
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Authentication service is up",
    }))
}

/// POST /auth/signup
///
/// Creates an account. A bearer token is optional; when it belongs to an
/// admin, the `admin` flag of the new account is honoured.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Email already registered or invalid input"),
        (status = 401, description = "A bearer token was sent but is invalid"),
    ),
    tag = "auth"
)]
pub async fn signup(
    state: web::Data<AppState>,
    token: Option<BearerToken>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let account = NewAccount {
        name: body.name,
        email: body.email,
        password: body.password,
        active: body.active,
        admin: body.admin,
    };

    let user = blocking(move || {
        let caller = token
            .map(|t| state.auth.resolve_principal(t.as_str()))
            .transpose()?;
        state.auth.signup(account, caller.as_ref())
    })
    .await?;

    Ok(HttpResponse::Created().json(SignupResponse {
        message: format!("Account created for {}", user.email),
        id: user.id,
    }))
}

/// POST /auth/login
///
/// Returns an access token and a seven-day refresh token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Incorrect email or password"),
    ),
    tag = "auth"
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = body.into_inner();

    let pair = blocking(move || state.auth.login(&email, &password)).await?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: Some(pair.refresh_token),
        token_type: "Bearer",
    }))
}

/// POST /auth/login-form
///
/// Form-encoded password exchange for interactive API clients. Returns an
/// access token only.
#[utoipa::path(
    post,
    path = "/auth/login-form",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Incorrect email or password"),
    ),
    tag = "auth"
)]
pub async fn login_form(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let LoginForm { username, password } = form.into_inner();

    let access = blocking(move || state.auth.login_form(&username, &password)).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::access(access)))
}

/// GET /auth/refresh
///
/// Exchanges a refresh token (sent as the bearer token) for a new access token.
#[utoipa::path(
    get,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 401, description = "Missing, invalid or non-refresh token"),
    ),
    tag = "auth"
)]
pub async fn refresh(
    state: web::Data<AppState>,
    token: BearerToken,
) -> Result<HttpResponse, AppError> {
    let access = blocking(move || state.auth.refresh(token.as_str())).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::access(access)))
}
