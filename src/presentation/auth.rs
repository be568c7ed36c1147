use crate::domain::user::{LoginRequest, Session, SessionUser, SignupRequest};
use crate::presentation::error::ApiError;
use crate::presentation::handlers::AppState;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponse, web};
use serde::Serialize;
use std::future::{Ready, ready};
use tracing::{info, instrument};

pub const SESSION_COOKIE: &str = "session";

#[derive(Serialize)]
struct UserBody {
    email: String,
}

#[derive(Serialize)]
struct AuthResponse {
    ok: bool,
    user: UserBody,
}

#[derive(Serialize)]
struct MeUserBody {
    id: i64,
    email: String,
}

#[derive(Serialize)]
struct MeResponse {
    ok: bool,
    user: MeUserBody,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    ok: bool,
    message: String,
}

/// Extractor that only succeeds for requests carrying a valid session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_current_user(req))
    }
}

fn resolve_current_user(req: &HttpRequest) -> Result<CurrentUser, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("Application state missing".to_string()))?;
    let cookie = req.cookie(SESSION_COOKIE);
    let user = state
        .auth_service
        .current_user(cookie.as_ref().map(|c| c.value()))?;
    Ok(CurrentUser(user))
}

fn session_cookie(token: String, secure: bool, ttl_secs: u64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(CookieDuration::seconds(
        i64::try_from(ttl_secs).unwrap_or(i64::MAX),
    ));
    cookie
}

fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.make_removal();
    cookie
}

fn session_response(state: &AppState, session: Session) -> HttpResponse {
    let cookie = session_cookie(
        session.token,
        state.cookie_secure,
        state.auth_service.session_ttl_secs(),
    );
    HttpResponse::Ok().cookie(cookie).json(AuthResponse {
        ok: true,
        user: UserBody {
            email: session.user.email,
        },
    })
}

// Unparseable bodies are treated like empty ones and fail validation.
#[instrument(skip(state, req))]
pub async fn signup(
    state: web::Data<AppState>,
    req: Option<web::Json<SignupRequest>>,
) -> Result<HttpResponse, ApiError> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    let session = state.auth_service.signup(req).await?;
    info!(user_id = session.user.user_id, "Signup completed, session issued");
    Ok(session_response(&state, session))
}

#[instrument(skip(state, req))]
pub async fn login(
    state: web::Data<AppState>,
    req: Option<web::Json<LoginRequest>>,
) -> Result<HttpResponse, ApiError> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    let session = state.auth_service.login(req).await?;
    info!(user_id = session.user.user_id, "Login completed, session issued");
    Ok(session_response(&state, session))
}

/// Always succeeds, with or without a session.
#[instrument(skip(state))]
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(state.cookie_secure))
        .json(OkResponse { ok: true })
}

pub async fn me(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        ok: true,
        user: MeUserBody {
            id: user.0.user_id,
            email: user.0.email,
        },
    })
}

pub async fn secure_ping(_user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        ok: true,
        message: "pong (secure)".to_string(),
    })
}
