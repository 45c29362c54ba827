//! Authentication API handlers.
//!
//! ```text
//! POST /api/auth/login {"email":"ada@example.com","password":"..."}
//! GET  /api/auth/verify/{token}
//! ```

use actix_web::{get, web};

use crate::domain::{Error, LoginCredentials, VerificationToken};

use super::ApiResult;
use super::contacts_dto::{LoginBody, MessageResponse, TokenResponse};
use super::state::HttpState;

/// Exchange email and password for a bearer token.
///
/// Unknown emails, wrong passwords and unverified accounts all answer with
/// the same 401 message.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Incorrect email or password", body = Error),
        (status = 429, description = "Rate limit exceeded")
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginBody>,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())?;
    let token = state.auth.login(&credentials).await?;
    Ok(web::Json(TokenResponse::bearer(token.as_str())))
}

/// Confirm an email address with the token from the verification email.
#[utoipa::path(
    get,
    path = "/api/auth/verify/{token}",
    params(("token" = String, Path, description = "Verification token")),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Unknown token or already verified", body = Error)
    ),
    tags = ["auth"],
    operation_id = "verifyEmail",
    security([])
)]
#[get("/auth/verify/{token}")]
pub async fn verify_email(
    state: web::Data<HttpState>,
    token: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let token = VerificationToken::new(token.into_inner());
    state.auth.verify_email(&token).await?;
    Ok(web::Json(MessageResponse {
        message: "Email verified".to_owned(),
    }))
}
