use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::{Query, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use fable_types::api::{AuthForm, Claims, NextQuery};

use crate::error::ApiError;
use crate::flash;
use crate::state::AppState;

const SESSION_DAYS: i64 = 30;

/// POST /auth — one form, two branches, selected by `form_type`.
pub async fn submit(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<AuthForm>,
) -> Result<Response, ApiError> {
    match form.form_type.as_str() {
        "register" => register(&state, form),
        "login" => login(&state, form, query.next),
        _ => Ok(Redirect::to("/auth").into_response()),
    }
}

fn register(state: &AppState, form: AuthForm) -> Result<Response, ApiError> {
    let Some(username) = form.username.filter(|u| !u.trim().is_empty()) else {
        return Ok(flash_redirect("/auth", "error", "Username is required."));
    };

    if state.db.get_user_by_email(&form.email)?.is_some() {
        return Ok(flash_redirect("/auth", "error", "Email already exists."));
    }

    // Salted Argon2id hash; the plaintext is never stored.
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    state.db.create_user(
        &Uuid::new_v4().to_string(),
        &username,
        &form.email,
        &password_hash,
    )?;

    Ok(flash_redirect(
        "/auth",
        "success",
        "Registration successful! Please log in.",
    ))
}

fn login(state: &AppState, form: AuthForm, next: Option<String>) -> Result<Response, ApiError> {
    let Some(user) = state.db.get_user_by_email(&form.email)? else {
        return Ok(flash_redirect("/auth", "error", "Invalid email or password."));
    };

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash unreadable: {e}"))?;

    if Argon2::default()
        .verify_password(form.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok(flash_redirect("/auth", "error", "Invalid email or password."));
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {e}", user.id))?;
    let token = create_token(&state.session_secret, user_id, &user.username)?;

    let cookie = format!(
        "session={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        token,
        chrono::Duration::days(SESSION_DAYS).num_seconds()
    );

    let target = next.unwrap_or_else(|| "/dashboard".to_string());
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

/// GET /logout — clears the identity unconditionally.
pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([
            (
                header::SET_COOKIE,
                "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0".to_string(),
            ),
            (header::SET_COOKIE, flash::set("success", "You have been logged out.")),
        ]),
        Redirect::to("/"),
    )
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub(crate) fn flash_redirect(target: &str, category: &str, message: &str) -> Response {
    (
        [(header::SET_COOKIE, flash::set(category, message))],
        Redirect::to(target),
    )
        .into_response()
}
