use super::{save, ApiJson};
use crate::auth::{hash_password, verify_password, AuthUser};
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::models::{new_id, User, UserProfile};
use crate::state::AppState;
use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_ascii_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'));
    if !valid {
        return Err(AppError::bad_request("Invalid email address"));
    }
    Ok(email)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let (Some(name), Some(email), Some(password)) = (
        required(payload.name),
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request("Name, email and password are required"));
    };

    let email = normalize_email(&email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(AppError::internal)??;

    let mut data = state.data.lock().await;
    if data.user_by_email(&email).is_some() {
        return Err(AppError::bad_request("Email is already registered"));
    }

    let user = User {
        id: new_id(),
        email,
        password_hash,
        name,
        avatar: None,
        facebook_id: None,
        created_at: Utc::now(),
    };
    let profile = UserProfile::from(&user);
    data.users.insert(user.id.clone(), user);
    save(&state, &data).await?;
    drop(data);

    info!(user_id = %profile.id, "registered user");
    let token = state.tokens.issue(&profile.id, false)?;
    Ok(ApiResponse::created(AuthResponse { token, user: profile })
        .with_message("Registration successful"))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let (Some(email), Some(password)) = (required(payload.email), payload.password) else {
        return Err(AppError::bad_request("Email and password are required"));
    };
    let email = email.to_ascii_lowercase();

    let (profile, password_hash) = {
        let data = state.data.lock().await;
        match data.user_by_email(&email) {
            Some(user) => (UserProfile::from(user), user.password_hash.clone()),
            None => return Err(AppError::unauthorized("Invalid email or password")),
        }
    };

    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(AppError::internal)?;
    if !matches {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let token = state.tokens.issue(&profile.id, payload.remember_me)?;
    info!(user_id = %profile.id, remember_me = payload.remember_me, "user logged in");
    Ok(ApiResponse::ok(AuthResponse { token, user: profile }).with_message("Login successful"))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let data = state.data.lock().await;
    let profile = data
        .users
        .get(&user.user_id)
        .map(UserProfile::from)
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(ApiResponse::ok(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email(" T@X.com ").unwrap(), "t@x.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["", "t", "@x.com", "t@x", "t@x."] {
            assert!(normalize_email(email).is_err(), "{email} accepted");
        }
    }

    #[test]
    fn blank_fields_count_as_missing() {
        assert_eq!(required(Some("  ".to_string())), None);
        assert_eq!(required(Some(" T ".to_string())), Some("T".to_string()));
    }
}
