use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest, Session, TokenResponse, User};
use crate::settings::Settings;
use crate::store::Store;
use crate::validation::validate_registration;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn is_admin(settings: &Settings, session: &Session) -> bool {
    session.username == settings.admin_username
}

pub fn require_admin(settings: &Settings, session: &Session) -> Result<(), ApiError> {
    if is_admin(settings, session) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".into()))
    }
}

fn provided_token(auth: Option<Authorization<Bearer>>, query_token: Option<&str>) -> Option<String> {
    auth.map(|a| a.token().to_string())
        .or_else(|| query_token.map(|s| s.to_string()))
}

/// Resolve the session for a bearer header or `?token=` query value.
pub async fn verify_token(
    store: &dyn Store,
    auth: Option<Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<Session, ApiError> {
    let Some(token) = provided_token(auth, query_token) else {
        return Err(ApiError::Unauthorized("Login required".into()));
    };
    store
        .find_session(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid authentication token".into()))
}

/// Like [`verify_token`] but anonymous requests yield `None`.
pub async fn optional_session(
    store: &dyn Store,
    auth: Option<Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<Option<Session>, ApiError> {
    match provided_token(auth, query_token) {
        Some(token) => Ok(store.find_session(&token).await?),
        None => Ok(None),
    }
}

async fn start_session(state: &AppState, username: &str) -> Result<TokenResponse, ApiError> {
    let session = Session {
        token: Uuid::new_v4().simple().to_string(),
        username: username.to_string(),
        created_at: Utc::now(),
    };
    state.store.insert_session(&session).await?;
    Ok(TokenResponse {
        is_admin: is_admin(&state.settings, &session),
        token: session.token,
        username: session.username,
    })
}

pub async fn login(state: &AppState, request: LoginRequest) -> Result<TokenResponse, ApiError> {
    let Some(user) = state.store.find_user(&request.identifier).await? else {
        debug!(identifier = %request.identifier, "login for unknown user");
        return Err(ApiError::Unauthorized("User not found".into()));
    };
    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Incorrect password".into()));
    }
    info!(username = %user.username, "user logged in");
    start_session(state, &user.username).await
}

pub async fn register(
    state: &AppState,
    request: RegisterRequest,
) -> Result<TokenResponse, ApiError> {
    validate_registration(&request)?;

    for identifier in [&request.username, &request.email] {
        if state.store.find_user(identifier).await?.is_some() {
            return Err(ApiError::Conflict("Username or email already exists".into()));
        }
    }

    let user = User {
        password_hash: hash_password(&request.password)?,
        username: request.username,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
    };
    state.store.insert_user(&user).await?;
    info!(username = %user.username, "user registered");
    start_session(state, &user.username).await
}

pub async fn logout(state: &AppState, session: &Session) -> Result<(), ApiError> {
    state.store.delete_session(&session.token).await?;
    info!(username = %session.username, "user logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::test_state;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("password").unwrap();
        assert!(verify_password("password", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("password", "not_a_valid_hash"));
    }

    #[tokio::test]
    async fn test_verify_token_header() {
        let store = MemoryStore::new();
        let session = Session {
            token: "secret".to_string(),
            username: "ada".to_string(),
            created_at: Utc::now(),
        };
        store.insert_session(&session).await.unwrap();

        let auth = Authorization::bearer("secret").unwrap();
        let resolved = verify_token(&store, Some(auth), None).await.unwrap();
        assert_eq!(resolved.username, "ada");
    }

    #[tokio::test]
    async fn test_verify_token_query() {
        let store = MemoryStore::new();
        let session = Session {
            token: "secret".to_string(),
            username: "ada".to_string(),
            created_at: Utc::now(),
        };
        store.insert_session(&session).await.unwrap();

        assert!(verify_token(&store, None, Some("secret")).await.is_ok());
        assert!(matches!(
            verify_token(&store, None, Some("bad")).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            verify_token(&store, None, None).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(optional_session(&store, None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_login_logout() {
        let state = test_state().await;
        let registered = register(
            &state,
            RegisterRequest {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                password: "s3cret".to_string(),
                confirm_password: "s3cret".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(!registered.is_admin);

        let bad = login(
            &state,
            LoginRequest {
                identifier: "ada@example.com".to_string(),
                password: "nope".to_string(),
            },
        )
        .await;
        assert!(matches!(bad, Err(ApiError::Unauthorized(msg)) if msg == "Incorrect password"));

        let token = login(
            &state,
            LoginRequest {
                identifier: "ada@example.com".to_string(),
                password: "s3cret".to_string(),
            },
        )
        .await
        .unwrap();
        let session = state.store.find_session(&token.token).await.unwrap().unwrap();
        logout(&state, &session).await.unwrap();
        assert!(state.store.find_session(&token.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_session() {
        let state = test_state().await;
        let token = login(
            &state,
            LoginRequest {
                identifier: "admin".to_string(),
                password: "password".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(token.is_admin);

        let session = state.store.find_session(&token.token).await.unwrap().unwrap();
        assert!(require_admin(&state.settings, &session).is_ok());

        let guest = Session {
            username: "ada".to_string(),
            ..session
        };
        assert!(matches!(
            require_admin(&state.settings, &guest),
            Err(ApiError::Forbidden(_))
        ));
    }
}
