//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use recipebox_common::{AppError, AppResult};
use recipebox_db::{entities::user, repositories::UserRepository};
use sea_orm::{NotSet, Set};
use serde::Deserialize;
use validator::Validate;

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninInput {
    #[validate(length(min = 1, max = 256))]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Register a new account. The returned model carries its bearer token.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: NotSet,
            name: Set(input.name),
            email: Set(email),
            avatar_url: Set(None),
            is_admin: Set(false),
            password_hash: Set(password_hash),
            token: Set(Some(generate_token())),
            created_at: Set(Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and return the user with a usable token.
    pub async fn signin(&self, input: SigninInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if user.token.is_some() {
            return Ok(user);
        }

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(generate_token()));
        self.user_repo.update(active).await
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: i64) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Delete a user account (administrators only). Everything the user
    /// owns is removed by cascade.
    pub async fn delete_user(&self, actor: &user::Model, id: i64) -> AppResult<()> {
        if !actor.is_admin {
            return Err(AppError::Forbidden("Administrator only".to_string()));
        }

        if !self.user_repo.delete(id).await? {
            return Err(AppError::UserNotFound(id.to_string()));
        }

        tracing::info!(user_id = id, deleted_by = actor.id, "User deleted");
        Ok(())
    }
}

/// Generate an opaque bearer token.
fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
