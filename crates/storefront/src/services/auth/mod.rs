//! Authentication service.
//!
//! Password signup and login, durable API tokens, password reset and
//! federated Google sign-in.

mod error;
pub mod google;
pub mod reset;

pub use error::AuthError;
pub use google::{GoogleTokenInfoVerifier, IdTokenVerifier, IdentityError, VerifiedIdentity};
pub use reset::ResetTokenGenerator;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sqlx::PgPool;

use ojasritu_core::{Email, UserId};

use super::StepOutcome;
use crate::db::RepositoryError;
use crate::db::tokens::TokenRepository;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of an API token key in hex characters.
const TOKEN_BYTES: usize = 20;

/// Signup form.
#[derive(Debug, Clone, Default)]
pub struct SignupInput<'r> {
    pub email: &'r str,
    pub password: &'r str,
    pub password_confirm: &'r str,
    pub first_name: &'r str,
}

/// Reset form.
#[derive(Debug, Clone, Default)]
pub struct ResetInput<'r> {
    pub uid: &'r str,
    pub token: &'r str,
    pub password: &'r str,
    pub password_confirm: &'r str,
}

/// A minted reset link for a user.
#[derive(Debug, Clone)]
pub struct ResetLink {
    pub user: User,
    pub uid: String,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new user. The lowercased email becomes the username.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if email or password is empty.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is registered.
    pub async fn signup(&self, input: &SignupInput<'_>) -> Result<User, AuthError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if input.password != input.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let email = Email::parse(input.email)?;
        validate_password(input.password)?;

        if self.users.get_by_username(email.as_str()).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(input.password)?;

        let user = self
            .users
            .create(&NewUser {
                username: email.as_str().to_string(),
                email: email.into_inner(),
                first_name: input.first_name.trim().to_string(),
                last_name: String::new(),
                password_hash: Some(password_hash),
                is_staff: false,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with a username or email and a password.
    ///
    /// The identifier is lowercased and tried as a username first, then as
    /// an email address.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no active user matches.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = identifier.trim().to_lowercase();
        if identifier.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = match self.users.get_by_username(&identifier).await? {
            Some(user) => Some(user),
            None if identifier.contains('@') => self.users.get_by_email(&identifier).await?,
            None => None,
        };

        let user = user
            .filter(|u| u.is_active)
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, hash)?;
        Ok(user)
    }

    /// Stamp the user's last login time.
    pub async fn record_login(&self, user_id: UserId) -> StepOutcome {
        StepOutcome::from_result("record_login", self.users.touch_last_login(user_id).await)
    }

    // =========================================================================
    // API Tokens
    // =========================================================================

    /// Return the user's API token, creating one if needed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn issue_token(&self, user_id: UserId) -> Result<String, AuthError> {
        let candidate = hex::encode(rand::random::<[u8; TOKEN_BYTES]>());
        Ok(self.tokens.get_or_create(user_id, &candidate).await?)
    }

    /// Delete the user's API token.
    pub async fn revoke_token(&self, user_id: UserId) -> StepOutcome {
        StepOutcome::from_result("revoke_token", self.tokens.delete_for_user(user_id).await)
    }

    /// Resolve an API token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn user_for_token(&self, key: &str) -> Result<Option<User>, AuthError> {
        Ok(self.tokens.find_user(key).await?)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Mint a reset link for the account with this email.
    ///
    /// Returns `None` for unknown emails and for accounts without a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn password_reset_link(
        &self,
        email: &str,
        generator: &ResetTokenGenerator,
    ) -> Result<Option<ResetLink>, AuthError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Ok(None);
        }

        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };
        if !user.is_active || user.password_hash.is_none() {
            return Ok(None);
        }

        let Some(token) = generator.make_token(&user, Utc::now()) else {
            return Ok(None);
        };

        Ok(Some(ResetLink {
            uid: ResetTokenGenerator::encode_uid(user.id),
            token,
            user,
        }))
    }

    /// Set a new password from a reset link and revoke the user's API tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields`, `AuthError::PasswordMismatch`,
    /// `AuthError::InvalidResetLink`, `AuthError::InvalidResetToken` or
    /// `AuthError::WeakPassword` for invalid input.
    pub async fn reset_password(
        &self,
        input: &ResetInput<'_>,
        generator: &ResetTokenGenerator,
    ) -> Result<User, AuthError> {
        if input.uid.is_empty() || input.token.is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if input.password != input.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let user_id = ResetTokenGenerator::decode_uid(input.uid).ok_or(AuthError::InvalidResetLink)?;
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidResetLink)?;

        if !generator.check_token(&user, input.token, Utc::now()) {
            return Err(AuthError::InvalidResetToken);
        }

        validate_password(input.password)?;
        let password_hash = hash_password(input.password)?;
        self.users.set_password(user.id, &password_hash).await?;

        Ok(user)
    }

    // =========================================================================
    // Federated Sign-in
    // =========================================================================

    /// Create or refresh the account for a verified Google identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn federated_login(&self, identity: &VerifiedIdentity) -> Result<User, AuthError> {
        let user = self
            .users
            .upsert_federated(&identity.email, &identity.given_name, &identity.family_name)
            .await?;
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }

    // =========================================================================
    // Staff Accounts
    // =========================================================================

    /// Create a staff account with a password. Used by the CLI.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::UserAlreadyExists`.
    pub async fn create_staff(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&NewUser {
                username: username.trim().to_lowercase(),
                email: email.into_inner(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: Some(password_hash),
                is_staff: true,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("tulsi-and-ginger").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("tulsi-and-ginger", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("exactly8").is_ok());
        // Counted in characters, not bytes
        assert!(validate_password("अश्वगंधा").is_ok());
    }
}
