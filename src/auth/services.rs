use std::{future::Future, sync::Arc, time::Duration};

use lazy_static::lazy_static;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    errors::{AuthError, StoreError},
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::NewUser,
    token::TokenIssuer,
};

pub const MIN_PASSWORD_LEN: usize = 6;
/// Longest deliverable address.
pub const MAX_EMAIL_LEN: usize = 254;
/// Width of the name columns.
pub const MAX_NAME_LEN: usize = 255;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// `min_password_len` applies to registration only; login accepts any
/// non-empty password so a short wrong password is just wrong credentials.
fn validate_credentials(
    email: &str,
    password: &str,
    min_password_len: usize,
) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::InvalidInput("email is required".into()));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(AuthError::InvalidInput(format!(
            "email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }
    if !is_valid_email(email) {
        return Err(AuthError::InvalidInput("invalid email".into()));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".into()));
    }
    if password.chars().count() < min_password_len {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {min_password_len} characters"
        )));
    }
    Ok(())
}

fn validate_names(first_name: Option<&str>, last_name: Option<&str>) -> Result<(), AuthError> {
    for (field, value) in [("first_name", first_name), ("last_name", last_name)] {
        if value.is_some_and(|v| v.chars().count() > MAX_NAME_LEN) {
            return Err(AuthError::InvalidInput(format!(
                "{field} must be at most {MAX_NAME_LEN} characters"
            )));
        }
    }
    Ok(())
}

/// Register, login and lookup on top of a [`UserStore`].
///
/// Holds no mutable state; share it behind an `Arc`. Every store call races
/// the caller's cancellation token and the store timeout, and either one
/// turns the call into [`AuthError::Cancelled`].
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenIssuer, store_timeout: Duration) -> Self {
        Self {
            store,
            tokens,
            store_timeout,
        }
    }

    async fn guarded<T, F>(
        &self,
        cancel: &CancellationToken,
        op: &'static str,
        call: F,
    ) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(op, "store call cancelled by caller");
                return Err(AuthError::Cancelled);
            }
            res = tokio::time::timeout(self.store_timeout, call) => res,
        };
        // store implementations log their own failures
        match outcome {
            Ok(res) => res.map_err(AuthError::from),
            Err(_) => {
                warn!(op, timeout_ms = self.store_timeout.as_millis() as u64, "store call timed out");
                Err(AuthError::Cancelled)
            }
        }
    }

    /// Create an account and hand back a token for it.
    #[instrument(skip(self, cancel, input), fields(email = %input.email))]
    pub async fn register(
        &self,
        cancel: &CancellationToken,
        input: RegisterRequest,
    ) -> Result<AuthResponse, AuthError> {
        validate_credentials(&input.email, &input.password, MIN_PASSWORD_LEN)
            .and_then(|()| validate_names(input.first_name.as_deref(), input.last_name.as_deref()))
            .inspect_err(|e| {
                warn!(reason = %e, "registration rejected");
            })?;

        let existing = self
            .guarded(cancel, "find_by_email", self.store.find_by_email(&input.email))
            .await?;
        if existing.is_some() {
            warn!("registration failed: user already exists");
            return Err(AuthError::AlreadyExists);
        }

        let new_user = NewUser {
            password_hash: hash_password(&input.password),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
        };

        // The lookup above is advisory; a concurrent insert surfaces here as
        // a uniqueness violation.
        let user = self
            .guarded(cancel, "insert", self.store.insert(new_user))
            .await
            .inspect_err(|e| {
                if matches!(e, AuthError::AlreadyExists) {
                    warn!("registration lost race on email");
                }
            })?;

        let issued = self.tokens.issue(user.id);
        info!(user_id = %user.id, "user registered");
        Ok(AuthResponse::new(issued, user))
    }

    /// Check credentials. Unknown email and wrong password are the same error.
    #[instrument(skip(self, cancel, input), fields(email = %input.email))]
    pub async fn login(
        &self,
        cancel: &CancellationToken,
        input: LoginRequest,
    ) -> Result<AuthResponse, AuthError> {
        validate_credentials(&input.email, &input.password, 1).inspect_err(|e| {
            warn!(reason = %e, "login rejected");
        })?;

        let Some(user) = self
            .guarded(cancel, "find_by_email", self.store.find_by_email(&input.email))
            .await?
        else {
            warn!("login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&input.password, &user.password_hash) {
            warn!(user_id = %user.id, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(user.id);
        info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse::new(issued, user))
    }

    /// Look up a live user. No token is required or checked.
    #[instrument(skip(self, cancel))]
    pub async fn get_by_id(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> Result<PublicUser, AuthError> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            debug!("id is not a uuid");
            return Err(AuthError::NotFound);
        };

        match self
            .guarded(cancel, "find_by_id", self.store.find_by_id(uuid))
            .await?
        {
            Some(user) => Ok(user.into()),
            None => {
                warn!("user not found");
                Err(AuthError::NotFound)
            }
        }
    }
}
