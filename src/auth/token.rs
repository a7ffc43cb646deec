use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::debug;
use uuid::Uuid;

/// Fixed header segment every bearer token starts with.
pub const TOKEN_HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.";

/// Bearer token handed back on register / login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Maps a user id to an opaque bearer string.
///
/// Tokens are `TOKEN_HEADER` followed by the hyphenated user id. They are not
/// signed and nothing in the crate parses them back; `expires_at` is
/// informational.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_minutes(ttl_minutes: i64) -> Self {
        Self::new(Duration::seconds(ttl_minutes.saturating_mul(60)))
    }

    /// An expiry past the representable range is clamped to the latest
    /// representable instant.
    pub fn issue(&self, user_id: Uuid) -> IssuedToken {
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(self.ttl)
            .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc());
        debug!(user_id = %user_id, "token issued");
        IssuedToken {
            token: format!("{TOKEN_HEADER}{user_id}"),
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_embeds_user_id_after_header() {
        let issuer = TokenIssuer::from_minutes(5);
        let user_id = Uuid::new_v4();
        let issued = issuer.issue(user_id);
        assert!(issued.token.starts_with(TOKEN_HEADER));
        assert_eq!(&issued.token[TOKEN_HEADER.len()..], user_id.to_string());
    }

    #[test]
    fn token_is_deterministic_per_user() {
        let issuer = TokenIssuer::from_minutes(5);
        let user_id = Uuid::new_v4();
        assert_eq!(issuer.issue(user_id).token, issuer.issue(user_id).token);
        assert_ne!(issuer.issue(user_id).token, issuer.issue(Uuid::new_v4()).token);
    }

    #[test]
    fn expiry_follows_ttl() {
        let issuer = TokenIssuer::from_minutes(60);
        let before = OffsetDateTime::now_utc();
        let issued = issuer.issue(Uuid::new_v4());
        let after = OffsetDateTime::now_utc();
        assert!(issued.expires_at >= before + Duration::minutes(60));
        assert!(issued.expires_at <= after + Duration::minutes(60));
    }

    #[test]
    fn huge_ttl_saturates_instead_of_panicking() {
        let issued = TokenIssuer::from_minutes(i64::MAX).issue(Uuid::new_v4());
        assert_eq!(issued.expires_at, PrimitiveDateTime::MAX.assume_utc());

        let issued = TokenIssuer::from_minutes(10_000_000_000).issue(Uuid::new_v4());
        assert!(issued.expires_at > OffsetDateTime::now_utc());
    }
}
