//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A login session. The id is the bearer token carried in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    /// Fixed at creation, never extended
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// New session for `user_id` with a fresh random token.
    pub fn issue(user_id: i64, now: DateTime<Utc>, ttl: Duration) -> anyhow::Result<Self> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow::anyhow!("Session lifetime {} is out of range", ttl))?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at,
            created_at: now,
        })
    }

    /// A session stops being valid at the instant it reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_sets_expiry_from_ttl() {
        let now = Utc::now();
        let session = Session::issue(7, now, Duration::hours(24)).unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.created_at, now);
        assert_eq!(session.expires_at, now + Duration::hours(24));
        assert!(uuid::Uuid::parse_str(&session.id).is_ok());
    }

    #[test]
    fn test_issue_generates_distinct_tokens() {
        let now = Utc::now();
        let a = Session::issue(1, now, Duration::hours(1)).unwrap();
        let b = Session::issue(1, now, Duration::hours(1)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_issue_rejects_out_of_range_lifetime() {
        assert!(Session::issue(1, Utc::now(), Duration::days(365_000_000)).is_err());
    }

    #[test]
    fn test_expiry_boundary() {
        let t = Utc::now();
        let session = Session::issue(1, t, Duration::hours(24)).unwrap();

        assert!(!session.is_expired_at(t));
        assert!(!session.is_expired_at(t + Duration::hours(24) - Duration::milliseconds(1)));
        assert!(session.is_expired_at(t + Duration::hours(24)));
        assert!(session.is_expired_at(t + Duration::days(3)));
    }
}
