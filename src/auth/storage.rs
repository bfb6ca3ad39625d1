//! Server-side storage for cookie sessions.
//!
//! Only the SHA-256 hash of the cookie token is stored; the row carries the
//! provider tokens so the session can be revoked on logout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::Row;
use tracing::{info_span, Instrument};

use super::types::AuthSession;
use crate::store::PgStore;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(
        &self,
        session_hash: &[u8],
        session: &AuthSession,
        ttl_seconds: i64,
    ) -> Result<()>;

    /// Returns `None` for unknown or expired sessions.
    async fn lookup_session(&self, session_hash: &[u8]) -> Result<Option<AuthSession>>;

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()>;

    /// Drop every session of a user, on any device.
    async fn delete_user_sessions(&self, user_id: &str) -> Result<()>;
}

const PURGE_EXPIRED_SESSIONS: &str = "DELETE FROM auth_sessions WHERE valid_until <= NOW()";

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(
        &self,
        session_hash: &[u8],
        session: &AuthSession,
        ttl_seconds: i64,
    ) -> Result<()> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = PURGE_EXPIRED_SESSIONS
        );
        sqlx::query(PURGE_EXPIRED_SESSIONS)
            .execute(self.pool())
            .instrument(span)
            .await
            .context("failed to purge expired sessions")?;

        let query = r"
            INSERT INTO auth_sessions
                (session_hash, user_id, email, access_token, refresh_token,
                 expires_in, expires_at, valid_until)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW() + ($8 * INTERVAL '1 second'))
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_hash)
            .bind(&session.user_id)
            .bind(&session.email)
            .bind(session.access_token.expose_secret())
            .bind(session.refresh_token.expose_secret())
            .bind(session.expires_in)
            .bind(session.expires_at)
            .bind(ttl_seconds)
            .execute(self.pool())
            .instrument(span)
            .await
            .context("failed to insert session")?;

        Ok(())
    }

    async fn lookup_session(&self, session_hash: &[u8]) -> Result<Option<AuthSession>> {
        let query = r"
            SELECT user_id, email, access_token, refresh_token, expires_in, expires_at
            FROM auth_sessions
            WHERE session_hash = $1 AND valid_until > NOW()
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(session_hash)
            .fetch_optional(self.pool())
            .instrument(span)
            .await
            .context("failed to lookup session")?;

        Ok(row.map(|row| AuthSession {
            access_token: SecretString::from(row.get::<String, _>("access_token")),
            refresh_token: SecretString::from(row.get::<String, _>("refresh_token")),
            user_id: row.get("user_id"),
            email: row.get("email"),
            expires_in: row.get("expires_in"),
            expires_at: row.get("expires_at"),
        }))
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()> {
        let query = "DELETE FROM auth_sessions WHERE session_hash = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_hash)
            .execute(self.pool())
            .instrument(span)
            .await
            .context("failed to delete session")?;

        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: &str) -> Result<()> {
        let query = "DELETE FROM auth_sessions WHERE user_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .execute(self.pool())
            .instrument(span)
            .await
            .context("failed to delete user sessions")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use secrecy::SecretString;

    fn auth_session(user_id: &str) -> AuthSession {
        AuthSession {
            access_token: SecretString::from("access"),
            refresh_token: SecretString::from("refresh"),
            user_id: user_id.to_string(),
            email: "alice@example.com".to_string(),
            expires_in: 3600,
            expires_at: -1,
        }
    }

    #[test]
    fn purge_only_targets_expired_rows() {
        assert!(PURGE_EXPIRED_SESSIONS.starts_with("DELETE FROM auth_sessions"));
        assert!(PURGE_EXPIRED_SESSIONS.ends_with("WHERE valid_until <= NOW()"));
    }

    #[tokio::test]
    async fn insert_session_purges_expired_rows() -> Result<()> {
        let store = MemoryStore::default();

        store
            .insert_session(b"expired", &auth_session("user-1"), 0)
            .await?;
        assert!(store.lookup_session(b"expired").await?.is_none());
        assert_eq!(store.session_count()?, 1);

        store
            .insert_session(b"fresh", &auth_session("user-1"), 60)
            .await?;
        assert_eq!(store.session_count()?, 1);
        assert!(store.lookup_session(b"fresh").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn delete_user_sessions_spares_other_users() -> Result<()> {
        let store = MemoryStore::default();
        store
            .insert_session(b"laptop", &auth_session("user-1"), 60)
            .await?;
        store
            .insert_session(b"phone", &auth_session("user-1"), 60)
            .await?;
        store
            .insert_session(b"other", &auth_session("user-2"), 60)
            .await?;

        store.delete_user_sessions("user-1").await?;

        assert_eq!(store.session_count()?, 1);
        assert!(store.lookup_session(b"other").await?.is_some());
        Ok(())
    }
}
