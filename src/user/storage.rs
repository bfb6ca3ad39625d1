//! Database helpers for the `users` table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::types::User;
use crate::store::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact match on an already-normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn insert_user(&self, user: &User) -> Result<User>;

    async fn delete_user(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = "SELECT id, email, name FROM users WHERE email = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(self.pool())
            .instrument(span)
            .await
            .context("failed to lookup user by email")?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
        }))
    }

    async fn insert_user(&self, user: &User) -> Result<User> {
        let query = r"
            INSERT INTO users (id, email, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, name
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.name)
            .fetch_one(self.pool())
            .instrument(span)
            .await
            .context("failed to insert user")?;

        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
        })
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let query = "DELETE FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(self.pool())
            .instrument(span)
            .await
            .context("failed to delete user")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("user {id} not found");
        }

        Ok(())
    }
}
