// ABOUTME: Brightspace token database operations
// ABOUTME: One-row-per-user storage with upsert and lookup

use super::Database;
use crate::models::ProviderToken;
use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the `provider_tokens` table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_provider_tokens(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS provider_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                token_type TEXT NOT NULL DEFAULT 'Bearer',
                expires_at DATETIME,
                scope TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_provider_tokens_user ON provider_tokens(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a token record, replacing any existing row for the same user
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn upsert_provider_token(&self, token: &ProviderToken) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO provider_tokens (
                id, user_id, access_token, refresh_token, token_type,
                expires_at, scope, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(user_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_type = excluded.token_type,
                expires_at = excluded.expires_at,
                scope = excluded.scope,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&token.id)
        .bind(token.user_id.to_string())
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(&token.token_type)
        .bind(token.expires_at)
        .bind(&token.scope)
        .bind(token.created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the stored Brightspace token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_provider_token(&self, user_id: Uuid) -> Result<Option<ProviderToken>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, access_token, refresh_token, token_type,
                   expires_at, scope, created_at, updated_at
            FROM provider_tokens
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(
            || Ok(None),
            |row| Ok(Some(Self::row_to_provider_token(&row)?)),
        )
    }

    /// Convert a database row to a `ProviderToken`
    fn row_to_provider_token(row: &sqlx::sqlite::SqliteRow) -> Result<ProviderToken> {
        let user_id_str: String = row.get("user_id");

        Ok(ProviderToken {
            id: row.get("id"),
            user_id: Uuid::parse_str(&user_id_str)?,
            access_token: row.get("access_token"),
            refresh_token: row.get("refresh_token"),
            token_type: row.get("token_type"),
            expires_at: row.get("expires_at"),
            scope: row.get::<Option<String>, _>("scope"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
