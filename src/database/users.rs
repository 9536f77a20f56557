// ABOUTME: User account database operations
// ABOUTME: Handles OAuth-driven upserts, lookups, and row mapping for users

use super::Database;
use crate::models::User;
use crate::oauth::TokenData;
use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                brightspace_user_id TEXT UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_verified BOOLEAN NOT NULL DEFAULT 0,
                preferences TEXT NOT NULL DEFAULT '{}',
                timezone TEXT NOT NULL DEFAULT 'America/Toronto',
                language TEXT NOT NULL DEFAULT 'en',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                last_login_at DATETIME
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_brightspace_id ON users(brightspace_user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a completed Brightspace login: upsert the user row and store
    /// the token pair, both in a single transaction.
    ///
    /// The upsert is keyed on the Brightspace user id; a row that matches on
    /// email instead (an account created before it was linked) is linked in
    /// place. Two concurrent first logins for the same identity therefore
    /// converge on one row, and a token is never stored without its user.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails or a uniqueness constraint
    /// other than the conflict targets is violated.
    pub async fn record_oauth_login(&self, candidate: &User, token: &TokenData) -> Result<User> {
        let now = Utc::now();
        let preferences = serde_json::to_string(&candidate.preferences)?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r"
            INSERT INTO users (
                id, email, display_name, brightspace_user_id, is_active, is_verified,
                preferences, timezone, language, created_at, updated_at, last_login_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $10)
            ON CONFLICT(brightspace_user_id) DO UPDATE SET
                email = excluded.email,
                display_name = COALESCE(excluded.display_name, users.display_name),
                is_verified = 1,
                updated_at = excluded.updated_at,
                last_login_at = excluded.last_login_at
            ON CONFLICT(email) DO UPDATE SET
                brightspace_user_id = excluded.brightspace_user_id,
                display_name = COALESCE(excluded.display_name, users.display_name),
                is_verified = 1,
                updated_at = excluded.updated_at,
                last_login_at = excluded.last_login_at
            RETURNING id, email, display_name, brightspace_user_id, is_active, is_verified,
                      preferences, timezone, language, created_at, updated_at, last_login_at
            ",
        )
        .bind(candidate.id.to_string())
        .bind(&candidate.email)
        .bind(&candidate.display_name)
        .bind(&candidate.brightspace_user_id)
        .bind(candidate.is_active)
        .bind(candidate.is_verified)
        .bind(preferences)
        .bind(&candidate.timezone)
        .bind(&candidate.language)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let user = Self::row_to_user(&row)?;

        sqlx::query(
            r"
            INSERT INTO provider_tokens (
                id, user_id, access_token, refresh_token, token_type,
                expires_at, scope, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT(user_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = COALESCE(excluded.refresh_token, provider_tokens.refresh_token),
                token_type = excluded.token_type,
                expires_at = excluded.expires_at,
                scope = excluded.scope,
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user.id.to_string())
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(&token.token_type)
        .bind(token.expires_at)
        .bind(&token.scope)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_impl("email", email).await
    }

    /// Get a user by their Brightspace identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_brightspace_id(&self, brightspace_id: &str) -> Result<Option<User>> {
        self.get_user_impl("brightspace_user_id", brightspace_id)
            .await
    }

    /// One lookup shared by the id, email and provider-id getters.
    /// `field` is always a compile-time column name, never user input.
    async fn get_user_impl(&self, field: &str, value: &str) -> Result<Option<User>> {
        let query = format!(
            r"
            SELECT id, email, display_name, brightspace_user_id, is_active, is_verified,
                   preferences, timezone, language, created_at, updated_at, last_login_at
            FROM users WHERE {field} = $1
            "
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_user(&row)?)))
    }

    /// Map a row onto [`User`]; unreadable preferences decay to `{}`
    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id: String = row.get("id");
        let preferences_json: String = row.get("preferences");
        let preferences = serde_json::from_str(&preferences_json)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));

        Ok(User {
            id: Uuid::parse_str(&id)?,
            email: row.get("email"),
            display_name: row.get("display_name"),
            brightspace_user_id: row.get("brightspace_user_id"),
            is_active: row.get("is_active"),
            is_verified: row.get("is_verified"),
            preferences,
            timezone: row.get("timezone"),
            language: row.get("language"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            last_login_at: row.get("last_login_at"),
        })
    }
}
