// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! SQLite-backed storage for user accounts and their Brightspace tokens.
//! Schema setup is idempotent so the server can run migrations on every
//! start without coordination.

mod tokens;
mod users;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// SQLite-backed store for user accounts and provider tokens
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a connection pool to the given database
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub async fn new(database_url: &str) -> Result<Self> {
        // rwc mode so SQLite creates the file on first open
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        Ok(Self { pool })
    }

    /// Direct pool access, for transactions composed at a higher level
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_provider_tokens().await?;

        Ok(())
    }
}
