use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use tracing::{error, info, warn};

use crate::error::SubscribeError;

pub const STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone, FromRow)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub source: String,
    pub status: String,
    pub subscribed_at: String,
}

/// Newsletter subscriber store.
pub struct Database {
    pool: SqlitePool,
}

/// Trim and lowercase an address, rejecting anything that is not
/// plausibly `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, SubscribeError> {
    let email = raw.trim().to_lowercase();

    let (local, domain) = email.split_once('@').ok_or(SubscribeError::InvalidEmail)?;
    let valid = !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(email)
    } else {
        Err(SubscribeError::InvalidEmail)
    }
}

fn email_domain(email: &str) -> &str {
    email.split_once('@').map(|(_, d)| d).unwrap_or("")
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Every in-memory connection is its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Connect to and initialize the subscriber store if one is configured.
    ///
    /// The store is optional, so a failure is logged and yields `None`.
    pub async fn connect_optional(database_url: Option<&str>) -> Option<Self> {
        let Some(url) = database_url else {
            warn!("No newsletter database configured, signups will be redirected");
            return None;
        };

        let db = match Self::new(url).await {
            Ok(db) => db,
            Err(e) => {
                error!("Newsletter database unavailable, signups will be redirected: {}", e);
                return None;
            }
        };
        if let Err(e) = db.initialize().await {
            error!("Failed to initialize newsletter database, signups will be redirected: {}", e);
            return None;
        }

        info!("Newsletter database initialized");
        Some(db)
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS newsletter_subscribers (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                source TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                subscribed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add an address to the list.
    ///
    /// A duplicate address yields `AlreadySubscribed`; a store that was never
    /// initialized yields `TableMissing`.
    pub async fn subscribe(&self, email: &str, source: &str) -> Result<Subscriber, SubscribeError> {
        let email = normalize_email(email)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query_as::<_, Subscriber>(
            r#"
            INSERT INTO newsletter_subscribers (email, source, status, subscribed_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&email)
        .bind(source)
        .bind(STATUS_ACTIVE)
        .bind(&now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(subscriber) => {
                info!(
                    "New subscriber from {} (domain {})",
                    source,
                    email_domain(&subscriber.email)
                );
                Ok(subscriber)
            }
            Err(e) => {
                let err = SubscribeError::from(e);
                if let SubscribeError::Database(inner) = &err {
                    error!("Failed to store subscriber: {}", inner);
                }
                Err(err)
            }
        }
    }

    pub async fn get_subscriber(&self, email: &str) -> anyhow::Result<Option<Subscriber>> {
        let subscriber = sqlx::query_as::<_, Subscriber>(
            "SELECT * FROM newsletter_subscribers WHERE email = ?",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscriber)
    }

    pub async fn subscriber_count(&self) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM newsletter_subscribers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Remove an address; returns whether it was on the list.
    pub async fn unsubscribe(&self, email: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM newsletter_subscribers WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
