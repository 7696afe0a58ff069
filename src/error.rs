use thiserror::Error;

/// Why a feed could not be turned into entries.
///
/// Every variant is recoverable: the caller shows fallback entries and uses
/// the `Display` text as the advisory note.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Conversion service unreachable (DNS, connect, TLS, timeout)
    #[error("Network response was not ok. Could not reach content feed.")]
    Network(#[source] reqwest::Error),
    /// Conversion service answered with a non-2xx status
    #[error("Network response was not ok. Could not reach content feed.")]
    HttpStatus(u16),
    /// Body is not a JSON envelope
    #[error("The content feed returned a malformed response.")]
    Decode(#[source] reqwest::Error),
    /// Envelope status is not "ok", or it carries no items
    #[error("{0}")]
    Envelope(String),
}

impl FeedError {
    /// Transport-level failure, as opposed to a bad envelope.
    pub fn is_network(&self) -> bool {
        matches!(self, FeedError::Network(_) | FeedError::HttpStatus(_))
    }
}

/// Outcome of a newsletter signup that did not produce a new subscriber.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    /// The address is already on the list; not a failure from the visitor's view
    #[error("You are already subscribed!")]
    AlreadySubscribed,
    /// Subscriber table is missing; the store was never initialized
    #[error("Database table not found. Please run the migration first.")]
    TableMissing,
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for SubscribeError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return SubscribeError::AlreadySubscribed;
            }
            let message = db_err.message();
            if message.contains("no such table")
                || (message.contains("relation") && message.contains("does not exist"))
            {
                return SubscribeError::TableMissing;
            }
        }
        SubscribeError::Database(err)
    }
}
