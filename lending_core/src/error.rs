//! Error types for the lending_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Why a reservation request was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservationRejection {
    /// The patron already holds a pending reservation for this book
    Duplicate,
    /// The patron's membership reservation limit has been reached
    LimitExceeded,
}

impl std::fmt::Display for ReservationRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationRejection::Duplicate => write!(f, "duplicate reservation"),
            ReservationRejection::LimitExceeded => write!(f, "reservation limit exceeded"),
        }
    }
}

/// Core error type for lending_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No book with this id in the catalog
    #[error("book not found: {0}")]
    BookNotFound(String),

    /// No patron with this id in the catalog
    #[error("patron not found: {0}")]
    PatronNotFound(String),

    /// The book already has an open loan
    #[error("book already loaned: {0}")]
    AlreadyLoaned(String),

    /// The book has no open loan to act on
    #[error("book not currently loaned: {0}")]
    NotLoaned(String),

    /// Another patron's reservation is at the head of the queue
    #[error("book {book_id} is reserved by patron {held_by}")]
    ReservedByAnother { book_id: String, held_by: String },

    /// No open loan matching both the book and the patron
    #[error("no open loan for book {book_id} and patron {patron_id}")]
    LoanNotFound { book_id: String, patron_id: String },

    /// Overdue loans cannot be extended
    #[error("loan for book {0} is overdue and cannot be extended")]
    LoanOverdue(String),

    /// Reservation refused by policy
    #[error("reservation rejected: {0}")]
    ReservationRejected(ReservationRejection),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
