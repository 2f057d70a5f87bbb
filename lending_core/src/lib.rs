#![forbid(unsafe_code)]

//! Core domain model and business logic for the Biblio lending system.
//!
//! This crate provides:
//! - Domain types (books, patrons, loans, reservations)
//! - The lending ledger (loan lifecycle, reservation queues, fines)
//! - Catalog store and search
//! - Notification abstraction
//! - Reporting and CSV export
//! - Snapshot persistence for the CLI boundary

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod notify;
pub mod report;
pub mod snapshot;

// Re-export commonly used types
pub use error::{Error, ReservationRejection, Result};
pub use types::*;
pub use catalog::CatalogStore;
pub use config::Config;
pub use ledger::Ledger;
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use report::{export_loan_history_csv, render_overdue, render_summary};
pub use snapshot::Library;
