//! Read-only reporting over catalog and ledger state.
//!
//! Rendering only; nothing here mutates core state. Loan history can also
//! be exported to CSV for use outside the system.

use crate::catalog::CatalogStore;
use crate::ledger::Ledger;
use crate::types::Loan;
use crate::Result;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;

/// Render a one-screen summary of library state
pub fn render_summary(catalog: &CatalogStore, ledger: &Ledger, now: DateTime<Utc>) -> String {
    let loaned = catalog
        .books()
        .filter(|b| ledger.is_loaned(&b.id))
        .count();
    let open_loans = ledger.loan_history().iter().filter(|l| l.is_open()).count();
    let overdue = ledger.overdue_loans(now).len();
    let outstanding: f64 = catalog.patrons().map(|p| p.fine_balance()).sum();

    let mut out = String::new();
    let _ = writeln!(out, "Library summary ({})", now.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(
        out,
        "  books: {} ({} on loan)",
        catalog.book_count(),
        loaned
    );
    let _ = writeln!(out, "  patrons: {}", catalog.patron_count());
    let _ = writeln!(
        out,
        "  loans: {} total, {} open, {} overdue",
        ledger.loan_history().len(),
        open_loans,
        overdue
    );
    let _ = writeln!(out, "  pending reservations: {}", ledger.reservation_count());
    let _ = writeln!(out, "  outstanding fines: ${outstanding:.2}");
    out
}

/// Render overdue loans with their current fines, one line each
pub fn render_overdue(catalog: &CatalogStore, ledger: &Ledger, now: DateTime<Utc>) -> String {
    let overdue = ledger.overdue_loans(now);
    if overdue.is_empty() {
        return "No overdue loans.\n".to_string();
    }

    let mut out = String::new();
    for loan in overdue {
        let title = catalog
            .find_book(&loan.book_id)
            .map(|b| b.title.as_str())
            .unwrap_or(loan.book_id.as_str());
        let patron = catalog
            .find_patron(&loan.patron_id)
            .map(|p| p.name.as_str())
            .unwrap_or(loan.patron_id.as_str());
        let _ = writeln!(
            out,
            "  {title} - {patron}, due {}, fine ${:.2}",
            loan.due_at(ledger.policy()).format("%Y-%m-%d"),
            loan.fine_at(now, ledger.policy()),
        );
    }
    out
}

/// A row in the exported loan history CSV
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    book_id: String,
    patron_id: String,
    loaned_at: String,
    returned_at: Option<String>,
}

impl From<&Loan> for CsvRow {
    fn from(loan: &Loan) -> Self {
        CsvRow {
            id: loan.id.to_string(),
            book_id: loan.book_id.clone(),
            patron_id: loan.patron_id.clone(),
            loaned_at: loan.loaned_at.to_rfc3339(),
            returned_at: loan.returned_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Export the full loan history to a CSV file, returning the row count
pub fn export_loan_history_csv(ledger: &Ledger, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for loan in ledger.loan_history() {
        writer.serialize(CsvRow::from(loan))?;
    }
    writer.flush()?;

    let count = ledger.loan_history().len();
    tracing::info!(count, path = %path.display(), "loan history exported");
    Ok(count)
}
