//! Core domain types for the Biblio lending system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Books and patrons (catalog records)
//! - Loans and their overdue/fine derivations
//! - Reservations and their queue ordering
//! - Lending policy parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Catalog Record Types
// ============================================================================

/// A book in the catalog.
///
/// Whether a book is currently loaned is not stored here; it is derived
/// from the ledger (an open loan exists for this id).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publication_year: i32,
}

/// Patron membership tiers
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipLevel {
    Regular,
    Premium,
    Vip,
}

impl MembershipLevel {
    /// Maximum number of pending reservations a patron may hold system-wide
    pub fn reservation_limit(&self) -> usize {
        match self {
            MembershipLevel::Regular => 5,
            MembershipLevel::Premium => 10,
            MembershipLevel::Vip => 20,
        }
    }
}

/// A registered library patron
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patron {
    pub id: String,
    pub name: String,
    pub email: String,
    pub membership: MembershipLevel,
    fine_balance: f64,
}

impl Patron {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        membership: MembershipLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            membership,
            fine_balance: 0.0,
        }
    }

    /// Current outstanding fine balance, never negative
    pub fn fine_balance(&self) -> f64 {
        self.fine_balance
    }

    /// Add an accrued fine to the running balance
    pub fn add_fine(&mut self, amount: f64) {
        if amount > 0.0 {
            self.fine_balance += amount;
        }
    }

    /// Pay down the fine balance.
    ///
    /// Payments larger than the current balance are a no-op (the balance
    /// can never go negative). Returns true if the payment was applied.
    pub fn pay_fine(&mut self, amount: f64) -> bool {
        if amount <= 0.0 || amount > self.fine_balance {
            return false;
        }
        self.fine_balance -= amount;
        true
    }
}

// ============================================================================
// Ledger Record Types
// ============================================================================

/// Policy parameters for loans and fines
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LendingPolicy {
    /// Days a book may be kept before the loan is overdue
    pub loan_period_days: i64,
    /// Fine in dollars per day past the due date
    pub fine_per_day: f64,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            fine_per_day: 0.50,
        }
    }
}

/// A record of a book borrowed by a patron, open until returned
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub book_id: String,
    pub patron_id: String,
    pub loaned_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    /// Instant through which overdue fines were last added to the patron's
    /// balance. None when nothing has been charged for this loan yet.
    pub fine_charged_through: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn new(book_id: impl Into<String>, patron_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id: book_id.into(),
            patron_id: patron_id.into(),
            loaned_at: now,
            returned_at: None,
            fine_charged_through: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Due date derived from the loan date and policy period
    pub fn due_at(&self, policy: &LendingPolicy) -> DateTime<Utc> {
        self.loaned_at + chrono::Duration::days(policy.loan_period_days)
    }

    /// Whether the loan is overdue at `now`. Closed loans are never overdue.
    pub fn is_overdue_at(&self, now: DateTime<Utc>, policy: &LendingPolicy) -> bool {
        self.is_open() && now > self.due_at(policy)
    }

    /// Fine accrued at `now`, in dollars.
    ///
    /// Accrues continuously (fractional days) at `fine_per_day` past the due
    /// date, floored at zero. Recomputed on every read, never cached.
    pub fn fine_at(&self, now: DateTime<Utc>, policy: &LendingPolicy) -> f64 {
        if !self.is_overdue_at(now, policy) {
            return 0.0;
        }
        let overdue_seconds = (now - self.due_at(policy)).num_seconds();
        let overdue_days = overdue_seconds as f64 / 86_400.0;
        (overdue_days * policy.fine_per_day).max(0.0)
    }
}

/// A patron's claim on a book, queued in priority (FIFO) order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reservation {
    pub book_id: String,
    pub patron_id: String,
    pub reserved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_time() -> DateTime<Utc> {
        "2024-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_reservation_limits_by_membership() {
        assert_eq!(MembershipLevel::Regular.reservation_limit(), 5);
        assert_eq!(MembershipLevel::Premium.reservation_limit(), 10);
        assert_eq!(MembershipLevel::Vip.reservation_limit(), 20);
    }

    #[test]
    fn test_loan_not_overdue_within_period() {
        let t0 = base_time();
        let loan = Loan::new("b1", "p1", t0);
        let policy = LendingPolicy::default();

        assert!(!loan.is_overdue_at(t0 + Duration::days(10), &policy));
        assert_eq!(loan.fine_at(t0 + Duration::days(10), &policy), 0.0);
    }

    #[test]
    fn test_loan_overdue_past_period() {
        let t0 = base_time();
        let loan = Loan::new("b1", "p1", t0);
        let policy = LendingPolicy::default();

        let at = t0 + Duration::days(20);
        assert!(loan.is_overdue_at(at, &policy));
        // 6 days past due at $0.50/day
        assert!((loan.fine_at(at, &policy) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_closed_loan_never_overdue() {
        let t0 = base_time();
        let mut loan = Loan::new("b1", "p1", t0);
        loan.returned_at = Some(t0 + Duration::days(5));
        let policy = LendingPolicy::default();

        assert!(!loan.is_overdue_at(t0 + Duration::days(30), &policy));
        assert_eq!(loan.fine_at(t0 + Duration::days(30), &policy), 0.0);
    }

    #[test]
    fn test_fine_monotonic_in_time() {
        let t0 = base_time();
        let loan = Loan::new("b1", "p1", t0);
        let policy = LendingPolicy::default();

        let f1 = loan.fine_at(t0 + Duration::days(16), &policy);
        let f2 = loan.fine_at(t0 + Duration::days(25), &policy);
        assert!(f2 >= f1);
    }

    #[test]
    fn test_fine_accrues_fractional_days() {
        let t0 = base_time();
        let loan = Loan::new("b1", "p1", t0);
        let policy = LendingPolicy::default();

        // 14 days + 12 hours: half a day overdue
        let at = t0 + Duration::days(14) + Duration::hours(12);
        assert!((loan.fine_at(at, &policy) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_pay_fine_caps_at_balance() {
        let mut patron = Patron::new("p1", "Ada", "ada@example.com", MembershipLevel::Regular);
        patron.add_fine(2.0);

        assert!(!patron.pay_fine(5.0));
        assert_eq!(patron.fine_balance(), 2.0);

        assert!(patron.pay_fine(1.5));
        assert!((patron.fine_balance() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_fine_amounts_ignored() {
        let mut patron = Patron::new("p1", "Ada", "ada@example.com", MembershipLevel::Regular);
        patron.add_fine(-3.0);
        assert_eq!(patron.fine_balance(), 0.0);
        assert!(!patron.pay_fine(-1.0));
    }
}
