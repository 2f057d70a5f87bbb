//! The lending ledger: loans, reservations, and fine accrual.
//!
//! This is the authoritative owner of lending state. Books and patrons are
//! looked up in the [`CatalogStore`] by id but never owned here. Every
//! operation takes `now` explicitly so a single time snapshot is used per
//! call, and returns a typed [`Result`] instead of a bare success flag.
//!
//! Lifecycles driven by these operations:
//! - Loan: Open -> Closed, one-way, only via `return_book`
//! - Book availability: derived from whether an open loan exists
//! - Reservation: Pending -> Consumed, either granted at loan time to the
//!   head holder or popped and notified at return time

use crate::catalog::CatalogStore;
use crate::error::{Error, ReservationRejection, Result};
use crate::notify::Notifier;
use crate::types::{LendingPolicy, Loan, Reservation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Core aggregate owning loan history, reservation queues, and fine policy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ledger {
    policy: LendingPolicy,
    /// Append-only loan history; closed loans are retained
    loans: Vec<Loan>,
    /// Pending reservations per book id, FIFO order = priority
    reservations: HashMap<String, VecDeque<Reservation>>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LendingPolicy::default())
    }
}

impl Ledger {
    pub fn new(policy: LendingPolicy) -> Self {
        Self {
            policy,
            loans: Vec::new(),
            reservations: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    /// Replace the lending policy. Affects future overdue/fine evaluation
    /// of all loans, open ones included.
    pub fn set_policy(&mut self, policy: LendingPolicy) {
        self.policy = policy;
    }

    // ========================================================================
    // Derived state
    // ========================================================================

    /// The open loan for a book, if any. At most one can exist.
    pub fn open_loan(&self, book_id: &str) -> Option<&Loan> {
        self.loans
            .iter()
            .find(|l| l.book_id == book_id && l.is_open())
    }

    fn open_loan_mut(&mut self, book_id: &str) -> Option<&mut Loan> {
        self.loans
            .iter_mut()
            .find(|l| l.book_id == book_id && l.is_open())
    }

    /// Whether a book is currently loaned out
    pub fn is_loaned(&self, book_id: &str) -> bool {
        self.open_loan(book_id).is_some()
    }

    /// All loans, open and closed, in insertion order
    pub fn loan_history(&self) -> &[Loan] {
        &self.loans
    }

    /// Open loans past their due date at `now`
    pub fn overdue_loans(&self, now: DateTime<Utc>) -> Vec<&Loan> {
        self.loans
            .iter()
            .filter(|l| l.is_overdue_at(now, &self.policy))
            .collect()
    }

    /// Pending reservations for a book in priority order
    pub fn reservations_for(&self, book_id: &str) -> impl Iterator<Item = &Reservation> {
        self.reservations.get(book_id).into_iter().flatten()
    }

    /// Total pending reservations across all books
    pub fn reservation_count(&self) -> usize {
        self.reservations.values().map(|q| q.len()).sum()
    }

    fn pending_reservations_by(&self, patron_id: &str) -> usize {
        self.reservations
            .values()
            .flatten()
            .filter(|r| r.patron_id == patron_id)
            .count()
    }

    // ========================================================================
    // Loan lifecycle
    // ========================================================================

    /// Loan a book to a patron.
    ///
    /// Fails if either entity is unknown, the book is already out, or the
    /// head of the reservation queue belongs to someone else. A requesting
    /// patron who holds the head reservation is served and that reservation
    /// is consumed.
    pub fn loan_book(
        &mut self,
        catalog: &CatalogStore,
        book_id: &str,
        patron_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        if catalog.find_book(book_id).is_none() {
            return Err(Error::BookNotFound(book_id.into()));
        }
        if catalog.find_patron(patron_id).is_none() {
            return Err(Error::PatronNotFound(patron_id.into()));
        }
        if self.is_loaned(book_id) {
            return Err(Error::AlreadyLoaned(book_id.into()));
        }

        // A non-requesting reservation holder at the head blocks everyone else
        let mut consume_head = false;
        if let Some(head) = self.reservations_for(book_id).next() {
            if head.patron_id != patron_id {
                return Err(Error::ReservedByAnother {
                    book_id: book_id.into(),
                    held_by: head.patron_id.clone(),
                });
            }
            consume_head = true;
        }
        if consume_head {
            if let Some(queue) = self.reservations.get_mut(book_id) {
                queue.pop_front();
            }
        }

        let loan = Loan::new(book_id, patron_id, now);
        let loan_id = loan.id;
        tracing::info!(book_id, patron_id, %loan_id, "book loaned");
        self.loans.push(loan);
        Ok(loan_id)
    }

    /// Return a loaned book.
    ///
    /// Closes the open loan, then pops the head reservation (if any) and
    /// notifies its patron that the book is available. No new loan is
    /// created; availability is only signaled. If the reservation points at
    /// a patron no longer in the catalog, the return still takes effect and
    /// `PatronNotFound` is surfaced to the caller.
    pub fn return_book(
        &mut self,
        catalog: &CatalogStore,
        notifier: &dyn Notifier,
        book_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if catalog.find_book(book_id).is_none() {
            return Err(Error::BookNotFound(book_id.into()));
        }
        let loan = self
            .open_loan_mut(book_id)
            .ok_or_else(|| Error::NotLoaned(book_id.into()))?;
        loan.returned_at = Some(now);
        tracing::info!(book_id, "book returned");

        let next = self
            .reservations
            .get_mut(book_id)
            .and_then(|q| q.pop_front());
        if let Some(reservation) = next {
            let patron = catalog.find_patron(&reservation.patron_id).ok_or_else(|| {
                tracing::warn!(
                    book_id,
                    patron_id = %reservation.patron_id,
                    "reservation holder no longer registered, dropping reservation"
                );
                Error::PatronNotFound(reservation.patron_id.clone())
            })?;

            let title = catalog
                .find_book(book_id)
                .map(|b| b.title.as_str())
                .unwrap_or(book_id);
            notifier.notify(
                &patron.email,
                &format!("Reserved book available: {title}"),
                &format!(
                    "Hello {}, \"{title}\" has been returned and is being held for you.",
                    patron.name
                ),
            );
            tracing::info!(book_id, patron_id = %reservation.patron_id, "reservation holder notified");
        }
        Ok(())
    }

    /// Extend an open loan by restarting its lending window at `now`.
    ///
    /// Overdue loans cannot be extended; the fine must be resolved by
    /// returning the book instead.
    pub fn extend_loan(
        &mut self,
        book_id: &str,
        patron_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let policy = self.policy.clone();
        let loan = self
            .loans
            .iter_mut()
            .find(|l| l.book_id == book_id && l.patron_id == patron_id && l.is_open())
            .ok_or_else(|| Error::LoanNotFound {
                book_id: book_id.into(),
                patron_id: patron_id.into(),
            })?;
        if loan.is_overdue_at(now, &policy) {
            return Err(Error::LoanOverdue(book_id.into()));
        }
        loan.loaned_at = now;
        loan.fine_charged_through = None;
        tracing::info!(book_id, patron_id, "loan extended");
        Ok(())
    }

    // ========================================================================
    // Reservations
    // ========================================================================

    /// Reserve a book for a patron.
    ///
    /// Rejected when the patron already has a pending reservation for this
    /// book, or when their membership's reservation limit is reached.
    pub fn reserve_book(
        &mut self,
        catalog: &CatalogStore,
        book_id: &str,
        patron_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if catalog.find_book(book_id).is_none() {
            return Err(Error::BookNotFound(book_id.into()));
        }
        let patron = catalog
            .find_patron(patron_id)
            .ok_or_else(|| Error::PatronNotFound(patron_id.into()))?;

        if self
            .reservations_for(book_id)
            .any(|r| r.patron_id == patron_id)
        {
            return Err(Error::ReservationRejected(ReservationRejection::Duplicate));
        }
        let limit = patron.membership.reservation_limit();
        if self.pending_reservations_by(patron_id) >= limit {
            tracing::debug!(patron_id, limit, "reservation limit reached");
            return Err(Error::ReservationRejected(
                ReservationRejection::LimitExceeded,
            ));
        }

        self.reservations
            .entry(book_id.to_string())
            .or_default()
            .push_back(Reservation {
                book_id: book_id.into(),
                patron_id: patron_id.into(),
                reserved_at: now,
            });
        tracing::info!(book_id, patron_id, "book reserved");
        Ok(())
    }

    // ========================================================================
    // Overdue handling and fines
    // ========================================================================

    /// Emit one overdue notification per overdue loan.
    ///
    /// Not deduplicated per patron: a patron with three overdue books gets
    /// three messages. Loans whose patron has vanished from the catalog are
    /// logged and skipped. Returns the number of notifications sent.
    pub fn notify_overdue(
        &self,
        catalog: &CatalogStore,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> usize {
        let mut sent = 0;
        for loan in self.overdue_loans(now) {
            let Some(patron) = catalog.find_patron(&loan.patron_id) else {
                tracing::warn!(
                    book_id = %loan.book_id,
                    patron_id = %loan.patron_id,
                    "overdue loan references unknown patron, skipping"
                );
                continue;
            };
            let title = catalog
                .find_book(&loan.book_id)
                .map(|b| b.title.as_str())
                .unwrap_or(loan.book_id.as_str());
            let fine = loan.fine_at(now, &self.policy);
            notifier.notify(
                &patron.email,
                &format!("Overdue loan: {title}"),
                &format!(
                    "Hello {}, \"{title}\" was due on {}. Your current fine is ${fine:.2}.",
                    patron.name,
                    loan.due_at(&self.policy).format("%Y-%m-%d"),
                ),
            );
            sent += 1;
        }
        tracing::info!(count = sent, "overdue notifications sent");
        sent
    }

    /// Add outstanding overdue fines to patron balances.
    ///
    /// Idempotent per overdue period: each loan is charged only for the span
    /// since it was last charged (or since its due date), and the charge
    /// marker advances to `now`. Calling twice at the same instant adds
    /// nothing. Returns the total amount charged.
    pub fn accrue_fines(&mut self, catalog: &mut CatalogStore, now: DateTime<Utc>) -> f64 {
        let policy = self.policy.clone();
        let mut total = 0.0;
        for loan in self
            .loans
            .iter_mut()
            .filter(|l| l.is_overdue_at(now, &policy))
        {
            let due = loan.due_at(&policy);
            let charge_from = loan.fine_charged_through.map_or(due, |t| t.max(due));
            let unpaid_days = (now - charge_from).num_seconds() as f64 / 86_400.0;
            if unpaid_days <= 0.0 {
                continue;
            }
            let amount = unpaid_days * policy.fine_per_day;

            let Some(patron) = catalog.find_patron_mut(&loan.patron_id) else {
                tracing::warn!(
                    book_id = %loan.book_id,
                    patron_id = %loan.patron_id,
                    "overdue loan references unknown patron, fine not charged"
                );
                continue;
            };
            patron.add_fine(amount);
            loan.fine_charged_through = Some(now);
            total += amount;
            tracing::info!(
                book_id = %loan.book_id,
                patron_id = %loan.patron_id,
                amount,
                "fine charged"
            );
        }
        total
    }

    /// Pay down a patron's fine balance.
    ///
    /// Payments above the balance are silently capped to a no-op; returns
    /// whether the payment was applied.
    pub fn pay_fine(
        &self,
        catalog: &mut CatalogStore,
        patron_id: &str,
        amount: f64,
    ) -> Result<bool> {
        let patron = catalog
            .find_patron_mut(patron_id)
            .ok_or_else(|| Error::PatronNotFound(patron_id.into()))?;
        let applied = patron.pay_fine(amount);
        if applied {
            tracing::info!(patron_id, amount, "fine paid");
        } else {
            tracing::warn!(
                patron_id,
                amount,
                balance = patron.fine_balance(),
                "payment not applied"
            );
        }
        Ok(applied)
    }
}
