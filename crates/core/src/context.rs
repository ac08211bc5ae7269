//! Explicit execution context for orchestrated operations.
//!
//! Every user action (confirm a commitment, populate a shipment, reassign a
//! lot, mark a receipt) runs request-scoped against the shared indexes. The
//! context carries the company, the acting user, and the request clock so no
//! code reads ambient session state or the wall clock directly — tests pin
//! all three.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{CompanyId, UserId};

/// Identity and clock for one request-scoped unit of work.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub company_id: CompanyId,
    pub actor_id: UserId,
    /// Instant the request started; every timestamp written during the
    /// request derives from this.
    pub now: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new(company_id: CompanyId, actor_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            company_id,
            actor_id,
            now,
        }
    }

    /// Calendar date of the request clock (voyage dates are day-granular).
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
