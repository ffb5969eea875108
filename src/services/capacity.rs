//! Capacity ledger: the only component that moves an offering's seat
//! counter.
//!
//! Reservation and release go through the repository's compare-and-swap
//! primitive in a bounded retry loop, so two concurrent reservations for
//! the last seat can never both succeed. Closure on a full offering or an
//! expired window is derived from the offering row at reservation time,
//! never written back as a status change.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::api::OfferingId;
use crate::db::{CampusRepository, OfferingRepository};
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::offering::CourseOffering;
use crate::services::deadline::Deadline;

/// Pause between lost compare-and-swap rounds.
const CAS_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Clone)]
pub struct CapacityLedger {
    repo: Arc<dyn CampusRepository>,
}

impl CapacityLedger {
    pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
        Self { repo }
    }

    /// Reserve one seat. `Ok(true)` when a seat was taken, `Ok(false)` when
    /// the offering is not enrollable right now (full, closed, or outside
    /// its window).
    ///
    /// Each round re-reads the offering and swaps `committed -> committed + 1`
    /// conditionally; a lost swap means another writer moved the counter
    /// first, so the round repeats against the fresh value until the
    /// deadline expires.
    pub async fn try_reserve_seat(
        &self,
        offering_id: OfferingId,
        deadline: Deadline,
    ) -> SchedulingResult<bool> {
        loop {
            deadline.check("reserve_seat")?;

            let offering = self.load(offering_id).await?;
            if !offering.is_enrollable_at(Utc::now()) {
                debug!(
                    offering = %offering_id,
                    committed = offering.committed_seats,
                    capacity = offering.capacity,
                    "offering not enrollable, reservation refused"
                );
                return Ok(false);
            }

            let committed = offering.committed_seats;
            if self
                .repo
                .compare_and_swap_committed_seats(offering_id, committed, committed + 1)
                .await?
            {
                debug!(
                    offering = %offering_id,
                    committed = committed + 1,
                    capacity = offering.capacity,
                    "seat reserved"
                );
                return Ok(true);
            }

            tokio::time::sleep(CAS_BACKOFF).await;
        }
    }

    /// Return one seat. The counter floors at zero; releasing against an
    /// already-zero counter is a no-op, so a duplicate compensation cannot
    /// drive it negative.
    pub async fn release_seat(
        &self,
        offering_id: OfferingId,
        deadline: Deadline,
    ) -> SchedulingResult<()> {
        loop {
            deadline.check("release_seat")?;

            let offering = self.load(offering_id).await?;
            let committed = offering.committed_seats;
            if committed == 0 {
                warn!(offering = %offering_id, "release on empty counter ignored");
                return Ok(());
            }

            if self
                .repo
                .compare_and_swap_committed_seats(offering_id, committed, committed - 1)
                .await?
            {
                debug!(
                    offering = %offering_id,
                    committed = committed - 1,
                    "seat released"
                );
                return Ok(());
            }

            tokio::time::sleep(CAS_BACKOFF).await;
        }
    }

    /// Current `(committed, capacity)` for an offering.
    pub async fn seat_count(&self, offering_id: OfferingId) -> SchedulingResult<(u32, u32)> {
        let offering = self.load(offering_id).await?;
        Ok((offering.committed_seats, offering.capacity))
    }

    async fn load(&self, offering_id: OfferingId) -> SchedulingResult<CourseOffering> {
        self.repo
            .find_offering(offering_id)
            .await?
            .ok_or_else(|| SchedulingError::not_found("offering", offering_id))
    }
}
