use chrono::Utc;

use crate::domain::reviewer::Reviewer;
use crate::domain::slot::SlotBooking;
use crate::errors::ApplicationError;
use crate::scheduling::SchedulingService;

impl SchedulingService {
    /// Sets one slot's booking flag and persists the reviewer. Booking does
    /// not consult the availability plane.
    pub async fn update_reviewer_booking(
        &self,
        reviewer: &Reviewer,
        booking: SlotBooking,
    ) -> Result<Reviewer, ApplicationError> {
        let mut updated = reviewer.clone();
        updated.set_booking(&booking);
        updated.updated_at = Utc::now();
        Ok(self.reviewers.save(&updated).await?)
    }
}
