pub mod codec;
pub mod config;
pub mod domain;
pub mod errors;
pub mod scheduling;

pub use codec::{ActionInfoCodec, ScheduleActionInfo};
pub use domain::challenge::{Challenge, ChallengeId};
pub use domain::reviewer::{Reviewer, ReviewerId, WeeklySchedule};
pub use domain::slot::{ReviewDay, Slot, SlotBooking, SlotId, SlotReference, SlotState};
pub use domain::week::WeekYear;
pub use errors::{ApplicationError, DomainError, InterfaceError, PersistenceError};
pub use scheduling::{
    AvailabilityByDay, ChallengeStore, NewChallenge, NewReviewer, ReviewerAvailability,
    ReviewerStore, ScheduleView, SchedulingService, SlotAvailability, ToggleOutcome, TogglePlane,
    ToggleRequest,
};
