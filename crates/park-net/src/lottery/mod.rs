//! Parking spot lottery allocation.
//!
//! A run loads the period's accepted requests, resolves the previous
//! period's non-winners into a priority boost set, scores every candidate,
//! randomizes equal-score tiers, walks the ordered list against the spot
//! inventory, persists the immutable allocation record, and dispatches
//! best-effort result mail. Storage, resident lookups, and the mail
//! transport are collaborator traits injected at construction.

pub mod domain;
pub mod repository;
pub mod router;
pub(crate) mod scoring;
pub mod service;
pub(crate) mod shuffle;
pub(crate) mod spots;

#[cfg(test)]
mod tests;

pub use domain::{
    AllocationResult, Assignment, Candidate, ParkingRequest, ParticipantOutcome, Period,
    PeriodError, RequestId, Resident, ResidentId, ResidentSnapshot, VehicleCategory,
};
pub use repository::{
    LotteryRepository, Notifier, NotifyError, RepositoryError, RequestSource, ResidentDirectory,
};
pub use router::lottery_router;
pub use scoring::{
    priority_score, PriorityBoostSet, CARRY_FORWARD_BOOST, DISABILITY_BOOST, DUES_PAID_BOOST,
};
pub use service::{LotteryService, LotteryServiceError};
pub use shuffle::order_candidates;
pub use spots::SpotInventory;
