use super::domain::{AllocationResult, ParkingRequest, Period, Resident, ResidentId};

/// Read-only source of accepted parking requests, owned by the
/// request-management collaborator. Requests returned here have already
/// passed the upstream approval step.
pub trait RequestSource: Send + Sync {
    fn list_accepted(&self, period: Period) -> Result<Vec<ParkingRequest>, RepositoryError>;
}

/// Read-only directory of resident records.
pub trait ResidentDirectory: Send + Sync {
    fn find(&self, id: &ResidentId) -> Result<Option<Resident>, RepositoryError>;
}

/// Persistence for allocation records.
///
/// `insert` is the uniqueness arbiter: a second record for the same period
/// must come back as [`RepositoryError::Conflict`], regardless of any
/// earlier existence check.
pub trait LotteryRepository: Send + Sync {
    fn find_by_period(&self, period: Period) -> Result<Option<AllocationResult>, RepositoryError>;
    fn insert(&self, result: AllocationResult) -> Result<AllocationResult, RepositoryError>;
    fn delete_by_period(&self, period: Period) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound mail hook; implementations decide the transport.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notification dispatch error. Always contained by the caller.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
