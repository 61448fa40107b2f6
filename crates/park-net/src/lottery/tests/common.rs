use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::lottery::domain::{
    AllocationResult, Candidate, ParkingRequest, ParticipantOutcome, Period, RequestId, Resident,
    ResidentId, ResidentSnapshot, VehicleCategory,
};
use crate::lottery::repository::{
    LotteryRepository, Notifier, NotifyError, RepositoryError, RequestSource, ResidentDirectory,
};
use crate::lottery::service::LotteryService;

pub(super) fn period(raw: &str) -> Period {
    raw.parse().expect("valid period token")
}

pub(super) fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub(super) fn resident(id: &str, full_name: &str) -> Resident {
    Resident {
        id: ResidentId(id.to_string()),
        identity_number: format!("id-{id}"),
        full_name: full_name.to_string(),
        apartment: "Tower 2, Apt 301".to_string(),
        email: format!("{id}@condo.test"),
    }
}

pub(super) fn request(
    id: &str,
    owner: &Resident,
    category: VehicleCategory,
    period_token: &str,
) -> ParkingRequest {
    ParkingRequest {
        id: RequestId(id.to_string()),
        resident_id: owner.id.clone(),
        resident_identity_number: owner.identity_number.clone(),
        resident_full_name: owner.full_name.clone(),
        vehicle_category: category,
        license_plate: format!("PLT-{id}"),
        disability_priority: false,
        dues_paid: false,
        period: period(period_token),
    }
}

pub(super) fn candidate(id: &str, score: i32) -> Candidate {
    let owner = resident(&format!("res-{id}"), "Tier Resident");
    let request = request(id, &owner, VehicleCategory::Car, "2025-07");
    Candidate {
        request,
        resident: ResidentSnapshot::from(&owner),
        priority_score: score,
    }
}

pub(super) fn outcome(
    owner: &Resident,
    category: VehicleCategory,
    spot: Option<&str>,
) -> ParticipantOutcome {
    ParticipantOutcome {
        resident_id: owner.id.clone(),
        identity_number: owner.identity_number.clone(),
        full_name: owner.full_name.clone(),
        apartment: owner.apartment.clone(),
        vehicle_category: category,
        license_plate: "PLT-000".to_string(),
        spot: spot.map(str::to_string),
        request_id: RequestId(format!("req-{}", owner.id.0)),
    }
}

pub(super) fn stored_result(
    period_token: &str,
    winners: Vec<ParticipantOutcome>,
    non_winners: Vec<ParticipantOutcome>,
) -> AllocationResult {
    AllocationResult {
        id: Some("lot-000001".to_string()),
        period: period(period_token),
        total_car_spots_offered: winners.len() as u32,
        total_moto_spots_offered: 0,
        winners,
        non_winners,
        executed_at: Utc::now(),
    }
}

pub(super) type TestService =
    LotteryService<MemoryRequests, MemoryResidents, MemoryLotteries, RecordingNotifier>;

pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) requests: Arc<MemoryRequests>,
    pub(super) residents: Arc<MemoryResidents>,
    pub(super) lotteries: Arc<MemoryLotteries>,
    pub(super) mail: Arc<RecordingNotifier>,
}

pub(super) fn harness() -> Harness {
    let requests = Arc::new(MemoryRequests::default());
    let residents = Arc::new(MemoryResidents::default());
    let lotteries = Arc::new(MemoryLotteries::default());
    let mail = Arc::new(RecordingNotifier::default());
    let service = LotteryService::new(
        requests.clone(),
        residents.clone(),
        lotteries.clone(),
        mail.clone(),
    );

    Harness {
        service,
        requests,
        residents,
        lotteries,
        mail,
    }
}

impl Harness {
    /// Registers the resident and one accepted request per category given.
    pub(super) fn enroll(
        &self,
        owner: &Resident,
        categories: &[VehicleCategory],
        period_token: &str,
    ) {
        self.residents.upsert(owner.clone());
        for category in categories {
            let id = format!("req-{}-{}", owner.id.0, category.label());
            self.requests.push(request(&id, owner, *category, period_token));
        }
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRequests {
    requests: Arc<Mutex<Vec<ParkingRequest>>>,
}

impl MemoryRequests {
    pub(super) fn push(&self, request: ParkingRequest) {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request);
    }
}

impl RequestSource for MemoryRequests {
    fn list_accepted(&self, period: Period) -> Result<Vec<ParkingRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("request mutex poisoned");
        Ok(guard
            .iter()
            .filter(|request| request.period == period)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryResidents {
    residents: Arc<Mutex<HashMap<ResidentId, Resident>>>,
}

impl MemoryResidents {
    pub(super) fn upsert(&self, resident: Resident) {
        self.residents
            .lock()
            .expect("resident mutex poisoned")
            .insert(resident.id.clone(), resident);
    }
}

impl ResidentDirectory for MemoryResidents {
    fn find(&self, id: &ResidentId) -> Result<Option<Resident>, RepositoryError> {
        let guard = self.residents.lock().expect("resident mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryLotteries {
    results: Arc<Mutex<HashMap<Period, AllocationResult>>>,
}

impl MemoryLotteries {
    pub(super) fn stored(&self, period: Period) -> Option<AllocationResult> {
        self.results
            .lock()
            .expect("lottery mutex poisoned")
            .get(&period)
            .cloned()
    }

}

impl LotteryRepository for MemoryLotteries {
    fn find_by_period(&self, period: Period) -> Result<Option<AllocationResult>, RepositoryError> {
        Ok(self.stored(period))
    }

    fn insert(&self, mut result: AllocationResult) -> Result<AllocationResult, RepositoryError> {
        let mut guard = self.results.lock().expect("lottery mutex poisoned");
        if guard.contains_key(&result.period) {
            return Err(RepositoryError::Conflict);
        }
        result.id = Some(format!("lot-{:06}", guard.len() + 1));
        guard.insert(result.period, result.clone());
        Ok(result)
    }

    fn delete_by_period(&self, period: Period) -> Result<bool, RepositoryError> {
        let mut guard = self.results.lock().expect("lottery mutex poisoned");
        Ok(guard.remove(&period).is_some())
    }
}

/// Repository whose existence check misses while the insert still hits the
/// uniqueness constraint, simulating a concurrent execution winning the race.
pub(super) struct RaceLotteries;

impl LotteryRepository for RaceLotteries {
    fn find_by_period(&self, _period: Period) -> Result<Option<AllocationResult>, RepositoryError> {
        Ok(None)
    }

    fn insert(&self, _result: AllocationResult) -> Result<AllocationResult, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn delete_by_period(&self, _period: Period) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}

pub(super) struct UnavailableLotteries;

impl LotteryRepository for UnavailableLotteries {
    fn find_by_period(&self, _period: Period) -> Result<Option<AllocationResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _result: AllocationResult) -> Result<AllocationResult, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_by_period(&self, _period: Period) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SentMail {
    pub(super) to: String,
    pub(super) subject: String,
    pub(super) body: String,
}

#[derive(Default, Clone)]
pub(super) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().expect("mail mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().expect("mail mutex poisoned").push(SentMail {
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay refused".to_string()))
    }
}
