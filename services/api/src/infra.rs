use metrics_exporter_prometheus::PrometheusHandle;
use park_net::lottery::{
    AllocationResult, LotteryRepository, Notifier, NotifyError, ParkingRequest, Period,
    RepositoryError, RequestId, RequestSource, Resident, ResidentDirectory, ResidentId,
    VehicleCategory,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Accepted requests held in memory. Everything pushed here has already
/// passed the upstream approval step, mirroring the collaborator contract.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRequestSource {
    requests: Arc<Mutex<Vec<ParkingRequest>>>,
}

impl InMemoryRequestSource {
    pub(crate) fn push(&self, request: ParkingRequest) {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request);
    }
}

impl RequestSource for InMemoryRequestSource {
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
pub(crate) struct InMemoryResidentDirectory {
    residents: Arc<Mutex<HashMap<ResidentId, Resident>>>,
}

impl InMemoryResidentDirectory {
    pub(crate) fn upsert(&self, resident: Resident) {
        self.residents
            .lock()
            .expect("resident mutex poisoned")
            .insert(resident.id.clone(), resident);
    }
}

impl ResidentDirectory for InMemoryResidentDirectory {
    fn find(&self, id: &ResidentId) -> Result<Option<Resident>, RepositoryError> {
        let guard = self.residents.lock().expect("resident mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// In-memory allocation store. The period key enforces the
/// one-result-per-period constraint the same way a database uniqueness
/// index would.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLotteryStore {
    results: Arc<Mutex<HashMap<Period, AllocationResult>>>,
    sequence: Arc<AtomicU64>,
}

impl LotteryRepository for InMemoryLotteryStore {
    fn find_by_period(&self, period: Period) -> Result<Option<AllocationResult>, RepositoryError> {
        let guard = self.results.lock().expect("lottery mutex poisoned");
        Ok(guard.get(&period).cloned())
    }

    fn insert(&self, mut result: AllocationResult) -> Result<AllocationResult, RepositoryError> {
        let mut guard = self.results.lock().expect("lottery mutex poisoned");
        if guard.contains_key(&result.period) {
            return Err(RepositoryError::Conflict);
        }
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        result.id = Some(format!("lot-{id:06}"));
        guard.insert(result.period, result.clone());
        Ok(result)
    }

    fn delete_by_period(&self, period: Period) -> Result<bool, RepositoryError> {
        let mut guard = self.results.lock().expect("lottery mutex poisoned");
        Ok(guard.remove(&period).is_some())
    }
}

/// Notifier that writes sends to the log instead of a mail provider.
#[derive(Clone)]
pub(crate) struct LogNotifier {
    from_address: String,
}

impl LogNotifier {
    pub(crate) fn new(from_address: String) -> Self {
        Self { from_address }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), NotifyError> {
        info!(
            from = %self.from_address,
            to = %recipient,
            subject = %subject,
            "lottery notification dispatched"
        );
        Ok(())
    }
}

pub(crate) fn sample_residents() -> Vec<Resident> {
    [
        ("res-ana", "Ana Restrepo", "Tower 2, Apt 101"),
        ("res-bruno", "Bruno Silva", "Tower 5, Apt 203"),
        ("res-carla", "Carla Duarte", "Tower 1, Apt 502"),
        ("res-diego", "Diego Lema", "Tower 3, Apt 304"),
    ]
    .into_iter()
    .map(|(id, name, apartment)| Resident {
        id: ResidentId(id.to_string()),
        identity_number: format!("cc-{}", &id[4..]),
        full_name: name.to_string(),
        apartment: apartment.to_string(),
        email: format!("{id}@condo.test"),
    })
    .collect()
}

pub(crate) fn sample_requests(period: Period) -> Vec<ParkingRequest> {
    let residents = sample_residents();
    let mut requests = Vec::new();

    for (index, resident) in residents.iter().enumerate() {
        let category = if index % 2 == 0 {
            VehicleCategory::Car
        } else {
            VehicleCategory::Motorcycle
        };
        requests.push(ParkingRequest {
            id: RequestId(format!("req-{}-{}", period, resident.id.0)),
            resident_id: resident.id.clone(),
            resident_identity_number: resident.identity_number.clone(),
            resident_full_name: resident.full_name.clone(),
            vehicle_category: category,
            license_plate: format!("PLT-{:03}", index + 1),
            disability_priority: index == 2,
            dues_paid: index == 1,
            period,
        });
    }

    requests
}
