use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use super::domain::{
    AllocationResult, Assignment, Candidate, ParkingRequest, ParticipantOutcome, Period,
    ResidentId, ResidentSnapshot, VehicleCategory,
};
use super::repository::{
    LotteryRepository, Notifier, RepositoryError, RequestSource, ResidentDirectory,
};
use super::scoring::{priority_score, PriorityBoostSet};
use super::shuffle::order_candidates;
use super::spots::SpotInventory;

/// Allocation engine composing the collaborator boundaries: request source,
/// resident directory, result persistence, and the outbound notifier.
pub struct LotteryService<S, D, L, N> {
    requests: Arc<S>,
    residents: Arc<D>,
    lotteries: Arc<L>,
    notifier: Arc<N>,
}

impl<S, D, L, N> LotteryService<S, D, L, N>
where
    S: RequestSource + 'static,
    D: ResidentDirectory + 'static,
    L: LotteryRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(requests: Arc<S>, residents: Arc<D>, lotteries: Arc<L>, notifier: Arc<N>) -> Self {
        Self {
            requests,
            residents,
            lotteries,
            notifier,
        }
    }

    /// Runs the draw for `period`, offering the given spot counts per
    /// category. Tie-break randomness comes from the thread generator.
    pub fn execute_lottery(
        &self,
        period: Period,
        num_car_spots: u32,
        num_moto_spots: u32,
    ) -> Result<AllocationResult, LotteryServiceError> {
        self.execute_lottery_with_rng(
            period,
            num_car_spots,
            num_moto_spots,
            &mut rand::thread_rng(),
        )
    }

    /// Same as [`Self::execute_lottery`] but drawing tie-break randomness
    /// from the caller, so tests can pin a seeded generator.
    pub fn execute_lottery_with_rng(
        &self,
        period: Period,
        num_car_spots: u32,
        num_moto_spots: u32,
        rng: &mut impl Rng,
    ) -> Result<AllocationResult, LotteryServiceError> {
        // Fast-path guard; the repository insert below is the arbiter.
        if self.lotteries.find_by_period(period)?.is_some() {
            return Err(LotteryServiceError::AlreadyExecuted(period));
        }

        let accepted = self.requests.list_accepted(period)?;
        if accepted.is_empty() {
            let stored = self.insert_guarded(empty_result(period, num_car_spots, num_moto_spots))?;
            info!(%period, "lottery executed with no accepted requests");
            return Ok(stored);
        }

        let boosts = self.previous_period_non_winners(period)?;
        let candidates = self.assemble_candidates(accepted, &boosts)?;
        let ordered = order_candidates(candidates, rng);

        let mut inventory = SpotInventory::generate(num_car_spots, num_moto_spots);
        let mut winners = Vec::new();
        let mut non_winners = Vec::new();
        let mut assigned: HashSet<(ResidentId, VehicleCategory)> = HashSet::new();

        for candidate in &ordered {
            let key = (
                candidate.resident.id.clone(),
                candidate.request.vehicle_category,
            );
            if assigned.contains(&key) {
                // Duplicate accepted request for an already assigned pair.
                // Upstream should prevent this; never double-assign.
                warn!(
                    resident = %candidate.resident.id.0,
                    category = candidate.request.vehicle_category.label(),
                    request = %candidate.request.id.0,
                    "duplicate accepted request for assigned pair, recorded as non-winner"
                );
                non_winners.push(candidate.outcome(None));
                continue;
            }

            match inventory.take(candidate.request.vehicle_category) {
                Some(spot) => {
                    assigned.insert(key);
                    winners.push(candidate.outcome(Some(spot)));
                }
                None => non_winners.push(candidate.outcome(None)),
            }
        }

        let result = AllocationResult {
            id: None,
            period,
            total_car_spots_offered: num_car_spots,
            total_moto_spots_offered: num_moto_spots,
            winners,
            non_winners,
            executed_at: Utc::now(),
        };

        let stored = self.insert_guarded(result)?;
        info!(
            %period,
            winners = stored.winners.len(),
            non_winners = stored.non_winners.len(),
            "lottery executed"
        );

        self.dispatch_notifications(&stored);
        Ok(stored)
    }

    /// Stored result for a period. A category filter narrows the winner
    /// list only; non-winners are returned untouched.
    pub fn result_for_period(
        &self,
        period: Period,
        category: Option<VehicleCategory>,
    ) -> Result<AllocationResult, LotteryServiceError> {
        let result = self
            .lotteries
            .find_by_period(period)?
            .ok_or(LotteryServiceError::ResultNotFound(period))?;

        Ok(match category {
            Some(category) => result.narrowed_to(category),
            None => result,
        })
    }

    /// Winning entries for one resident in one period. A period without a
    /// lottery yields an empty list, not an error.
    pub fn assignments_for_resident(
        &self,
        resident: &ResidentId,
        period: Period,
    ) -> Result<Vec<Assignment>, LotteryServiceError> {
        let assignments = match self.lotteries.find_by_period(period)? {
            Some(result) => result.assignments_for(resident),
            None => Vec::new(),
        };
        Ok(assignments)
    }

    /// Removes a stored result entirely. Resident-side slot bookkeeping is
    /// owned by the request-management collaborator's deletion path.
    pub fn delete_result(&self, period: Period) -> Result<(), LotteryServiceError> {
        if !self.lotteries.delete_by_period(period)? {
            return Err(LotteryServiceError::ResultNotFound(period));
        }
        info!(%period, "lottery result deleted");
        Ok(())
    }

    /// Carry-forward resolver: the non-winners of the immediately preceding
    /// period. A missing prior result is a normal state (first-ever run or
    /// a gap period) and yields no boosts.
    fn previous_period_non_winners(
        &self,
        period: Period,
    ) -> Result<PriorityBoostSet, LotteryServiceError> {
        let boosts = match self.lotteries.find_by_period(period.previous())? {
            Some(prior) => PriorityBoostSet::from_non_winners(&prior),
            None => PriorityBoostSet::default(),
        };
        Ok(boosts)
    }

    /// Resolves each request's resident (one lookup per id per run) and
    /// scores the pair. Requests whose resident cannot be found are a data
    /// anomaly: logged and skipped, never fatal.
    fn assemble_candidates(
        &self,
        accepted: Vec<ParkingRequest>,
        boosts: &PriorityBoostSet,
    ) -> Result<Vec<Candidate>, LotteryServiceError> {
        let mut cache: HashMap<ResidentId, ResidentSnapshot> = HashMap::new();
        let mut candidates = Vec::with_capacity(accepted.len());

        for request in accepted {
            let snapshot = match cache.get(&request.resident_id) {
                Some(snapshot) => snapshot.clone(),
                None => match self.residents.find(&request.resident_id)? {
                    Some(resident) => {
                        let snapshot = ResidentSnapshot::from(&resident);
                        cache.insert(request.resident_id.clone(), snapshot.clone());
                        snapshot
                    }
                    None => {
                        warn!(
                            resident = %request.resident_id.0,
                            request = %request.id.0,
                            "resident not found for accepted request, skipping"
                        );
                        continue;
                    }
                },
            };

            let score = priority_score(&request, boosts);
            candidates.push(Candidate {
                request,
                resident: snapshot,
                priority_score: score,
            });
        }

        Ok(candidates)
    }

    /// Persists via the repository, translating a storage-level uniqueness
    /// conflict into the same error as the fast-path check so concurrent
    /// executions for one period cannot both succeed.
    fn insert_guarded(
        &self,
        result: AllocationResult,
    ) -> Result<AllocationResult, LotteryServiceError> {
        let period = result.period;
        match self.lotteries.insert(result) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => Err(LotteryServiceError::AlreadyExecuted(period)),
            Err(other) => Err(LotteryServiceError::Repository(other)),
        }
    }

    /// Best-effort result mail: one message per winner and per non-winner.
    /// Failures are logged and never affect the stored result or other
    /// recipients.
    fn dispatch_notifications(&self, result: &AllocationResult) {
        for winner in &result.winners {
            let Some(spot) = winner.spot.as_deref() else {
                continue;
            };
            let subject = format!("You won a parking spot - period {}", result.period);
            let body = format!(
                "Congratulations, {}! Spot {} is yours for your {} (plate {}) during period {}.",
                winner.full_name,
                spot,
                winner.vehicle_category.label(),
                winner.license_plate,
                result.period
            );
            self.send_to(winner, &subject, &body);
        }

        for participant in &result.non_winners {
            let subject = format!("Lottery result - period {}", result.period);
            let body = format!(
                "Unfortunately, {}, no spot could be assigned for your {} (plate {}) during \
                 period {}. You will carry priority into the next draw.",
                participant.full_name,
                participant.vehicle_category.label(),
                participant.license_plate,
                result.period
            );
            self.send_to(participant, &subject, &body);
        }
    }

    fn send_to(&self, participant: &ParticipantOutcome, subject: &str, body: &str) {
        let email = match self.residents.find(&participant.resident_id) {
            Ok(Some(resident)) => resident.email,
            Ok(None) => {
                warn!(
                    resident = %participant.resident_id.0,
                    "no resident record for notification recipient"
                );
                return;
            }
            Err(err) => {
                warn!(
                    resident = %participant.resident_id.0,
                    error = %err,
                    "resident lookup failed for notification recipient"
                );
                return;
            }
        };

        if let Err(err) = self.notifier.notify(&email, subject, body) {
            warn!(recipient = %email, error = %err, "failed to send lottery notification");
        }
    }
}

fn empty_result(period: Period, num_car_spots: u32, num_moto_spots: u32) -> AllocationResult {
    AllocationResult {
        id: None,
        period,
        total_car_spots_offered: num_car_spots,
        total_moto_spots_offered: num_moto_spots,
        winners: Vec::new(),
        non_winners: Vec::new(),
        executed_at: Utc::now(),
    }
}

/// Error raised by the lottery service.
#[derive(Debug, thiserror::Error)]
pub enum LotteryServiceError {
    #[error("a lottery has already been executed for period {0}")]
    AlreadyExecuted(Period),
    #[error("no lottery result exists for period {0}")]
    ResultNotFound(Period),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
