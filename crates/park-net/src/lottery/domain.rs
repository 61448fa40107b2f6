use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Year-month token identifying one lottery cycle, e.g. `2025-07`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(0..=9999).contains(&year) {
            return Err(PeriodError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub const fn year(self) -> i32 {
        self.year
    }

    pub const fn month(self) -> u32 {
        self.month
    }

    /// The immediately preceding calendar month, rolling January back into
    /// December of the prior year.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (year, month) = raw.split_once('-').ok_or(PeriodError::InvalidFormat)?;
        if year.len() != 4
            || month.len() != 2
            || !year.bytes().all(|b| b.is_ascii_digit())
            || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PeriodError::InvalidFormat);
        }

        let year = year.parse().map_err(|_| PeriodError::InvalidFormat)?;
        let month = month.parse().map_err(|_| PeriodError::InvalidFormat)?;
        Self::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Rejection for malformed period tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("period must match YYYY-MM")]
    InvalidFormat,
    #[error("period year {0} is outside 0000-9999")]
    YearOutOfRange(i32),
    #[error("period month {0} is outside 01-12")]
    MonthOutOfRange(u32),
}

/// Vehicle categories a spot can be drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Car,
    Motorcycle,
}

impl VehicleCategory {
    pub const fn label(self) -> &'static str {
        match self {
            VehicleCategory::Car => "car",
            VehicleCategory::Motorcycle => "motorcycle",
        }
    }
}

/// Identifier wrapper for parking requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Identifier wrapper for residents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidentId(pub String);

/// An accepted parking request eligible for one lottery cycle.
///
/// Created by the request-management collaborator; the engine only reads it.
/// Identity fields are denormalized copies carried by the upstream record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingRequest {
    pub id: RequestId,
    pub resident_id: ResidentId,
    pub resident_identity_number: String,
    pub resident_full_name: String,
    pub vehicle_category: VehicleCategory,
    pub license_plate: String,
    pub disability_priority: bool,
    pub dues_paid: bool,
    pub period: Period,
}

/// Resident record as exposed by the resident-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub identity_number: String,
    pub full_name: String,
    pub apartment: String,
    pub email: String,
}

/// Resident identity captured at scoring time, decoupled from later
/// mutation of the resident record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentSnapshot {
    pub id: ResidentId,
    pub identity_number: String,
    pub full_name: String,
    pub apartment: String,
}

impl From<&Resident> for ResidentSnapshot {
    fn from(resident: &Resident) -> Self {
        Self {
            id: resident.id.clone(),
            identity_number: resident.identity_number.clone(),
            full_name: resident.full_name.clone(),
            apartment: resident.apartment.clone(),
        }
    }
}

/// Scoring-time composite of a request and its resident snapshot. Once
/// computed, the score never changes for the rest of the run.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub request: ParkingRequest,
    pub resident: ResidentSnapshot,
    pub priority_score: i32,
}

impl Candidate {
    /// Denormalized winner/non-winner row for the allocation record.
    pub fn outcome(&self, spot: Option<String>) -> ParticipantOutcome {
        ParticipantOutcome {
            resident_id: self.resident.id.clone(),
            identity_number: self.resident.identity_number.clone(),
            full_name: self.resident.full_name.clone(),
            apartment: self.resident.apartment.clone(),
            vehicle_category: self.request.vehicle_category,
            license_plate: self.request.license_plate.clone(),
            spot,
            request_id: self.request.id.clone(),
        }
    }
}

/// One participant's outcome inside a stored allocation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantOutcome {
    pub resident_id: ResidentId,
    pub identity_number: String,
    pub full_name: String,
    pub apartment: String,
    pub vehicle_category: VehicleCategory,
    pub license_plate: String,
    pub spot: Option<String>,
    pub request_id: RequestId,
}

/// Immutable record of one lottery run. At most one exists per period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub id: Option<String>,
    pub period: Period,
    pub total_car_spots_offered: u32,
    pub total_moto_spots_offered: u32,
    pub winners: Vec<ParticipantOutcome>,
    pub non_winners: Vec<ParticipantOutcome>,
    pub executed_at: DateTime<Utc>,
}

impl AllocationResult {
    /// Narrows the winner list to one vehicle category. Non-winners are
    /// never filtered by a category query.
    pub fn narrowed_to(mut self, category: VehicleCategory) -> Self {
        self.winners
            .retain(|winner| winner.vehicle_category == category);
        self
    }

    /// Winning entries belonging to one resident. A resident can hold at
    /// most one per vehicle category.
    pub fn assignments_for(&self, resident: &ResidentId) -> Vec<Assignment> {
        self.winners
            .iter()
            .filter(|winner| &winner.resident_id == resident)
            .filter_map(|winner| {
                winner.spot.clone().map(|spot| Assignment {
                    period: self.period,
                    vehicle_category: winner.vehicle_category,
                    license_plate: winner.license_plate.clone(),
                    spot,
                })
            })
            .collect()
    }
}

/// Resident-facing view of one winning entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub period: Period,
    pub vehicle_category: VehicleCategory,
    pub license_plate: String,
    pub spot: String,
}
