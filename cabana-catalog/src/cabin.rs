use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a cabin. Anything other than `Available` blocks new
/// reservations regardless of calendar overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CabinStatus {
    #[serde(rename = "disponible")]
    Available,
    #[serde(rename = "ocupada")]
    Occupied,
    #[serde(rename = "mantenimiento")]
    Maintenance,
}

impl CabinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinStatus::Available => "disponible",
            CabinStatus::Occupied => "ocupada",
            CabinStatus::Maintenance => "mantenimiento",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "disponible" => Some(CabinStatus::Available),
            "ocupada" => Some(CabinStatus::Occupied),
            "mantenimiento" => Some(CabinStatus::Maintenance),
            _ => None,
        }
    }
}

impl std::fmt::Display for CabinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rentable unit, owned by a team. Read-only from the booking engine's
/// perspective: the engine consults rate, capacity, minimum stay and status
/// but never mutates a cabin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cabin {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub team_id: Uuid,
    /// Nightly rate in currency minor units (centavos).
    pub nightly_rate_centavos: i64,
    pub capacity: u32,
    pub min_stay_nights: u32,
    pub status: CabinStatus,
}

impl Cabin {
    pub fn is_bookable(&self) -> bool {
        self.status == CabinStatus::Available
    }
}
