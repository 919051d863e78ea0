use cabana_shared::pii::Masked;
use cabana_shared::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a reservation. Wire names are the original marketplace
/// vocabulary and double as the database representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReservationStatus {
    #[serde(rename = "pendiente")]
    PendingPayment,
    #[serde(rename = "confirmada")]
    Confirmed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::PendingPayment => "pendiente",
            ReservationStatus::Confirmed => "confirmada",
            ReservationStatus::Cancelled => "cancelada",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pendiente" => Some(ReservationStatus::PendingPayment),
            "confirmada" => Some(ReservationStatus::Confirmed),
            "cancelada" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }

    /// Statuses that block the calendar: a cabin date is taken while a
    /// reservation over it is pending payment or confirmed.
    pub fn blocks_calendar(&self) -> bool {
        matches!(
            self,
            ReservationStatus::PendingPayment | ReservationStatus::Confirmed
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable reservation record. Created once by the lifecycle manager and
/// mutated only through its status transitions; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub cabin_id: Uuid,
    pub customer_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub notes: Masked<String>,
    /// Server-computed total in currency minor units.
    pub total_centavos: i64,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn range(&self) -> DateRange {
        // Invariant check_in < check_out is enforced at creation time.
        DateRange::new(self.check_in, self.check_out)
            .expect("stored reservation has check_in < check_out")
    }
}

/// What a guest asks for. Ephemeral; validated against the cabin before any
/// write happens.
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationRequest {
    pub cabin_id: Uuid,
    pub customer_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub notes: String,
    /// Client-side estimate. Advisory only: the server recomputes the total
    /// from its own rate and ignores this value for pricing.
    pub quoted_total_centavos: Option<i64>,
}

impl ReservationRequest {
    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.check_in, self.check_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names_round_trip() {
        for status in [
            ReservationStatus::PendingPayment,
            ReservationStatus::Confirmed,
            ReservationStatus::Cancelled,
        ] {
            let as_json = serde_json::to_string(&status).unwrap();
            let back: ReservationStatus = serde_json::from_str(&as_json).unwrap();
            assert_eq!(back, status);
            assert_eq!(ReservationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_string(&ReservationStatus::PendingPayment).unwrap(),
            "\"pendiente\""
        );
    }

    #[test]
    fn test_calendar_blocking_statuses() {
        assert!(ReservationStatus::PendingPayment.blocks_calendar());
        assert!(ReservationStatus::Confirmed.blocks_calendar());
        assert!(!ReservationStatus::Cancelled.blocks_calendar());
    }
}
