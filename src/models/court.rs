use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Slot status as stored. The set is open: values this service does not know
/// are kept verbatim and never count as available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlotStatus {
    Available,
    Booked,
    Maintenance,
    Other(String),
}

impl SlotStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
            SlotStatus::Maintenance => "maintenance",
            SlotStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "available" => SlotStatus::Available,
            "booked" => SlotStatus::Booked,
            "maintenance" => SlotStatus::Maintenance,
            other => SlotStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for SlotStatus {
    fn from(s: String) -> Self {
        SlotStatus::parse(&s)
    }
}

impl From<SlotStatus> for String {
    fn from(status: SlotStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub status: SlotStatus,
    #[serde(default)]
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub booking_id: Option<String>,
}

impl ScheduleSlot {
    pub fn available() -> Self {
        Self {
            status: SlotStatus::Available,
            owner_user_id: None,
            booking_id: None,
        }
    }

    pub fn maintenance() -> Self {
        Self {
            status: SlotStatus::Maintenance,
            owner_user_id: None,
            booking_id: None,
        }
    }

    pub fn booked(user_id: &str, booking_id: &str) -> Self {
        Self {
            status: SlotStatus::Booked,
            owner_user_id: Some(user_id.to_string()),
            booking_id: Some(booking_id.to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    /// `booked` carries both references; every other status carries neither.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            SlotStatus::Booked => self.owner_user_id.is_some() && self.booking_id.is_some(),
            _ => self.owner_user_id.is_none() && self.booking_id.is_none(),
        }
    }
}

/// Slots of one court on one date keyed by `HH:MM`. Zero-padded keys make the
/// map's lexicographic order the chronological order.
pub type DailySchedule = BTreeMap<String, ScheduleSlot>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: String,
    pub name: String,
    pub location: String,
    pub surface_type: String,
    pub hourly_rate: Option<f64>,
    pub image_ref: Option<String>,
    /// Keyed by `YYYY-MM-DD`.
    #[serde(default)]
    pub schedules: BTreeMap<String, DailySchedule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourt {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub surface_type: String,
    pub hourly_rate: Option<f64>,
    pub image_ref: Option<String>,
    #[serde(default)]
    pub schedules: BTreeMap<String, DailySchedule>,
}

/// Address of one slot: `courts/{court_id}/schedules/{date}/{start_time}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPath {
    pub court_id: String,
    pub date: String,
    pub start_time: String,
}

impl SlotPath {
    pub fn new(court_id: &str, date: &str, start_time: &str) -> Self {
        Self {
            court_id: court_id.to_string(),
            date: date.to_string(),
            start_time: start_time.to_string(),
        }
    }
}

impl fmt::Display for SlotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "courts/{}/schedules/{}/{}",
            self.court_id, self.date, self.start_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_round_trips_and_is_not_available() {
        let slot: ScheduleSlot = serde_json::from_str(r#"{"status":"closed_for_rain"}"#).unwrap();
        assert_eq!(slot.status, SlotStatus::Other("closed_for_rain".to_string()));
        assert!(!slot.is_available());

        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["status"], "closed_for_rain");
    }

    #[test]
    fn test_slot_consistency() {
        assert!(ScheduleSlot::available().is_consistent());
        assert!(ScheduleSlot::maintenance().is_consistent());
        assert!(ScheduleSlot::booked("u1", "b1").is_consistent());

        let dangling = ScheduleSlot {
            status: SlotStatus::Available,
            owner_user_id: Some("u1".to_string()),
            booking_id: None,
        };
        assert!(!dangling.is_consistent());
    }

    #[test]
    fn test_daily_schedule_iterates_in_time_order() {
        let mut schedule = DailySchedule::new();
        schedule.insert("18:00".to_string(), ScheduleSlot::available());
        schedule.insert("08:00".to_string(), ScheduleSlot::available());
        schedule.insert("10:00".to_string(), ScheduleSlot::maintenance());

        let keys: Vec<_> = schedule.keys().cloned().collect();
        assert_eq!(keys, vec!["08:00", "10:00", "18:00"]);
    }
}
