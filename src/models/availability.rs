use serde::Serialize;

use crate::models::{Court, DailySchedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilitySummary {
    pub free_slot_count: usize,
    pub is_available: bool,
}

/// A court as the listing shows it for one date.
#[derive(Debug, Clone, Serialize)]
pub struct CourtAvailability {
    #[serde(flatten)]
    pub court: Court,
    pub date: String,
    #[serde(flatten)]
    pub availability: AvailabilitySummary,
}

impl AvailabilitySummary {
    pub fn for_schedule(schedule: Option<&DailySchedule>) -> Self {
        let free_slot_count = schedule
            .map(|slots| slots.values().filter(|slot| slot.is_available()).count())
            .unwrap_or(0);

        Self {
            free_slot_count,
            is_available: free_slot_count > 0,
        }
    }
}

/// Free slots of `court` on `date`. Always derived from the schedule passed
/// in, never stored.
pub fn compute_availability(court: &Court, date: &str) -> AvailabilitySummary {
    AvailabilitySummary::for_schedule(court.schedules.get(date))
}

pub fn with_availability(courts: Vec<Court>, date: &str) -> Vec<CourtAvailability> {
    courts
        .into_iter()
        .map(|court| {
            let availability = compute_availability(&court, date);
            CourtAvailability {
                court,
                date: date.to_string(),
                availability,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;
    use crate::models::{ScheduleSlot, SlotStatus};

    fn court_with(date: &str, schedule: DailySchedule) -> Court {
        let mut schedules = BTreeMap::new();
        schedules.insert(date.to_string(), schedule);
        Court {
            id: "c1".to_string(),
            name: "Central".to_string(),
            location: "Norte".to_string(),
            surface_type: "clay".to_string(),
            hourly_rate: Some(15.0),
            image_ref: None,
            schedules,
        }
    }

    #[test]
    fn test_absent_schedule_is_unavailable() {
        let court = court_with("2024-08-15", DailySchedule::new());
        let summary = compute_availability(&court, "2024-08-16");
        assert_eq!(summary.free_slot_count, 0);
        assert!(!summary.is_available);
    }

    #[test]
    fn test_counts_only_available_slots() {
        let mut schedule = DailySchedule::new();
        schedule.insert("09:00".to_string(), ScheduleSlot::available());
        schedule.insert("10:00".to_string(), ScheduleSlot::booked("u1", "b1"));
        schedule.insert("11:00".to_string(), ScheduleSlot::maintenance());
        schedule.insert(
            "12:00".to_string(),
            ScheduleSlot {
                status: SlotStatus::Other("reserved_for_club".to_string()),
                owner_user_id: None,
                booking_id: None,
            },
        );
        schedule.insert("13:00".to_string(), ScheduleSlot::available());

        let court = court_with("2024-08-15", schedule);
        let summary = compute_availability(&court, "2024-08-15");
        assert_eq!(summary.free_slot_count, 2);
        assert!(summary.is_available);
    }

    #[test]
    fn test_listing_flattens_court_and_summary() {
        let mut schedule = DailySchedule::new();
        schedule.insert("09:00".to_string(), ScheduleSlot::available());
        let listed = with_availability(vec![court_with("2024-08-15", schedule)], "2024-08-15");

        let json = serde_json::to_value(&listed[0]).unwrap();
        assert_eq!(json["id"], "c1");
        assert_eq!(json["free_slot_count"], 1);
        assert_eq!(json["is_available"], true);
    }

    fn arb_status() -> impl Strategy<Value = SlotStatus> {
        prop_oneof![
            Just(SlotStatus::Available),
            Just(SlotStatus::Booked),
            Just(SlotStatus::Maintenance),
            "[a-z]{1,6}".prop_map(|s| SlotStatus::parse(&s)),
        ]
    }

    proptest! {
        #[test]
        fn free_count_matches_available_slots(
            statuses in proptest::collection::vec(arb_status(), 0..24),
        ) {
            let mut schedule = DailySchedule::new();
            for (hour, status) in statuses.iter().enumerate() {
                schedule.insert(
                    format!("{hour:02}:00"),
                    ScheduleSlot { status: status.clone(), owner_user_id: None, booking_id: None },
                );
            }
            let expected = statuses.iter().filter(|s| **s == SlotStatus::Available).count();

            let summary = AvailabilitySummary::for_schedule(Some(&schedule));
            prop_assert_eq!(summary.free_slot_count, expected);
            prop_assert_eq!(summary.is_available, expected > 0);
        }
    }
}
