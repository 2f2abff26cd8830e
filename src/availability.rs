//! Day availability: splitting a provider's hours into morning and afternoon
//! and turning a picked hour into an appointment timestamp.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};

use crate::constants::AFTERNOON_START_HOUR;
use crate::models::AvailabilitySlot;

/// An hour ready for display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HourSlot {
    pub hour: u8,
    pub available: bool,
    pub label: String,
}

impl HourSlot {
    fn new(hour: u8, available: bool) -> Self {
        HourSlot {
            hour,
            available,
            label: format_hour(hour),
        }
    }
}

/// Availability of one provider on one day, split at noon
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DayAvailability {
    pub morning: Vec<HourSlot>,
    pub afternoon: Vec<HourSlot>,
}

impl DayAvailability {
    /// Keeps the server's ordering inside each bucket. Hours outside 0..=23
    /// are dropped.
    pub fn partition(slots: &[AvailabilitySlot]) -> Self {
        let mut day = DayAvailability::default();
        for slot in slots {
            let Some(hour) = u8::try_from(slot.hour).ok().filter(|h| *h <= 23) else {
                tracing::warn!(hour = slot.hour, "Ignoring availability slot with invalid hour");
                continue;
            };
            let hour_slot = HourSlot::new(hour, slot.available);
            if hour < AFTERNOON_START_HOUR {
                day.morning.push(hour_slot);
            } else {
                day.afternoon.push(hour_slot);
            }
        }
        day
    }

    pub fn is_empty(&self) -> bool {
        self.morning.is_empty() && self.afternoon.is_empty()
    }

    pub fn is_available(&self, hour: u8) -> bool {
        self.slots().any(|s| s.hour == hour && s.available)
    }

    /// All slots, morning first
    pub fn slots(&self) -> impl Iterator<Item = &HourSlot> {
        self.morning.iter().chain(self.afternoon.iter())
    }

    /// Bookable hours in display order
    pub fn available_hours(&self) -> Vec<u8> {
        self.slots().filter(|s| s.available).map(|s| s.hour).collect()
    }

    /// The bookable hour after `current`, wrapping around; the first one when nothing is picked
    pub fn next_available(&self, current: Option<u8>) -> Option<u8> {
        let hours = self.available_hours();
        match current.and_then(|h| hours.iter().position(|&x| x == h)) {
            Some(i) => hours.get((i + 1) % hours.len()).copied(),
            None => hours.first().copied(),
        }
    }

    /// The bookable hour before `current`, wrapping around; the last one when nothing is picked
    pub fn prev_available(&self, current: Option<u8>) -> Option<u8> {
        let hours = self.available_hours();
        match current.and_then(|h| hours.iter().position(|&x| x == h)) {
            Some(0) => hours.last().copied(),
            Some(i) => hours.get(i - 1).copied(),
            None => hours.last().copied(),
        }
    }
}

/// `9` -> `"09:00"`
pub fn format_hour(hour: u8) -> String {
    format!("{:02}:00", hour)
}

/// Query parameters for the day-availability endpoint (month is 1-based)
pub fn day_query(date: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("year", date.year().to_string()),
        ("month", date.month().to_string()),
        ("day", date.day().to_string()),
    ]
}

/// Local timestamp at the start of `hour` on `date`
pub fn appointment_datetime(date: NaiveDate, hour: u8) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(u32::from(hour), 0, 0)?;
    Local.from_local_datetime(&naive).earliest()
}
