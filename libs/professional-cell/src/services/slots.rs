use chrono::{Datelike, NaiveDate};

use crate::models::{AvailabilityWindow, BookedAppointment, SlotDuration, SlotTime};

/// Day index used by availability windows: 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// Free slot starts for one professional on `date`.
///
/// Each active window for `day_of_week` is walked from its start in steps of
/// `slot_duration`; a start is kept only when the whole slot fits before the
/// window end and no active booking of that window's professional sits on
/// the exact same minute. Windows that overlap contribute a start once.
/// The result is sorted ascending.
pub fn generate_slots(
    date: NaiveDate,
    day_of_week: i32,
    slot_duration: SlotDuration,
    windows: &[AvailabilityWindow],
    booked: &[BookedAppointment],
) -> Vec<SlotTime> {
    let step = slot_duration.minutes();
    let mut slots = Vec::new();

    for window in windows
        .iter()
        .filter(|w| w.is_active && w.day_of_week == day_of_week)
    {
        let end = SlotTime::from(window.end_time).minute_of_day();
        let mut start = SlotTime::from(window.start_time).minute_of_day();

        while start + step <= end {
            // end < 24:00, so every start here is a valid time of day
            if let Some(candidate) = SlotTime::from_minute_of_day(start) {
                let taken = booked
                    .iter()
                    .any(|apt| apt.blocks(window.professional_id, date, candidate));
                if !taken {
                    slots.push(candidate);
                }
            }
            start += step;
        }
    }

    slots.sort_unstable();
    slots.dedup();
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};
    use uuid::Uuid;

    use crate::models::AppointmentStatus;

    // 2030-01-07 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    fn at(raw: &str) -> NaiveTime {
        NaiveTime::parse_from_str(raw, "%H:%M").unwrap()
    }

    fn window(professional_id: Uuid, day: i32, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow {
            id: Uuid::new_v4(),
            professional_id,
            day_of_week: day,
            start_time: at(start),
            end_time: at(end),
            is_active: true,
            created_at: None,
        }
    }

    fn booking(professional_id: Uuid, date: NaiveDate, time: &str, status: AppointmentStatus) -> BookedAppointment {
        BookedAppointment {
            id: Uuid::new_v4(),
            professional_id,
            date,
            time: at(time),
            status,
        }
    }

    fn minutes(m: i32) -> SlotDuration {
        SlotDuration::try_from(m).unwrap()
    }

    fn render(slots: &[SlotTime]) -> Vec<String> {
        slots.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_day_of_week_sunday_is_zero() {
        assert_eq!(day_of_week(monday()), 1);
        assert_eq!(day_of_week(monday() - Duration::days(1)), 0);
        assert_eq!(day_of_week(monday() + Duration::days(5)), 6);
    }

    #[test]
    fn test_no_windows_yields_empty() {
        let slots = generate_slots(monday(), 1, minutes(30), &[], &[]);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_window_for_other_day_is_ignored() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 2, "08:00", "12:00")];
        assert!(generate_slots(monday(), 1, minutes(30), &windows, &[]).is_empty());
    }

    #[test]
    fn test_single_hour_half_hour_slots() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "08:00", "09:00")];
        let slots = generate_slots(monday(), 1, minutes(30), &windows, &[]);
        assert_eq!(render(&slots), vec!["08:00", "08:30"]);
    }

    #[test]
    fn test_booking_blocks_its_slot() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "08:00", "09:00")];
        let booked = vec![booking(pro, monday(), "08:00", AppointmentStatus::Pending)];
        let slots = generate_slots(monday(), 1, minutes(30), &windows, &booked);
        assert_eq!(render(&slots), vec!["08:30"]);
    }

    #[test]
    fn test_partial_slot_is_dropped() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "08:00", "08:50")];
        let slots = generate_slots(monday(), 1, minutes(30), &windows, &[]);
        assert_eq!(render(&slots), vec!["08:00"]);
    }

    #[test]
    fn test_quarter_hour_granularity() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "08:00", "09:00")];
        let slots = generate_slots(monday(), 1, minutes(15), &windows, &[]);
        assert_eq!(render(&slots), vec!["08:00", "08:15", "08:30", "08:45"]);
    }

    #[test]
    fn test_output_sorted_regardless_of_window_order() {
        let pro = Uuid::new_v4();
        let windows = vec![
            window(pro, 1, "14:00", "15:00"),
            window(pro, 1, "08:00", "09:00"),
        ];
        let slots = generate_slots(monday(), 1, minutes(60), &windows, &[]);
        assert_eq!(render(&slots), vec!["08:00", "14:00"]);
    }

    #[test]
    fn test_overlapping_windows_do_not_duplicate() {
        let pro = Uuid::new_v4();
        let windows = vec![
            window(pro, 1, "08:00", "10:00"),
            window(pro, 1, "09:00", "11:00"),
        ];
        let slots = generate_slots(monday(), 1, minutes(60), &windows, &[]);
        assert_eq!(render(&slots), vec!["08:00", "09:00", "10:00"]);
    }

    #[test]
    fn test_inactive_window_produces_nothing() {
        let pro = Uuid::new_v4();
        let mut inactive = window(pro, 1, "08:00", "09:00");
        inactive.is_active = false;
        assert!(generate_slots(monday(), 1, minutes(30), &[inactive], &[]).is_empty());
    }

    #[test]
    fn test_cancelled_booking_does_not_block() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "08:00", "09:00")];
        let booked = vec![booking(pro, monday(), "08:00", AppointmentStatus::Cancelled)];
        let slots = generate_slots(monday(), 1, minutes(30), &windows, &booked);
        assert_eq!(render(&slots), vec!["08:00", "08:30"]);
    }

    #[test]
    fn test_booking_matches_exact_minute_only() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "08:00", "09:00")];
        let booked = vec![booking(pro, monday(), "08:05", AppointmentStatus::Confirmed)];
        let slots = generate_slots(monday(), 1, minutes(30), &windows, &booked);
        assert_eq!(render(&slots), vec!["08:00", "08:30"]);
    }

    #[test]
    fn test_bookings_of_other_dates_or_professionals_ignored() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "08:00", "09:00")];
        let booked = vec![
            booking(Uuid::new_v4(), monday(), "08:00", AppointmentStatus::Confirmed),
            booking(pro, monday() + Duration::days(7), "08:30", AppointmentStatus::Confirmed),
        ];
        let slots = generate_slots(monday(), 1, minutes(30), &windows, &booked);
        assert_eq!(render(&slots), vec!["08:00", "08:30"]);
    }

    #[test]
    fn test_window_ending_at_last_minute_of_day() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "23:00", "23:59")];
        let slots = generate_slots(monday(), 1, minutes(45), &windows, &[]);
        assert_eq!(render(&slots), vec!["23:00"]);
    }

    #[test]
    fn test_window_to_midnight_loses_final_hour_slot() {
        let pro = Uuid::new_v4();
        let windows = vec![window(pro, 1, "22:00", "23:59")];
        let slots = generate_slots(monday(), 1, minutes(60), &windows, &[]);
        assert_eq!(render(&slots), vec!["22:00"]);
    }
}
