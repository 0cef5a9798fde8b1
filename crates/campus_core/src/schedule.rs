//! crates/campus_core/src/schedule.rs
//!
//! Pure functions over weekly recurring class slots: day filtering, conflict
//! detection, room availability and the cosmetic label palette.
//!
//! Every function here assumes well-formed intervals (`start < end`). Callers
//! that accept user input reject malformed intervals first; the store does this
//! in `AppStore::add_class_schedule` and `AppStore::update_class_schedule`.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::domain::{ClassScheduleEntry, DayOfWeek, NewClassSchedule, TimeOfDay};

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// A borrowed view of one weekly occupancy: room, building, day and interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a> {
    pub room: &'a str,
    pub building: &'a str,
    pub day: DayOfWeek,
    pub start: &'a TimeOfDay,
    pub end: &'a TimeOfDay,
}

impl Slot<'_> {
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn same_place_and_day(&self, other: &Slot<'_>) -> bool {
        self.day == other.day && self.room == other.room && self.building == other.building
    }

    /// Half-open interval overlap; touching intervals do not overlap.
    pub fn overlaps(&self, other: &Slot<'_>) -> bool {
        self.same_place_and_day(other) && self.start < other.end && other.start < self.end
    }
}

impl ClassScheduleEntry {
    pub fn slot(&self) -> Slot<'_> {
        Slot {
            room: &self.room,
            building: &self.building,
            day: self.day_of_week,
            start: &self.start_time,
            end: &self.end_time,
        }
    }
}

impl NewClassSchedule {
    pub fn slot(&self) -> Slot<'_> {
        Slot {
            room: &self.room,
            building: &self.building,
            day: self.day_of_week,
            start: &self.start_time,
            end: &self.end_time,
        }
    }
}

// ---------------------------------------------------------------------------
// Day and week projection
// ---------------------------------------------------------------------------

/// Entries on `day`, ordered by start time. Entries with equal start times
/// keep their original relative order.
pub fn entries_for_day(entries: &[ClassScheduleEntry], day: DayOfWeek) -> Vec<ClassScheduleEntry> {
    let mut result: Vec<ClassScheduleEntry> = entries
        .iter()
        .filter(|entry| entry.day_of_week == day)
        .cloned()
        .collect();
    result.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    result
}

/// Seven columns, Sunday first, each ordered like [`entries_for_day`].
pub fn week_view(entries: &[ClassScheduleEntry]) -> [Vec<ClassScheduleEntry>; 7] {
    DayOfWeek::ALL.map(|day| entries_for_day(entries, day))
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

/// The first entry (other than `exclude_id`) whose slot overlaps `candidate`.
pub fn find_conflict<'e>(
    entries: &'e [ClassScheduleEntry],
    candidate: &Slot<'_>,
    exclude_id: Option<&str>,
) -> Option<&'e ClassScheduleEntry> {
    entries
        .iter()
        .filter(|entry| Some(entry.id.as_str()) != exclude_id)
        .find(|entry| entry.slot().overlaps(candidate))
}

pub fn has_conflict(
    entries: &[ClassScheduleEntry],
    candidate: &Slot<'_>,
    exclude_id: Option<&str>,
) -> bool {
    find_conflict(entries, candidate, exclude_id).is_some()
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy_until: Option<TimeOfDay>,
    /// Ids of every entry occupying the room at the queried time. Only filled
    /// when more than one entry matched, which means the stored schedule is
    /// double-booked.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overlapping_ids: Vec<String>,
}

impl RoomAvailability {
    pub fn free() -> Self {
        Self {
            available: true,
            busy_until: None,
            overlapping_ids: Vec::new(),
        }
    }

    pub fn is_double_booked(&self) -> bool {
        !self.overlapping_ids.is_empty()
    }
}

/// Whether `room` in `building` is free at `at` on `day`.
///
/// Both interval endpoints count as occupied, so a room is still busy at the
/// minute its class ends.
pub fn room_availability(
    entries: &[ClassScheduleEntry],
    room: &str,
    building: &str,
    day: DayOfWeek,
    at: &TimeOfDay,
) -> RoomAvailability {
    let occupying: Vec<&ClassScheduleEntry> = entries
        .iter()
        .filter(|e| e.day_of_week == day && e.room == room && e.building == building)
        .filter(|e| &e.start_time <= at && at <= &e.end_time)
        .collect();

    let Some(earliest_end) = occupying.iter().map(|e| &e.end_time).min() else {
        return RoomAvailability::free();
    };

    let overlapping_ids = if occupying.len() > 1 {
        occupying.iter().map(|e| e.id.clone()).collect()
    } else {
        Vec::new()
    };

    RoomAvailability {
        available: false,
        busy_until: Some(earliest_end.clone()),
        overlapping_ids,
    }
}

/// Projects a wall-clock instant onto the weekly grid and checks availability.
pub fn room_availability_at(
    entries: &[ClassScheduleEntry],
    room: &str,
    building: &str,
    at: NaiveDateTime,
) -> RoomAvailability {
    let day = DayOfWeek::from_weekday(at.weekday());
    let time = TimeOfDay::from_naive_time(at.time());
    room_availability(entries, room, building, day, &time)
}

// ---------------------------------------------------------------------------
// Timetable grid
// ---------------------------------------------------------------------------

/// One row of the institute's fixed teaching grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: u8,
    pub label: &'static str,
    pub start_time: &'static str,
    pub end_time: &'static str,
    pub is_break: bool,
}

pub const TIME_PERIODS: [Period; 8] = [
    Period { id: 1, label: "Period 1", start_time: "09:15", end_time: "10:15", is_break: false },
    Period { id: 2, label: "Period 2", start_time: "10:15", end_time: "11:15", is_break: false },
    Period { id: 3, label: "Period 3", start_time: "11:15", end_time: "12:15", is_break: false },
    Period { id: 4, label: "Lunch Break", start_time: "12:15", end_time: "13:15", is_break: true },
    Period { id: 5, label: "Period 4", start_time: "13:15", end_time: "14:15", is_break: false },
    Period { id: 6, label: "Period 5", start_time: "14:15", end_time: "15:15", is_break: false },
    Period { id: 7, label: "Period 6", start_time: "15:15", end_time: "16:15", is_break: false },
    Period { id: 8, label: "Period 7", start_time: "16:15", end_time: "17:15", is_break: false },
];

pub fn period_starting_at(start: &TimeOfDay) -> Option<&'static Period> {
    TIME_PERIODS.iter().find(|p| p.start_time == start.as_str())
}

pub fn period_by_id(id: u8) -> Option<&'static Period> {
    TIME_PERIODS.iter().find(|p| p.id == id)
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub const LABEL_PALETTE: [&str; 6] = [
    "#DBEAFE", // blue
    "#D1FAE5", // green
    "#FEF3C7", // yellow
    "#FEE2E2", // red
    "#F3E8FF", // purple
    "#E0F2FE", // light blue
];

/// A swatch from [`LABEL_PALETTE`] picked by a stable hash of `label`, so the
/// same subject is always drawn in the same color.
pub fn color_for_label(label: &str) -> &'static str {
    let hash = label
        .encode_utf16()
        .fold(0i32, |acc, unit| (unit as i32).wrapping_add((acc << 5).wrapping_sub(acc)));
    LABEL_PALETTE[hash.unsigned_abs() as usize % LABEL_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn entry(id: &str, room: &str, day: u8, start: &str, end: &str) -> ClassScheduleEntry {
        ClassScheduleEntry {
            id: id.to_string(),
            name: format!("Class {id}"),
            room: room.to_string(),
            building: "Academic Block A".to_string(),
            start_time: t(start),
            end_time: t(end),
            day_of_week: DayOfWeek::new(day).unwrap(),
            instructor: None,
        }
    }

    fn candidate(room: &str, day: u8, start: &str, end: &str) -> NewClassSchedule {
        NewClassSchedule {
            name: "Candidate".into(),
            room: room.into(),
            building: "Academic Block A".into(),
            start_time: t(start),
            end_time: t(end),
            day_of_week: DayOfWeek::new(day).unwrap(),
            instructor: None,
        }
    }

    // -----------------------------------------------------------------------
    // entries_for_day
    // -----------------------------------------------------------------------

    #[test]
    fn entries_for_day_filters_and_sorts() {
        let entries = vec![
            entry("a", "A101", 1, "14:00", "15:00"),
            entry("b", "A101", 2, "09:00", "10:00"),
            entry("c", "A102", 1, "09:15", "10:15"),
            entry("d", "A103", 1, "11:00", "12:00"),
        ];
        let monday = entries_for_day(&entries, DayOfWeek::MONDAY);
        let ids: Vec<&str> = monday.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c", "d", "a"]);
        assert!(monday.windows(2).all(|w| w[0].start_time <= w[1].start_time));
        // Input order untouched.
        assert_eq!(entries[0].id, "a");
    }

    #[test]
    fn entries_for_empty_day_is_empty() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:00")];
        assert!(entries_for_day(&entries, DayOfWeek::SATURDAY).is_empty());
        assert!(entries_for_day(&[], DayOfWeek::MONDAY).is_empty());
    }

    #[test]
    fn week_view_has_seven_sorted_columns() {
        let entries = vec![
            entry("a", "A101", 1, "11:00", "12:00"),
            entry("b", "A101", 1, "09:00", "10:00"),
            entry("c", "A101", 5, "09:00", "10:00"),
        ];
        let week = week_view(&entries);
        assert_eq!(week[1].len(), 2);
        assert_eq!(week[1][0].id, "b");
        assert_eq!(week[5].len(), 1);
        assert!(week[0].is_empty());
        assert_eq!(week.iter().map(Vec::len).sum::<usize>(), 3);
    }

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------

    #[test]
    fn overlapping_slot_in_same_room_conflicts() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        let overlapping = candidate("A101", 1, "10:00", "11:00");
        assert!(has_conflict(&entries, &overlapping.slot(), None));

        let inside = candidate("A101", 1, "09:15", "09:45");
        assert!(has_conflict(&entries, &inside.slot(), None));

        let identical = candidate("A101", 1, "09:00", "10:30");
        assert_eq!(
            find_conflict(&entries, &identical.slot(), None).map(|e| e.id.as_str()),
            Some("a")
        );
    }

    #[test]
    fn adjacent_slots_do_not_conflict() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        let after = candidate("A101", 1, "10:30", "11:30");
        let before = candidate("A101", 1, "08:00", "09:00");
        assert!(!has_conflict(&entries, &after.slot(), None));
        assert!(!has_conflict(&entries, &before.slot(), None));
    }

    #[test]
    fn different_room_building_or_day_never_conflicts() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        assert!(!has_conflict(&entries, &candidate("A102", 1, "09:00", "10:30").slot(), None));
        assert!(!has_conflict(&entries, &candidate("A101", 2, "09:00", "10:30").slot(), None));

        let mut other_building = candidate("A101", 1, "09:00", "10:30");
        other_building.building = "Science Block".into();
        assert!(!has_conflict(&entries, &other_building.slot(), None));
    }

    #[test]
    fn excluded_id_is_ignored() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        let moved = candidate("A101", 1, "09:30", "11:00");
        assert!(!has_conflict(&entries, &moved.slot(), Some("a")));
        assert!(has_conflict(&entries, &moved.slot(), Some("zzz")));
    }

    #[test]
    fn slot_well_formedness() {
        assert!(candidate("A101", 1, "09:00", "10:00").slot().is_well_formed());
        assert!(!candidate("A101", 1, "10:00", "10:00").slot().is_well_formed());
        assert!(!candidate("A101", 1, "11:00", "10:00").slot().is_well_formed());
    }

    // -----------------------------------------------------------------------
    // Availability
    // -----------------------------------------------------------------------

    #[test]
    fn room_busy_during_class_and_free_after() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        let busy = room_availability(&entries, "A101", "Academic Block A", DayOfWeek::MONDAY, &t("09:30"));
        assert!(!busy.available);
        assert_eq!(busy.busy_until, Some(t("10:30")));
        assert!(!busy.is_double_booked());

        let free = room_availability(&entries, "A101", "Academic Block A", DayOfWeek::MONDAY, &t("11:00"));
        assert_eq!(free, RoomAvailability::free());
    }

    #[test]
    fn availability_endpoints_are_inclusive() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        for at in ["09:00", "10:30"] {
            let result = room_availability(&entries, "A101", "Academic Block A", DayOfWeek::MONDAY, &t(at));
            assert!(!result.available, "room should be busy at {at}");
        }
        let before = room_availability(&entries, "A101", "Academic Block A", DayOfWeek::MONDAY, &t("08:59"));
        assert!(before.available);
    }

    #[test]
    fn availability_ignores_other_days_and_rooms() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        assert!(room_availability(&entries, "A101", "Academic Block A", DayOfWeek::TUESDAY, &t("09:30")).available);
        assert!(room_availability(&entries, "A102", "Academic Block A", DayOfWeek::MONDAY, &t("09:30")).available);
    }

    #[test]
    fn double_booked_room_reports_earliest_end_and_all_ids() {
        let entries = vec![
            entry("late", "A101", 1, "09:00", "11:00"),
            entry("early", "A101", 1, "09:30", "10:00"),
        ];
        let result = room_availability(&entries, "A101", "Academic Block A", DayOfWeek::MONDAY, &t("09:45"));
        assert!(!result.available);
        assert_eq!(result.busy_until, Some(t("10:00")));
        assert_eq!(result.overlapping_ids, ["late", "early"]);
        assert!(result.is_double_booked());
    }

    #[test]
    fn availability_at_projects_wall_clock_onto_week() {
        let entries = vec![entry("a", "A101", 1, "09:00", "10:30")];
        // 2024-03-04 is a Monday.
        let monday_morning = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 30, 42)
            .unwrap();
        let result = room_availability_at(&entries, "A101", "Academic Block A", monday_morning);
        assert_eq!(result.busy_until, Some(t("10:30")));

        let next_day = monday_morning + chrono::Duration::days(1);
        assert!(room_availability_at(&entries, "A101", "Academic Block A", next_day).available);
    }

    // -----------------------------------------------------------------------
    // Timetable grid and colors
    // -----------------------------------------------------------------------

    #[test]
    fn periods_are_contiguous_with_one_break() {
        assert!(TIME_PERIODS.windows(2).all(|w| w[0].end_time == w[1].start_time));
        assert_eq!(TIME_PERIODS.iter().filter(|p| p.is_break).count(), 1);
        assert_eq!(period_starting_at(&t("12:15")).map(|p| p.label), Some("Lunch Break"));
        assert_eq!(period_by_id(2).map(|p| p.start_time), Some("10:15"));
        assert!(period_starting_at(&t("09:00")).is_none());
    }

    #[test]
    fn color_is_deterministic_and_from_palette() {
        let first = color_for_label("Data Structures and Algorithms");
        let second = color_for_label("Data Structures and Algorithms");
        assert_eq!(first, second);
        assert!(LABEL_PALETTE.contains(&first));
        assert!(LABEL_PALETTE.contains(&color_for_label("")));
        assert!(LABEL_PALETTE.contains(&color_for_label("भौतिकी")));
    }
}
