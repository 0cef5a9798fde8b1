//! crates/campus_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Field names serialize in camelCase so a persisted snapshot reads the same
//! way the mobile client has always stored it.

use chrono::{DateTime, NaiveTime, Timelike, Utc, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Current layout version of [`Snapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

static HH_MM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid regex"));

/// Errors raised when constructing validated domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("'{0}' is not a zero-padded 24-hour HH:MM time")]
    InvalidTime(String),
    #[error("day of week must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidDay(u8),
}

//=========================================================================================
// Time and Day Values
//=========================================================================================

/// A wall-clock time of day in zero-padded `HH:MM` form.
///
/// Because the representation is fixed-width, ordering the underlying string
/// is the same as ordering the times chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(String);

impl TimeOfDay {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if HH_MM.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(DomainError::InvalidTime(value.to_string()))
        }
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(format!("{hour:02}:{minute:02}")))
    }

    /// Truncates a `NaiveTime` to minute granularity.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self(format!("{:02}:{:02}", time.hour(), time.minute()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        let (hours, minutes) = self.0.split_at(2);
        let hours: u16 = hours.parse().unwrap_or(0);
        let minutes: u16 = minutes[1..].parse().unwrap_or(0);
        hours * 60 + minutes
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.0
    }
}

impl FromStr for TimeOfDay {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A day of the week, 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const SUNDAY: Self = Self(0);
    pub const MONDAY: Self = Self(1);
    pub const TUESDAY: Self = Self(2);
    pub const WEDNESDAY: Self = Self(3);
    pub const THURSDAY: Self = Self(4);
    pub const FRIDAY: Self = Self(5);
    pub const SATURDAY: Self = Self(6);

    pub const ALL: [Self; 7] = [
        Self::SUNDAY,
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
        Self::SATURDAY,
    ];

    /// The teaching days shown on the timetable grid.
    pub const WEEKDAYS: [Self; 5] = [
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
    ];

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if value <= 6 {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidDay(value))
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self(weekday.num_days_from_sunday() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        const NAMES: [&str; 7] = [
            "Sunday",
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
        ];
        NAMES[self.index()]
    }

    pub fn short_name(self) -> &'static str {
        &self.name()[..3]
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(value: DayOfWeek) -> Self {
        value.0
    }
}

//=========================================================================================
// Campus Reference Data
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Classroom,
    Lab,
    Office,
    Library,
    Cafeteria,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A place on campus. Seeded reference data, never edited by users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(rename = "type")]
    pub kind: LocationType,
}

//=========================================================================================
// User Data
//=========================================================================================

/// A weekly recurring class occupying one room for one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScheduleEntry {
    pub id: String,
    pub name: String,
    pub room: String,
    pub building: String,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub day_of_week: DayOfWeek,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
}

/// The fields of a class schedule entry before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassSchedule {
    pub name: String,
    pub room: String,
    pub building: String,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub day_of_week: DayOfWeek,
    #[serde(default)]
    pub instructor: Option<String>,
}

impl NewClassSchedule {
    pub fn into_entry(self, id: String) -> ClassScheduleEntry {
        ClassScheduleEntry {
            id,
            name: self.name,
            room: self.room,
            building: self.building,
            start_time: self.start_time,
            end_time: self.end_time,
            day_of_week: self.day_of_week,
            instructor: self.instructor,
        }
    }
}

/// A partial edit of a class schedule entry. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScheduleUpdate {
    pub name: Option<String>,
    pub room: Option<String>,
    pub building: Option<String>,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub day_of_week: Option<DayOfWeek>,
    pub instructor: Option<String>,
}

impl ClassScheduleEntry {
    /// Returns a copy of this entry with the update merged in.
    pub fn merged(&self, update: &ClassScheduleUpdate) -> ClassScheduleEntry {
        ClassScheduleEntry {
            id: self.id.clone(),
            name: update.name.clone().unwrap_or_else(|| self.name.clone()),
            room: update.room.clone().unwrap_or_else(|| self.room.clone()),
            building: update.building.clone().unwrap_or_else(|| self.building.clone()),
            start_time: update
                .start_time
                .clone()
                .unwrap_or_else(|| self.start_time.clone()),
            end_time: update.end_time.clone().unwrap_or_else(|| self.end_time.clone()),
            day_of_week: update.day_of_week.unwrap_or(self.day_of_week),
            instructor: update.instructor.clone().or_else(|| self.instructor.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub location_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Class,
    Event,
    Alert,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

/// The caller-supplied part of a notification; id, timestamp and read flag
/// are filled in by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

// Represents the signed-in student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub roll_number: String,
    pub email: String,
    pub course: String,
    pub branch: String,
    pub semester: u8,
    pub year: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    pub joined_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Profile fields a signed-in user may edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub course: Option<String>,
    pub branch: Option<String>,
    pub semester: Option<u8>,
    pub year: Option<u8>,
    pub profile_photo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

impl User {
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(course) = update.course {
            self.course = course;
        }
        if let Some(branch) = update.branch {
            self.branch = branch;
        }
        if let Some(semester) = update.semester {
            self.semester = semester;
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if update.profile_photo.is_some() {
            self.profile_photo = update.profile_photo;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if update.address.is_some() {
            self.address = update.address;
        }
        if update.emergency_contact.is_some() {
            self.emergency_contact = update.emergency_contact;
        }
    }
}

//=========================================================================================
// Preferences and Snapshot
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub language: Language,
    pub dark_mode: bool,
}

/// The full persisted state of the application store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub version: u32,
    pub language: Language,
    pub dark_mode: bool,
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub bookmarks: Vec<Bookmark>,
    pub class_schedule: Vec<ClassScheduleEntry>,
    pub notifications: Vec<Notification>,
    pub recent_searches: Vec<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            language: Language::default(),
            dark_mode: false,
            is_authenticated: false,
            user: None,
            bookmarks: Vec::new(),
            class_schedule: Vec::new(),
            notifications: Vec::new(),
            recent_searches: Vec::new(),
        }
    }
}

impl Snapshot {
    pub fn preferences(&self) -> Preferences {
        Preferences {
            language: self.language,
            dark_mode: self.dark_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_accepts_zero_padded_times() {
        assert!(TimeOfDay::parse("00:00").is_ok());
        assert!(TimeOfDay::parse("09:15").is_ok());
        assert!(TimeOfDay::parse("23:59").is_ok());
    }

    #[test]
    fn time_of_day_rejects_unpadded_or_out_of_range() {
        for bad in ["9:15", "24:00", "12:60", "12-30", "", "12:3", " 12:30"] {
            assert_eq!(
                TimeOfDay::parse(bad),
                Err(DomainError::InvalidTime(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn time_of_day_orders_chronologically() {
        let early = TimeOfDay::parse("09:15").unwrap();
        let late = TimeOfDay::parse("13:05").unwrap();
        assert!(early < late);
        assert_eq!(late.minutes_since_midnight(), 13 * 60 + 5);
    }

    #[test]
    fn time_of_day_from_naive_time_truncates_seconds() {
        let t = NaiveTime::from_hms_opt(7, 4, 59).unwrap();
        assert_eq!(TimeOfDay::from_naive_time(t).as_str(), "07:04");
    }

    #[test]
    fn time_of_day_deserialize_validates() {
        let ok: TimeOfDay = serde_json::from_str("\"10:30\"").unwrap();
        assert_eq!(ok.as_str(), "10:30");
        assert!(serde_json::from_str::<TimeOfDay>("\"1:30\"").is_err());
    }

    #[test]
    fn day_of_week_bounds() {
        assert!(DayOfWeek::new(6).is_ok());
        assert_eq!(DayOfWeek::new(7), Err(DomainError::InvalidDay(7)));
        assert!(serde_json::from_str::<DayOfWeek>("9").is_err());
    }

    #[test]
    fn day_of_week_names_and_weekday_conversion() {
        assert_eq!(DayOfWeek::from_weekday(Weekday::Sun), DayOfWeek::SUNDAY);
        assert_eq!(DayOfWeek::from_weekday(Weekday::Mon).name(), "Monday");
        assert_eq!(DayOfWeek::THURSDAY.short_name(), "Thu");
    }

    #[test]
    fn merged_update_keeps_untouched_fields() {
        let entry = ClassScheduleEntry {
            id: "c1".into(),
            name: "Calculus II".into(),
            room: "S202".into(),
            building: "Science Block".into(),
            start_time: TimeOfDay::parse("11:00").unwrap(),
            end_time: TimeOfDay::parse("12:30").unwrap(),
            day_of_week: DayOfWeek::MONDAY,
            instructor: Some("Dr. Patel".into()),
        };
        let update = ClassScheduleUpdate {
            room: Some("S203".into()),
            ..Default::default()
        };
        let merged = entry.merged(&update);
        assert_eq!(merged.room, "S203");
        assert_eq!(merged.name, entry.name);
        assert_eq!(merged.instructor, entry.instructor);
        assert_eq!(merged.id, "c1");
    }

    #[test]
    fn snapshot_uses_camel_case_keys_and_type_tags() {
        let mut snapshot = Snapshot::default();
        snapshot.notifications.push(Notification {
            id: "n1".into(),
            title: "Room change".into(),
            message: "Moved to A203".into(),
            timestamp: DateTime::parse_from_rfc3339("2024-03-04T09:00:00.123Z")
                .unwrap()
                .with_timezone(&Utc),
            read: false,
            kind: NotificationKind::Class,
            location_id: None,
        });
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["darkMode"], false);
        assert_eq!(json["isAuthenticated"], false);
        assert_eq!(json["notifications"][0]["type"], "class");
        assert_eq!(json["language"], "en");
    }

    #[test]
    fn snapshot_missing_fields_fall_back_to_defaults() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"language":"hi"}"#).unwrap();
        assert_eq!(snapshot.language, Language::Hi);
        assert!(snapshot.bookmarks.is_empty());
        assert!(!snapshot.is_authenticated);
    }
}
