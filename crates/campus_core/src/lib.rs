pub mod directory;
pub mod domain;
pub mod ports;
pub mod providers;
pub mod schedule;
pub mod store;

pub use directory::{BookmarkedLocation, CampusDirectory, LocationWithDistance};
pub use domain::{
    Bookmark, ClassScheduleEntry, ClassScheduleUpdate, Coordinates, DayOfWeek, DomainError,
    EmergencyContact, Language, Location, LocationType, NewClassSchedule, NewNotification,
    Notification, NotificationKind, Preferences, Snapshot, TimeOfDay, User, UserUpdate,
};
pub use ports::{
    AuthProvider, Clock, IdGenerator, LocationDirectory, PortError, PortResult,
    SnapshotRepository, SnapshotSink,
};
pub use providers::{ManualClock, SequentialIdGenerator, SystemClock, UuidIdGenerator};
pub use schedule::RoomAvailability;
pub use store::{AppStore, StoreChange, StoreError, StoreEvent, StoreResult};
