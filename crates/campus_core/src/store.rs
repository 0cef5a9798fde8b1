//! crates/campus_core/src/store.rs
//!
//! The application state store: the single source of truth for preferences,
//! the signed-in session and the user's bookmarks, timetable, notifications and
//! search history.
//!
//! Every mutation updates the in-memory state first, then hands a full snapshot
//! to the attached `SnapshotSink` and notifies subscribers. Mutations that turn
//! out to change nothing do neither.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::{
    Bookmark, ClassScheduleEntry, ClassScheduleUpdate, Language, NewClassSchedule,
    NewNotification, Notification, Preferences, Snapshot, User, UserUpdate,
};
use crate::ports::{Clock, IdGenerator, PortResult, SnapshotRepository, SnapshotSink};
use crate::schedule::{find_conflict, Slot};

/// Maximum number of remembered search queries.
pub const RECENT_SEARCH_LIMIT: usize = 10;

//=========================================================================================
// Errors and Events
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Slot is already taken by class {conflicting_id}")]
    SlotConflict { conflicting_id: String },
    #[error("No user is signed in")]
    NoActiveSession,
    #[error("Invalid class slot: {0}")]
    InvalidSlot(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which slice of the state a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreChange {
    Preferences,
    Session,
    Bookmarks,
    ClassSchedule,
    Notifications,
    RecentSearches,
}

/// Delivered to subscribers after each committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreEvent {
    pub revision: u64,
    pub changes: Vec<StoreChange>,
}

pub type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

//=========================================================================================
// The Store
//=========================================================================================

pub struct AppStore {
    state: Snapshot,
    revision: u64,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    sink: Option<Arc<dyn SnapshotSink>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl AppStore {
    /// An empty store with default preferences.
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self::from_snapshot(Snapshot::default(), clock, ids)
    }

    pub fn from_snapshot(
        snapshot: Snapshot,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            state: snapshot,
            revision: 0,
            clock,
            ids,
            sink: None,
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Loads the last durable snapshot, falling back to an empty store when
    /// nothing was ever saved.
    pub async fn hydrate(
        repository: &dyn SnapshotRepository,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> PortResult<Self> {
        let snapshot = repository.load().await?.unwrap_or_default();
        Ok(Self::from_snapshot(snapshot, clock, ids))
    }

    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, changes: &[StoreChange]) {
        self.revision += 1;
        if let Some(sink) = &self.sink {
            sink.enqueue(self.revision, self.state.clone());
        }
        let event = StoreEvent {
            revision: self.revision,
            changes: changes.to_vec(),
        };
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    // --- Reads ---

    /// Number of committed mutations since this instance was built.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.clone()
    }

    pub fn preferences(&self) -> Preferences {
        self.state.preferences()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.state.bookmarks
    }

    pub fn is_bookmarked(&self, location_id: &str) -> bool {
        self.state
            .bookmarks
            .iter()
            .any(|b| b.location_id == location_id)
    }

    pub fn class_schedule(&self) -> &[ClassScheduleEntry] {
        &self.state.class_schedule
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.state.notifications
    }

    pub fn unread_notification_count(&self) -> usize {
        self.state.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn recent_searches(&self) -> &[String] {
        &self.state.recent_searches
    }

    // --- Preferences ---

    pub fn set_language(&mut self, language: Language) {
        if self.state.language != language {
            self.state.language = language;
            self.commit(&[StoreChange::Preferences]);
        }
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.state.dark_mode = !self.state.dark_mode;
        self.commit(&[StoreChange::Preferences]);
        self.state.dark_mode
    }

    // --- Session ---

    /// Signs `user` in and stamps `last_login`. Signing in as a different user
    /// than the current one drops the previous user's data first.
    pub fn login(&mut self, mut user: User) -> User {
        let mut changes = vec![StoreChange::Session];
        let switching_user = self
            .state
            .user
            .as_ref()
            .is_some_and(|current| self.state.is_authenticated && current.id != user.id);
        if switching_user {
            changes.extend(self.purge_user_data());
        }

        user.last_login = Some(self.clock.now());
        self.state.is_authenticated = true;
        self.state.user = Some(user.clone());
        self.commit(&changes);
        user
    }

    /// Signs out and purges everything that belonged to the departing user.
    /// Preferences are kept.
    pub fn logout(&mut self) {
        let mut changes = vec![StoreChange::Session];
        changes.extend(self.purge_user_data());
        self.state.is_authenticated = false;
        self.state.user = None;
        self.commit(&changes);
    }

    fn purge_user_data(&mut self) -> [StoreChange; 4] {
        self.state.bookmarks.clear();
        self.state.class_schedule.clear();
        self.state.notifications.clear();
        self.state.recent_searches.clear();
        [
            StoreChange::Bookmarks,
            StoreChange::ClassSchedule,
            StoreChange::Notifications,
            StoreChange::RecentSearches,
        ]
    }

    pub fn update_user(&mut self, update: UserUpdate) -> StoreResult<User> {
        if !self.state.is_authenticated {
            return Err(StoreError::NoActiveSession);
        }
        let user = self.state.user.as_mut().ok_or(StoreError::NoActiveSession)?;
        user.apply(update);
        let updated = user.clone();
        self.commit(&[StoreChange::Session]);
        Ok(updated)
    }

    // --- Bookmarks ---

    /// Bookmarks a location. A location is bookmarked at most once; adding it
    /// again returns the existing bookmark unchanged.
    pub fn add_bookmark(&mut self, location_id: &str) -> Bookmark {
        if let Some(existing) = self
            .state
            .bookmarks
            .iter()
            .find(|b| b.location_id == location_id)
        {
            return existing.clone();
        }
        let bookmark = Bookmark {
            id: self.ids.next_id(),
            location_id: location_id.to_string(),
            created_at: self.clock.now(),
        };
        self.state.bookmarks.push(bookmark.clone());
        self.commit(&[StoreChange::Bookmarks]);
        bookmark
    }

    pub fn remove_bookmark(&mut self, id: &str) -> bool {
        let before = self.state.bookmarks.len();
        self.state.bookmarks.retain(|b| b.id != id);
        let removed = self.state.bookmarks.len() != before;
        if removed {
            self.commit(&[StoreChange::Bookmarks]);
        }
        removed
    }

    /// Adds or removes the bookmark for `location_id`; returns whether the
    /// location is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, location_id: &str) -> bool {
        let existing = self
            .state
            .bookmarks
            .iter()
            .find(|b| b.location_id == location_id)
            .map(|b| b.id.clone());
        match existing {
            Some(id) => {
                self.remove_bookmark(&id);
                false
            }
            None => {
                self.add_bookmark(location_id);
                true
            }
        }
    }

    // --- Class schedule ---

    pub fn add_class_schedule(&mut self, entry: NewClassSchedule) -> StoreResult<ClassScheduleEntry> {
        validate_slot(&entry.name, &entry.slot())?;
        if let Some(existing) = find_conflict(&self.state.class_schedule, &entry.slot(), None) {
            return Err(StoreError::SlotConflict {
                conflicting_id: existing.id.clone(),
            });
        }

        let entry = entry.into_entry(self.ids.next_id());
        self.state.class_schedule.push(entry.clone());
        self.commit(&[StoreChange::ClassSchedule]);
        Ok(entry)
    }

    pub fn remove_class_schedule(&mut self, id: &str) -> bool {
        let before = self.state.class_schedule.len();
        self.state.class_schedule.retain(|e| e.id != id);
        let removed = self.state.class_schedule.len() != before;
        if removed {
            self.commit(&[StoreChange::ClassSchedule]);
        }
        removed
    }

    /// Merges `update` into the entry with `id`. Returns `Ok(None)` when no such
    /// entry exists. On error the stored entry is left as it was.
    pub fn update_class_schedule(
        &mut self,
        id: &str,
        update: ClassScheduleUpdate,
    ) -> StoreResult<Option<ClassScheduleEntry>> {
        let Some(index) = self.state.class_schedule.iter().position(|e| e.id == id) else {
            return Ok(None);
        };

        let current = &self.state.class_schedule[index];
        let merged = current.merged(&update);
        if merged == *current {
            return Ok(Some(merged));
        }

        validate_slot(&merged.name, &merged.slot())?;
        if let Some(existing) = find_conflict(&self.state.class_schedule, &merged.slot(), Some(id)) {
            return Err(StoreError::SlotConflict {
                conflicting_id: existing.id.clone(),
            });
        }

        self.state.class_schedule[index] = merged.clone();
        self.commit(&[StoreChange::ClassSchedule]);
        Ok(Some(merged))
    }

    pub fn clear_all_class_schedules(&mut self) {
        if !self.state.class_schedule.is_empty() {
            self.state.class_schedule.clear();
            self.commit(&[StoreChange::ClassSchedule]);
        }
    }

    // --- Notifications ---

    /// Prepends a new unread notification.
    pub fn add_notification(&mut self, notification: NewNotification) -> Notification {
        let notification = Notification {
            id: self.ids.next_id(),
            title: notification.title,
            message: notification.message,
            timestamp: self.clock.now(),
            read: false,
            kind: notification.kind,
            location_id: notification.location_id,
        };
        self.state.notifications.insert(0, notification.clone());
        self.commit(&[StoreChange::Notifications]);
        notification
    }

    pub fn mark_notification_as_read(&mut self, id: &str) -> bool {
        let Some(notification) = self.state.notifications.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if !notification.read {
            notification.read = true;
            self.commit(&[StoreChange::Notifications]);
        }
        true
    }

    /// Returns how many notifications changed from unread to read.
    pub fn mark_all_notifications_as_read(&mut self) -> usize {
        let mut marked = 0;
        for notification in self.state.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            marked += 1;
        }
        if marked > 0 {
            self.commit(&[StoreChange::Notifications]);
        }
        marked
    }

    pub fn clear_notifications(&mut self) {
        if !self.state.notifications.is_empty() {
            self.state.notifications.clear();
            self.commit(&[StoreChange::Notifications]);
        }
    }

    // --- Recent searches ---

    /// Moves `query` to the front of the history, dropping the oldest entry
    /// past [`RECENT_SEARCH_LIMIT`]. Blank queries are ignored.
    pub fn add_recent_search(&mut self, query: &str) {
        if query.trim().is_empty() {
            return;
        }
        if self.state.recent_searches.first().map(String::as_str) == Some(query) {
            return;
        }
        self.state.recent_searches.retain(|q| q != query);
        self.state.recent_searches.insert(0, query.to_string());
        self.state.recent_searches.truncate(RECENT_SEARCH_LIMIT);
        self.commit(&[StoreChange::RecentSearches]);
    }

    pub fn clear_recent_searches(&mut self) {
        if !self.state.recent_searches.is_empty() {
            self.state.recent_searches.clear();
            self.commit(&[StoreChange::RecentSearches]);
        }
    }
}

/// The checks the schedule engine expects callers to have made.
fn validate_slot(name: &str, slot: &Slot<'_>) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidSlot("class name is required".to_string()));
    }
    if slot.room.trim().is_empty() || slot.building.trim().is_empty() {
        return Err(StoreError::InvalidSlot(
            "room and building are required".to_string(),
        ));
    }
    if !slot.is_well_formed() {
        return Err(StoreError::InvalidSlot(format!(
            "start time {} must be before end time {}",
            slot.start, slot.end
        )));
    }
    Ok(())
}
