//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::service::StoreService;
use campus_core::ports::{AuthProvider, Clock, LocationDirectory};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StoreService>,
    pub directory: Arc<dyn LocationDirectory>,
    pub auth: Arc<dyn AuthProvider>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl AppState {
    /// The current campus wall-clock time, used to place "now" on the weekly
    /// timetable.
    pub fn campus_now(&self) -> NaiveDateTime {
        let now = self.clock.now();
        match self.config.campus_utc_offset {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.with_timezone(&Local).naive_local(),
        }
    }
}
