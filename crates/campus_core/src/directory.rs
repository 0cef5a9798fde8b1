//! crates/campus_core/src/directory.rs
//!
//! The seeded campus location catalogue and the lookups built on top of it:
//! search, nearest-first listing, bookmark resolution and per-location room
//! availability.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{Bookmark, ClassScheduleEntry, Coordinates, Location, LocationType};
use crate::ports::LocationDirectory;
use crate::schedule::{room_availability_at, RoomAvailability};

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const DEFAULT_NEARBY_LIMIT: usize = 5;

/// Campus centre, used when the device position is unknown.
pub const CAMPUS_CENTER: Coordinates = Coordinates {
    latitude: 30.6631,
    longitude: 76.7278,
};

/// The in-memory campus catalogue.
#[derive(Debug, Clone)]
pub struct CampusDirectory {
    locations: Vec<Location>,
}

impl CampusDirectory {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// The bundled campus map.
    pub fn seeded() -> Self {
        Self::new(seed_locations())
    }
}

impl Default for CampusDirectory {
    fn default() -> Self {
        Self::seeded()
    }
}

impl LocationDirectory for CampusDirectory {
    fn get_location_by_id(&self, id: &str) -> Option<Location> {
        self.locations.iter().find(|l| l.id == id).cloned()
    }

    fn search_locations(&self, query: &str) -> Vec<Location> {
        let needle = query.to_lowercase();
        let contains = |field: Option<&String>| {
            field.is_some_and(|value| value.to_lowercase().contains(&needle))
        };
        self.locations
            .iter()
            .filter(|l| {
                l.name.to_lowercase().contains(&needle)
                    || contains(l.description.as_ref())
                    || contains(l.building.as_ref())
                    || contains(l.room_number.as_ref())
            })
            .cloned()
            .collect()
    }

    fn all_locations(&self) -> Vec<Location> {
        self.locations.clone()
    }
}

//=========================================================================================
// Distance
//=========================================================================================

/// Great-circle distance in metres (haversine).
pub fn distance_m(from: Coordinates, to: Coordinates) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = (to.latitude - from.latitude).to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// `"120m"` under a kilometre, `"1.2km"` otherwise.
pub fn format_distance(metres: f64) -> String {
    if metres < 1000.0 {
        format!("{}m", metres.round() as i64)
    } else {
        format!("{:.1}km", metres / 1000.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationWithDistance {
    #[serde(flatten)]
    pub location: Location,
    pub distance: f64,
}

/// Locations closest to `from` first, at most `limit` of them. Without a
/// position the directory order is kept and distances are reported as zero.
pub fn nearby_locations(
    directory: &dyn LocationDirectory,
    from: Option<Coordinates>,
    limit: usize,
) -> Vec<LocationWithDistance> {
    let locations = directory.all_locations();
    let Some(from) = from else {
        return locations
            .into_iter()
            .take(limit)
            .map(|location| LocationWithDistance {
                location,
                distance: 0.0,
            })
            .collect();
    };

    let mut with_distance: Vec<LocationWithDistance> = locations
        .into_iter()
        .map(|location| LocationWithDistance {
            distance: distance_m(from, location.coordinates),
            location,
        })
        .collect();
    with_distance.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    with_distance.truncate(limit);
    with_distance
}

//=========================================================================================
// Joins against user data
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkedLocation {
    pub bookmark: Bookmark,
    pub location: Location,
}

/// Pairs each bookmark with its location, dropping bookmarks whose location no
/// longer exists.
pub fn resolve_bookmarks(
    directory: &dyn LocationDirectory,
    bookmarks: &[Bookmark],
) -> Vec<BookmarkedLocation> {
    bookmarks
        .iter()
        .filter_map(|bookmark| {
            directory
                .get_location_by_id(&bookmark.location_id)
                .map(|location| BookmarkedLocation {
                    bookmark: bookmark.clone(),
                    location,
                })
        })
        .collect()
}

/// Availability of the room a location refers to. `None` when the location is
/// unknown or is not a bookable room (no room number or building).
pub fn room_availability_for_location(
    directory: &dyn LocationDirectory,
    entries: &[ClassScheduleEntry],
    location_id: &str,
    at: NaiveDateTime,
) -> Option<RoomAvailability> {
    let location = directory.get_location_by_id(location_id)?;
    let room = location.room_number.as_deref()?;
    let building = location.building.as_deref()?;
    Some(room_availability_at(entries, room, building, at))
}

//=========================================================================================
// Seed data
//=========================================================================================

fn place(
    id: &str,
    name: &str,
    description: &str,
    (latitude, longitude): (f64, f64),
    building: Option<&str>,
    floor: Option<i32>,
    room_number: Option<&str>,
    kind: LocationType,
) -> Location {
    Location {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        coordinates: Coordinates {
            latitude,
            longitude,
        },
        building: building.map(str::to_string),
        floor,
        room_number: room_number.map(str::to_string),
        kind,
    }
}

fn seed_locations() -> Vec<Location> {
    vec![
        place(
            "1",
            "Main Building",
            "The main administrative building of the campus",
            (30.6631, 76.7278),
            None,
            None,
            None,
            LocationType::Other,
        ),
        place(
            "2",
            "Computer Science Lab",
            "State-of-the-art computer science laboratory",
            (30.6635, 76.7282),
            Some("Engineering Block"),
            Some(2),
            Some("E201"),
            LocationType::Lab,
        ),
        place(
            "3",
            "Library",
            "Central library with study spaces and resources",
            (30.6640, 76.7275),
            Some("Knowledge Center"),
            Some(1),
            None,
            LocationType::Library,
        ),
        place(
            "4",
            "Lecture Hall 1",
            "Large lecture hall for undergraduate classes",
            (30.6627, 76.7285),
            Some("Academic Block A"),
            Some(1),
            Some("A101"),
            LocationType::Classroom,
        ),
        place(
            "5",
            "Physics Laboratory",
            "Modern physics laboratory for experiments",
            (30.6638, 76.7280),
            Some("Science Block"),
            Some(3),
            Some("S304"),
            LocationType::Lab,
        ),
        place(
            "6",
            "Cafeteria",
            "Campus cafeteria with diverse food options",
            (30.6625, 76.7270),
            Some("Student Center"),
            Some(1),
            None,
            LocationType::Cafeteria,
        ),
        place(
            "7",
            "Dean Office",
            "Office of the Dean of Students",
            (30.6633, 76.7290),
            Some("Administration Block"),
            Some(2),
            Some("ADM205"),
            LocationType::Office,
        ),
        place(
            "8",
            "Student Counseling Center",
            "Mental health and wellness counseling for students",
            (30.6628, 76.7288),
            Some("Wellness Center"),
            Some(1),
            Some("W105"),
            LocationType::Office,
        ),
    ]
}
