//! Most-recently-used lists of saved locations (favorites and recents).

use std::sync::Arc;

use crate::store::{read_record, remove_record, write_record, Store};
use crate::types::Location;

pub const FAVORITES_KEY: &str = "atmos_favorites";
pub const RECENTS_KEY: &str = "atmos_recent";
pub const FAVORITES_CAP: usize = 10;
pub const RECENTS_CAP: usize = 5;

/// Something with a stable identity for de-duplication.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for Location {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Move `item` to the front, dropping any element with the same id, then
/// truncate to `cap`.
pub fn add<T: Identified>(mut list: Vec<T>, item: T, cap: usize) -> Vec<T> {
    list.retain(|existing| existing.id() != item.id());
    list.insert(0, item);
    list.truncate(cap);
    list
}

/// Drop the element with `id`, if any.
pub fn remove<T: Identified>(mut list: Vec<T>, id: &str) -> Vec<T> {
    list.retain(|existing| existing.id() != id);
    list
}

pub fn contains<T: Identified>(list: &[T], id: &str) -> bool {
    list.iter().any(|existing| existing.id() == id)
}

/// A persisted, capped location list.
#[derive(Clone)]
pub struct SavedLocations {
    store: Arc<dyn Store>,
    key: &'static str,
    cap: usize,
    mark_favorite: bool,
}

impl SavedLocations {
    pub fn favorites(store: Arc<dyn Store>, cap: usize) -> Self {
        Self {
            store,
            key: FAVORITES_KEY,
            cap: cap.max(1),
            mark_favorite: true,
        }
    }

    pub fn recents(store: Arc<dyn Store>, cap: usize) -> Self {
        Self {
            store,
            key: RECENTS_KEY,
            cap: cap.max(1),
            mark_favorite: false,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Current list, most recent first. Missing or corrupt records read as empty.
    pub fn load(&self) -> Vec<Location> {
        read_record(self.store.as_ref(), self.key).unwrap_or_default()
    }

    /// Add or promote `location`; returns the updated list.
    pub fn add(&self, location: &Location) -> Vec<Location> {
        let mut location = location.clone();
        if self.mark_favorite {
            location.is_favorite = true;
        }
        let updated = add(self.load(), location, self.cap);
        write_record(self.store.as_ref(), self.key, &updated);
        tracing::debug!("{} now holds {} locations", self.key, updated.len());
        updated
    }

    /// Remove the location with `id`; returns the updated list.
    pub fn remove(&self, id: &str) -> Vec<Location> {
        let updated = remove(self.load(), id);
        write_record(self.store.as_ref(), self.key, &updated);
        updated
    }

    pub fn contains(&self, id: &str) -> bool {
        contains(&self.load(), id)
    }

    /// Forget every saved location in this list.
    pub fn clear(&self) {
        remove_record(self.store.as_ref(), self.key);
    }
}
