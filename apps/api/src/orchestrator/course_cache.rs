//! Per-university course lists for one analysis cycle.
//!
//! Each key owns a `OnceCell` slot: the first caller runs the fetch, later
//! callers for the same key await that fetch instead of issuing their own.
//! A failed fetch leaves the slot empty so it can be retried. The whole cache
//! is replaced at the start of every cycle, so a fetch that finishes late
//! writes into a slot nobody can see any more.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::models::report::UniversityCourse;

pub type CourseSlot = Arc<OnceCell<Vec<UniversityCourse>>>;

#[derive(Debug, Default)]
pub struct CourseCache {
    slots: HashMap<String, CourseSlot>,
}

impl CourseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(key: &str, courses: Vec<UniversityCourse>) -> Self {
        let mut cache = Self::new();
        cache.insert(key, courses);
        cache
    }

    pub fn insert(&mut self, key: &str, courses: Vec<UniversityCourse>) {
        self.slots
            .insert(key.to_string(), Arc::new(OnceCell::new_with(Some(courses))));
    }

    /// The slot for `key`, created empty if absent.
    pub fn slot(&mut self, key: &str) -> CourseSlot {
        self.slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<&Vec<UniversityCourse>> {
        self.slots.get(key).and_then(|slot| slot.get())
    }

    /// Keys with a stored result, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Populated entries only; in-flight or failed keys are left out.
    pub fn to_map(&self) -> BTreeMap<String, Vec<UniversityCourse>> {
        self.slots
            .iter()
            .filter_map(|(key, slot)| slot.get().map(|courses| (key.clone(), courses.clone())))
            .collect()
    }

    pub fn from_map(map: BTreeMap<String, Vec<UniversityCourse>>) -> Self {
        let mut cache = Self::new();
        for (key, courses) in map {
            cache.insert(&key, courses);
        }
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::fixtures;

    #[test]
    fn test_seeded_key_is_visible() {
        let cache = CourseCache::seeded("All Universities", vec![fixtures::course("Law", "UCL")]);
        assert_eq!(cache.get("All Universities").unwrap().len(), 1);
        assert_eq!(cache.keys(), vec!["All Universities".to_string()]);
    }

    #[test]
    fn test_empty_slot_is_not_listed() {
        let mut cache = CourseCache::new();
        let _slot = cache.slot("University of York");
        assert!(cache.get("University of York").is_none());
        assert!(cache.keys().is_empty());
        assert!(cache.to_map().is_empty());
    }

    #[tokio::test]
    async fn test_slot_is_shared_between_callers() {
        let mut cache = CourseCache::new();
        let first = cache.slot("University of York");
        let second = cache.slot("University of York");
        first
            .get_or_init(|| async { vec![fixtures::course("History", "University of York")] })
            .await;
        assert!(second.initialized());
        assert_eq!(cache.keys(), vec!["University of York".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_init_leaves_slot_empty() {
        let mut cache = CourseCache::new();
        let slot = cache.slot("University of York");
        let result: Result<&Vec<UniversityCourse>, &str> =
            slot.get_or_try_init(|| async { Err("boom") }).await;
        assert!(result.is_err());
        assert!(!slot.initialized());
    }

    #[test]
    fn test_map_roundtrip_keeps_entries() {
        let mut map = BTreeMap::new();
        map.insert(
            "University of Oxford".to_string(),
            vec![fixtures::course("Physics", "University of Oxford")],
        );
        let cache = CourseCache::from_map(map.clone());
        assert_eq!(cache.to_map(), map);
    }
}
