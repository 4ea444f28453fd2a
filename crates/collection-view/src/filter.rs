//! Filter descriptors and filter sets.
//!
//! A [`FilterDescriptor`] is a named predicate. A [`FilterSet`] keeps an
//! ordered list of descriptors with unique names and applies them by
//! sequential narrowing: each predicate sees only the records that passed the
//! ones before it. The set re-broadcasts every member change on its own
//! [`changed`](FilterSet::changed) signal, which is what the view listens to.
//!
//! # Example
//!
//! ```
//! use collection_view::FilterSet;
//!
//! let filters = FilterSet::<i32>::new();
//! filters.add_named("positive", |n| *n > 0).unwrap();
//! filters.add_named("even", |n| n % 2 == 0).unwrap();
//!
//! assert_eq!(filters.apply(&[-2, 1, 2, 3, 4]), vec![2, 4]);
//! assert!(filters.add_named("even", |_| true).is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use collection_view_core::logging::targets;
use collection_view_core::{ConnectionId, Signal};
use parking_lot::RwLock;

use crate::error::{Result, ViewError};

/// Type alias for a filter predicate.
///
/// Returns `true` if the record should be kept.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A named predicate with its own change notification.
pub struct FilterDescriptor<T> {
    name: String,
    predicate: RwLock<Predicate<T>>,
    changed: Signal<()>,
}

impl<T: 'static> FilterDescriptor<T> {
    /// Creates a descriptor from a closure.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::from_predicate(name, Arc::new(predicate))
    }

    /// Creates a descriptor from a shared predicate.
    pub fn from_predicate(name: impl Into<String>, predicate: Predicate<T>) -> Self {
        Self {
            name: name.into(),
            predicate: RwLock::new(predicate),
            changed: Signal::new(),
        }
    }

    /// Returns the current predicate.
    pub fn predicate(&self) -> Predicate<T> {
        Arc::clone(&self.predicate.read())
    }

    /// Replaces the predicate and raises [`changed`](Self::changed).
    pub fn set_predicate<F>(&self, predicate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        *self.predicate.write() = Arc::new(predicate);
        tracing::trace!(target: targets::FILTER, name = %self.name, "filter predicate replaced");
        self.changed.emit(());
    }

    /// Evaluates the predicate against `record`.
    pub fn matches(&self, record: &T) -> bool {
        (self.predicate())(record)
    }
}

impl<T> FilterDescriptor<T> {
    /// Returns the descriptor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal raised whenever the predicate changes.
    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }
}

impl<T> fmt::Debug for FilterDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A member of the set plus the connection forwarding its changes.
struct FilterEntry<T> {
    descriptor: Arc<FilterDescriptor<T>>,
    forward: ConnectionId,
}

/// An ordered collection of uniquely named filter descriptors.
///
/// Every add, remove, clear or member predicate change raises exactly one
/// [`changed`](Self::changed) emission.
pub struct FilterSet<T> {
    entries: RwLock<Vec<FilterEntry<T>>>,
    changed: Arc<Signal<()>>,
}

impl<T: 'static> Default for FilterSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> FilterSet<T> {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            changed: Arc::new(Signal::new()),
        }
    }

    /// Adds an anonymous predicate.
    ///
    /// The descriptor is named after the number of filters already in the
    /// set (`"0"`, `"1"`, ...).
    pub fn add<F>(&self, predicate: F) -> Result<Arc<FilterDescriptor<T>>>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let name = self.len().to_string();
        self.add_named(name, predicate)
    }

    /// Adds a named predicate.
    pub fn add_named<F>(
        &self,
        name: impl Into<String>,
        predicate: F,
    ) -> Result<Arc<FilterDescriptor<T>>>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.insert(Arc::new(FilterDescriptor::new(name, predicate)))
    }

    /// Adds a pre-built descriptor.
    ///
    /// Fails with [`ViewError::DuplicateFilterName`] if a descriptor with the
    /// same name is already registered; the set is left unchanged.
    pub fn insert(&self, descriptor: Arc<FilterDescriptor<T>>) -> Result<Arc<FilterDescriptor<T>>> {
        {
            let mut entries = self.entries.write();
            if entries
                .iter()
                .any(|entry| entry.descriptor.name() == descriptor.name())
            {
                tracing::debug!(target: targets::FILTER, name = descriptor.name(), "duplicate filter name rejected");
                return Err(ViewError::duplicate_filter(descriptor.name()));
            }
            let forward = self.forward_changes(&descriptor);
            entries.push(FilterEntry {
                descriptor: Arc::clone(&descriptor),
                forward,
            });
        }
        tracing::trace!(target: targets::FILTER, name = descriptor.name(), "filter added");
        self.changed.emit(());
        Ok(descriptor)
    }

    /// Removes the descriptor with the given name.
    pub fn remove(&self, name: &str) -> Result<Arc<FilterDescriptor<T>>> {
        let removed = {
            let mut entries = self.entries.write();
            let position = entries
                .iter()
                .position(|entry| entry.descriptor.name() == name)
                .ok_or_else(|| ViewError::filter_not_found(name))?;
            Self::detach(&mut entries, position)?
        };
        tracing::trace!(target: targets::FILTER, name, "filter removed");
        self.changed.emit(());
        Ok(removed)
    }

    /// Removes the given descriptor, matched by identity.
    pub fn remove_descriptor(
        &self,
        descriptor: &Arc<FilterDescriptor<T>>,
    ) -> Result<Arc<FilterDescriptor<T>>> {
        let removed = {
            let mut entries = self.entries.write();
            let position = entries
                .iter()
                .position(|entry| Arc::ptr_eq(&entry.descriptor, descriptor))
                .ok_or_else(|| ViewError::filter_not_found(descriptor.name()))?;
            Self::detach(&mut entries, position)?
        };
        tracing::trace!(target: targets::FILTER, name = removed.name(), "filter removed");
        self.changed.emit(());
        Ok(removed)
    }

    /// Removes every descriptor, raising a single change.
    pub fn clear(&self) {
        self.replace_all(None);
    }

    /// Replaces the whole set with at most one descriptor, raising a single
    /// change.
    pub(crate) fn replace_all(&self, descriptor: Option<Arc<FilterDescriptor<T>>>) {
        {
            let mut entries = self.entries.write();
            for entry in entries.drain(..) {
                Self::disconnect(&entry);
            }
            if let Some(descriptor) = descriptor {
                let forward = self.forward_changes(&descriptor);
                entries.push(FilterEntry { descriptor, forward });
            }
        }
        self.changed.emit(());
    }

    /// Returns the descriptor with the given name.
    pub fn find(&self, name: &str) -> Option<Arc<FilterDescriptor<T>>> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.descriptor.name() == name)
            .map(|entry| Arc::clone(&entry.descriptor))
    }

    /// Returns the number of descriptors.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the descriptors in application order.
    pub fn descriptors(&self) -> Vec<Arc<FilterDescriptor<T>>> {
        self.entries
            .read()
            .iter()
            .map(|entry| Arc::clone(&entry.descriptor))
            .collect()
    }

    /// Returns the descriptor names in application order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .map(|entry| entry.descriptor.name().to_string())
            .collect()
    }

    /// Returns `true` if `record` passes every filter.
    pub fn matches(&self, record: &T) -> bool {
        self.predicates().iter().all(|predicate| predicate(record))
    }

    /// Applies the filters in order, each narrowing the output of the last.
    pub fn apply(&self, records: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        let mut remaining = records.to_vec();
        for predicate in self.predicates() {
            remaining.retain(|record| predicate(record));
        }
        remaining
    }

    /// Signal raised once per add, remove, clear or member change.
    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }

    /// Snapshot of the predicates, taken so no lock is held while they run.
    fn predicates(&self) -> Vec<Predicate<T>> {
        self.entries
            .read()
            .iter()
            .map(|entry| entry.descriptor.predicate())
            .collect()
    }

    fn forward_changes(&self, descriptor: &FilterDescriptor<T>) -> ConnectionId {
        let changed = Arc::clone(&self.changed);
        descriptor.changed().connect(move |_| changed.emit(()))
    }

    fn detach(
        entries: &mut Vec<FilterEntry<T>>,
        position: usize,
    ) -> Result<Arc<FilterDescriptor<T>>> {
        let entry = &entries[position];
        entry.descriptor.changed().disconnect(entry.forward)?;
        Ok(entries.remove(position).descriptor)
    }

    fn disconnect(entry: &FilterEntry<T>) {
        if let Err(err) = entry.descriptor.changed().disconnect(entry.forward) {
            tracing::warn!(target: targets::FILTER, name = entry.descriptor.name(), %err, "filter forwarding already detached");
        }
    }
}

impl<T> Drop for FilterSet<T> {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().drain(..) {
            let _ = entry.descriptor.changed.disconnect(entry.forward);
        }
    }
}

impl<T> fmt::Debug for FilterSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_list()
            .entries(entries.iter().map(|entry| entry.descriptor.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn change_counter(filters: &FilterSet<i32>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        filters.changed().connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_anonymous_filters_get_positional_names() {
        let filters = FilterSet::<i32>::new();
        filters.add(|n| *n > 0).unwrap();
        filters.add(|n| *n < 10).unwrap();

        assert_eq!(filters.names(), vec!["0", "1"]);
    }

    #[test]
    fn test_positional_name_can_collide() {
        let filters = FilterSet::<i32>::new();
        filters.add_named("1", |_| true).unwrap();

        let err = filters.add(|_| false).unwrap_err();
        assert_eq!(err, ViewError::duplicate_filter("1"));
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_duplicate_name_leaves_set_unchanged() {
        let filters = FilterSet::<i32>::new();
        let count = change_counter(&filters);

        let first = filters.add_named("Default", |n| *n > 1).unwrap();
        let err = filters.add_named("Default", |n| *n > 100).unwrap_err();

        assert!(matches!(err, ViewError::DuplicateFilterName { .. }));
        assert_eq!(filters.len(), 1);
        assert!(Arc::ptr_eq(&filters.find("Default").unwrap(), &first));
        assert_eq!(filters.apply(&[1, 2, 3]), vec![2, 3]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_each_mutation_raises_one_change() {
        let filters = FilterSet::<i32>::new();
        let count = change_counter(&filters);

        let positive = filters.add_named("positive", |n| *n > 0).unwrap();
        filters.add_named("small", |n| *n < 10).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        positive.set_predicate(|n| *n >= 0);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        filters.remove("small").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 4);

        filters.clear();
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_removed_descriptor_stops_forwarding() {
        let filters = FilterSet::<i32>::new();
        let descriptor = filters.add_named("positive", |n| *n > 0).unwrap();
        let count = change_counter(&filters);

        filters.remove_descriptor(&descriptor).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        descriptor.set_predicate(|_| false);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(descriptor.changed().connection_count(), 0);
    }

    #[test]
    fn test_remove_missing_fails() {
        let filters = FilterSet::<i32>::new();
        let count = change_counter(&filters);

        assert_eq!(
            filters.remove("missing").unwrap_err(),
            ViewError::filter_not_found("missing")
        );

        let stranger = Arc::new(FilterDescriptor::new("stranger", |_: &i32| true));
        assert!(filters.remove_descriptor(&stranger).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_find_returns_none_when_absent() {
        let filters = FilterSet::<i32>::new();
        filters.add_named("a", |_| true).unwrap();
        assert!(filters.find("a").is_some());
        assert!(filters.find("b").is_none());
    }

    #[test]
    fn test_debug_lists_filter_names() {
        let filters = FilterSet::<String>::new();
        filters.add_named("non-empty", |s| !s.is_empty()).unwrap();
        filters.add(|s| s.len() < 10).unwrap();

        assert_eq!(format!("{filters:?}"), r#"["non-empty", "1"]"#);
    }

    #[test]
    fn test_filters_compose_conjunctively() {
        let filters = FilterSet::<i32>::new();
        filters.add(|n| n % 2 == 0).unwrap();
        filters.add(|n| *n > 4).unwrap();

        assert_eq!(filters.apply(&[1, 2, 4, 6, 7, 8]), vec![6, 8]);
        assert!(filters.matches(&6));
        assert!(!filters.matches(&4));
    }
}
