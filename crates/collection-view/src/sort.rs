//! Sort descriptors and sort descriptor sets.
//!
//! A [`SortDescriptor`] pairs a [`SortKey`] with a [`SortDirection`]. The key
//! is resolved once, at construction, into one of three shapes: a property
//! name read through [`Record::field`], a key selector returning a
//! [`FieldValue`], or a full two-argument comparator.
//!
//! # Composition
//!
//! A [`SortDescriptorSet`] sorts by running one full, stable sort pass per
//! descriptor over the whole sequence. The pass that runs last decides the
//! order of any two records it can tell apart; records it considers equal keep
//! the order left by the earlier passes. Passes run from the most recently
//! registered descriptor back to the first one, so the first descriptor runs
//! last and acts as the primary key.
//!
//! ```
//! use collection_view::{SortDescriptorSet, SortDirection, SortKey};
//!
//! let set = SortDescriptorSet::<i32>::new();
//! // Tens ascending, then units descending.
//! set.add(SortKey::key(|n: &i32| n / 10), SortDirection::Ascending);
//! set.add(SortKey::key(|n: &i32| n % 10), SortDirection::Descending);
//!
//! let mut items = vec![21, 13, 27, 11];
//! set.apply(&mut items);
//! assert_eq!(items, vec![13, 11, 27, 21]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use collection_view_core::logging::targets;
use collection_view_core::{ConnectionId, Signal};
use parking_lot::RwLock;

use crate::error::{Result, ViewError};
use crate::value::{FieldValue, Record};

/// Type alias for a key selector.
pub type KeyFn<T> = Arc<dyn Fn(&T) -> FieldValue + Send + Sync>;

/// Type alias for a full record comparator.
pub type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Type alias for a comparer of extracted field values.
pub type ValueCompareFn = Arc<dyn Fn(&FieldValue, &FieldValue) -> Ordering + Send + Sync>;

/// The direction of a sort pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Applies this direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// What a sort descriptor sorts by.
///
/// Two keys identify the same selector when they are the same property name,
/// or when they share the same key selector or comparator allocation.
pub enum SortKey<T> {
    /// A named property, read through [`Record::field`].
    Property(String),
    /// A function extracting a comparable value.
    Key(KeyFn<T>),
    /// A full comparator over two records.
    Comparator(CompareFn<T>),
}

impl<T> SortKey<T> {
    /// Sort by a named property.
    pub fn property(name: impl Into<String>) -> Self {
        SortKey::Property(name.into())
    }

    /// Sort by the value a closure extracts from each record.
    pub fn key<F, V>(selector: F) -> Self
    where
        F: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<FieldValue>,
    {
        SortKey::Key(Arc::new(move |record: &T| selector(record).into()))
    }

    /// Sort with a full comparator.
    pub fn comparator<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        SortKey::Comparator(Arc::new(compare))
    }

    /// Returns `true` if both keys are the same selector.
    pub fn same_selector(&self, other: &Self) -> bool {
        match (self, other) {
            (SortKey::Property(a), SortKey::Property(b)) => a == b,
            (SortKey::Key(a), SortKey::Key(b)) => Arc::ptr_eq(a, b),
            (SortKey::Comparator(a), SortKey::Comparator(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        match self {
            SortKey::Property(name) => SortKey::Property(name.clone()),
            SortKey::Key(key) => SortKey::Key(Arc::clone(key)),
            SortKey::Comparator(compare) => SortKey::Comparator(Arc::clone(compare)),
        }
    }
}

impl<T> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Property(name) => f.debug_tuple("Property").field(name).finish(),
            SortKey::Key(key) => write!(f, "Key({:p})", Arc::as_ptr(key)),
            SortKey::Comparator(compare) => write!(f, "Comparator({:p})", Arc::as_ptr(compare)),
        }
    }
}

impl<T> fmt::Display for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Property(name) => write!(f, "property '{name}'"),
            SortKey::Key(_) => write!(f, "key selector"),
            SortKey::Comparator(_) => write!(f, "comparator"),
        }
    }
}

impl<T> From<&str> for SortKey<T> {
    fn from(name: &str) -> Self {
        SortKey::property(name)
    }
}

impl<T> From<String> for SortKey<T> {
    fn from(name: String) -> Self {
        SortKey::Property(name)
    }
}

/// A sort key plus direction, with its own change notification.
pub struct SortDescriptor<T> {
    key: SortKey<T>,
    direction: RwLock<SortDirection>,
    comparer: RwLock<Option<ValueCompareFn>>,
    changed: Signal<()>,
}

impl<T: Record> SortDescriptor<T> {
    /// Creates a descriptor.
    pub fn new(key: impl Into<SortKey<T>>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction: RwLock::new(direction),
            comparer: RwLock::new(None),
            changed: Signal::new(),
        }
    }

    /// Sets the value comparer used by property and key selectors.
    ///
    /// Comparators ignore it.
    pub fn with_comparer<F>(self, comparer: F) -> Self
    where
        F: Fn(&FieldValue, &FieldValue) -> Ordering + Send + Sync + 'static,
    {
        *self.comparer.write() = Some(Arc::new(comparer));
        self
    }

    /// Returns the sort key.
    pub fn key(&self) -> &SortKey<T> {
        &self.key
    }

    /// Returns the current direction.
    pub fn direction(&self) -> SortDirection {
        *self.direction.read()
    }

    /// Sets the direction, raising [`changed`](Self::changed) if it differs.
    pub fn set_direction(&self, direction: SortDirection) {
        {
            let mut current = self.direction.write();
            if *current == direction {
                return;
            }
            *current = direction;
        }
        tracing::trace!(target: targets::SORT, key = %self.key, ?direction, "sort direction changed");
        self.changed.emit(());
    }

    /// Flips the direction and returns the new one.
    pub fn toggle(&self) -> SortDirection {
        let direction = self.direction().reversed();
        self.set_direction(direction);
        direction
    }

    /// Returns the value comparer, if any.
    pub fn comparer(&self) -> Option<ValueCompareFn> {
        self.comparer.read().clone()
    }

    /// Replaces the value comparer and raises [`changed`](Self::changed).
    pub fn set_comparer<F>(&self, comparer: F)
    where
        F: Fn(&FieldValue, &FieldValue) -> Ordering + Send + Sync + 'static,
    {
        *self.comparer.write() = Some(Arc::new(comparer));
        self.changed.emit(());
    }

    /// Removes the value comparer and raises [`changed`](Self::changed).
    pub fn clear_comparer(&self) {
        *self.comparer.write() = None;
        self.changed.emit(());
    }

    /// Compares two records according to this descriptor.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.comparator())(a, b)
    }

    /// Builds a comparator from the descriptor's current state.
    ///
    /// The returned closure does not observe later changes to the descriptor.
    pub fn comparator(&self) -> CompareFn<T> {
        let direction = self.direction();
        let values: ValueCompareFn = match self.comparer() {
            Some(comparer) => comparer,
            None => Arc::new(FieldValue::total_cmp),
        };

        match &self.key {
            SortKey::Comparator(compare) => {
                let compare = Arc::clone(compare);
                Arc::new(move |a: &T, b: &T| direction.apply(compare(a, b)))
            }
            SortKey::Key(key) => {
                let key = Arc::clone(key);
                Arc::new(move |a: &T, b: &T| direction.apply(values(&key(a), &key(b))))
            }
            SortKey::Property(name) => {
                let name = name.clone();
                Arc::new(move |a: &T, b: &T| {
                    direction.apply(values(&a.field(&name), &b.field(&name)))
                })
            }
        }
    }

    /// Signal raised when the direction or comparer changes.
    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }
}

impl<T> fmt::Debug for SortDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortDescriptor")
            .field("key", &self.key)
            .field("direction", &*self.direction.read())
            .finish_non_exhaustive()
    }
}

struct SortEntry<T> {
    descriptor: Arc<SortDescriptor<T>>,
    forward: ConnectionId,
}

/// An ordered collection of sort descriptors keyed by selector identity.
///
/// Unlike [`FilterSet`](crate::FilterSet), uniqueness is not enforced:
/// [`insert`](Self::insert) appends even when the selector is already present.
pub struct SortDescriptorSet<T> {
    entries: RwLock<Vec<SortEntry<T>>>,
    changed: Arc<Signal<()>>,
}

impl<T: Record> Default for SortDescriptorSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> SortDescriptorSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            changed: Arc::new(Signal::new()),
        }
    }

    /// Adds a descriptor for `key`.
    ///
    /// If a descriptor with the same selector is already registered, its
    /// direction is updated and it is returned instead. That raises one
    /// change only when the direction actually differs; re-adding with the
    /// same direction raises none.
    pub fn add(
        &self,
        key: impl Into<SortKey<T>>,
        direction: SortDirection,
    ) -> Arc<SortDescriptor<T>> {
        let key = key.into();
        if let Some(existing) = self.find(&key) {
            existing.set_direction(direction);
            return existing;
        }
        self.insert(Arc::new(SortDescriptor::new(key, direction)))
    }

    /// Appends a pre-built descriptor without checking for duplicates.
    pub fn insert(&self, descriptor: Arc<SortDescriptor<T>>) -> Arc<SortDescriptor<T>> {
        {
            let forward = self.forward_changes(&descriptor);
            self.entries.write().push(SortEntry {
                descriptor: Arc::clone(&descriptor),
                forward,
            });
        }
        tracing::trace!(target: targets::SORT, key = %descriptor.key(), "sort descriptor added");
        self.changed.emit(());
        descriptor
    }

    /// Removes the first descriptor whose selector matches `key`.
    pub fn remove(&self, key: &SortKey<T>) -> Result<Arc<SortDescriptor<T>>> {
        let removed = {
            let mut entries = self.entries.write();
            let position = entries
                .iter()
                .position(|entry| entry.descriptor.key().same_selector(key))
                .ok_or_else(|| ViewError::sort_not_found(key.to_string()))?;
            Self::detach(&mut entries, position)?
        };
        self.changed.emit(());
        Ok(removed)
    }

    /// Removes the given descriptor, matched by identity.
    pub fn remove_descriptor(
        &self,
        descriptor: &Arc<SortDescriptor<T>>,
    ) -> Result<Arc<SortDescriptor<T>>> {
        let removed = {
            let mut entries = self.entries.write();
            let position = entries
                .iter()
                .position(|entry| Arc::ptr_eq(&entry.descriptor, descriptor))
                .ok_or_else(|| ViewError::sort_not_found(descriptor.key().to_string()))?;
            Self::detach(&mut entries, position)?
        };
        self.changed.emit(());
        Ok(removed)
    }

    /// Removes every descriptor, raising a single change.
    pub fn clear(&self) {
        self.replace_all(None);
    }

    /// Replaces the whole set with at most one descriptor, raising a single
    /// change.
    pub(crate) fn replace_all(&self, descriptor: Option<Arc<SortDescriptor<T>>>) {
        {
            let mut entries = self.entries.write();
            for entry in entries.drain(..) {
                if let Err(err) = entry.descriptor.changed().disconnect(entry.forward) {
                    tracing::warn!(target: targets::SORT, key = %entry.descriptor.key(), %err, "sort forwarding already detached");
                }
            }
            if let Some(descriptor) = descriptor {
                let forward = self.forward_changes(&descriptor);
                entries.push(SortEntry { descriptor, forward });
            }
        }
        self.changed.emit(());
    }

    /// Returns the first descriptor whose selector matches `key`.
    pub fn find(&self, key: &SortKey<T>) -> Option<Arc<SortDescriptor<T>>> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.descriptor.key().same_selector(key))
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

    /// Returns the descriptors in registration order.
    pub fn descriptors(&self) -> Vec<Arc<SortDescriptor<T>>> {
        self.entries
            .read()
            .iter()
            .map(|entry| Arc::clone(&entry.descriptor))
            .collect()
    }

    /// Sorts `records` in place, one stable pass per descriptor.
    pub fn apply(&self, records: &mut [T]) {
        let comparators: Vec<CompareFn<T>> = self
            .entries
            .read()
            .iter()
            .map(|entry| entry.descriptor.comparator())
            .collect();

        for compare in comparators.iter().rev() {
            records.sort_by(|a, b| compare(a, b));
        }
    }

    /// Signal raised once per add, remove, clear or member change.
    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }

    fn forward_changes(&self, descriptor: &SortDescriptor<T>) -> ConnectionId {
        let changed = Arc::clone(&self.changed);
        descriptor.changed().connect(move |_| changed.emit(()))
    }

    fn detach(
        entries: &mut Vec<SortEntry<T>>,
        position: usize,
    ) -> Result<Arc<SortDescriptor<T>>> {
        let entry = &entries[position];
        entry.descriptor.changed().disconnect(entry.forward)?;
        Ok(entries.remove(position).descriptor)
    }
}

impl<T> Drop for SortDescriptorSet<T> {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().drain(..) {
            let _ = entry.descriptor.changed.disconnect(entry.forward);
        }
    }
}

impl<T> fmt::Debug for SortDescriptorSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_list()
            .entries(entries.iter().map(|entry| &entry.descriptor))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[derive(Debug, Clone, PartialEq)]
    struct Player {
        name: &'static str,
        country: &'static str,
        points: u32,
    }

    impl Record for Player {
        fn field(&self, name: &str) -> FieldValue {
            match name {
                "name" => FieldValue::from(self.name),
                "country" => FieldValue::from(self.country),
                "points" => FieldValue::from(self.points),
                _ => FieldValue::Null,
            }
        }
    }

    fn players() -> Vec<Player> {
        vec![
            Player { name: "ana", country: "PT", points: 10 },
            Player { name: "ben", country: "DE", points: 30 },
            Player { name: "cai", country: "PT", points: 40 },
            Player { name: "dan", country: "DE", points: 20 },
        ]
    }

    fn names(players: &[Player]) -> Vec<&'static str> {
        players.iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_property_sort_both_directions() {
        let set = SortDescriptorSet::<Player>::new();
        let descriptor = set.add("points", SortDirection::Ascending);

        let mut items = players();
        set.apply(&mut items);
        assert_eq!(names(&items), vec!["ana", "dan", "ben", "cai"]);

        descriptor.toggle();
        set.apply(&mut items);
        assert_eq!(names(&items), vec!["cai", "ben", "dan", "ana"]);
    }

    #[test]
    fn test_first_registered_descriptor_dominates() {
        let set = SortDescriptorSet::<Player>::new();
        set.add("country", SortDirection::Ascending);
        set.add("points", SortDirection::Descending);

        let mut items = players();
        set.apply(&mut items);
        assert_eq!(names(&items), vec!["ben", "dan", "cai", "ana"]);
    }

    #[test]
    fn test_comparator_honours_direction() {
        let set = SortDescriptorSet::<Player>::new();
        set.add(
            SortKey::comparator(|a: &Player, b: &Player| a.name.cmp(b.name)),
            SortDirection::Descending,
        );

        let mut items = players();
        set.apply(&mut items);
        assert_eq!(names(&items), vec!["dan", "cai", "ben", "ana"]);
    }

    #[test]
    fn test_key_selector_with_value_comparer() {
        // Order by distance from 25 points.
        let descriptor = SortDescriptor::new(
            SortKey::key(|p: &Player| p.points),
            SortDirection::Ascending,
        )
        .with_comparer(|a, b| {
            let distance = |v: &FieldValue| (v.as_int().unwrap_or_default() - 25).abs();
            distance(a).cmp(&distance(b))
        });

        let set = SortDescriptorSet::new();
        set.insert(Arc::new(descriptor));

        let mut items = players();
        set.apply(&mut items);
        assert_eq!(names(&items), vec!["ben", "dan", "ana", "cai"]);
    }

    #[test]
    fn test_add_reuses_matching_selector() {
        let set = SortDescriptorSet::<Player>::new();
        let first = set.add("points", SortDirection::Ascending);
        let second = set.add("points", SortDirection::Descending);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(set.len(), 1);
        assert_eq!(first.direction(), SortDirection::Descending);
    }

    #[test]
    fn test_re_adding_same_direction_raises_no_change() {
        let set = SortDescriptorSet::<Player>::new();
        let changes = Arc::new(AtomicUsize::new(0));
        let changes_clone = changes.clone();
        set.changed().connect(move |_| {
            changes_clone.fetch_add(1, AtomicOrdering::SeqCst);
        });

        set.add("points", SortDirection::Ascending);
        set.add("points", SortDirection::Ascending);
        assert_eq!(changes.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(set.len(), 1);

        set.add("points", SortDirection::Descending);
        assert_eq!(changes.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_insert_allows_duplicate_selectors() {
        let set = SortDescriptorSet::<Player>::new();
        set.insert(Arc::new(SortDescriptor::new("points", SortDirection::Ascending)));
        set.insert(Arc::new(SortDescriptor::new("points", SortDirection::Descending)));

        assert_eq!(set.len(), 2);
        let found = set.find(&SortKey::property("points")).unwrap();
        assert_eq!(found.direction(), SortDirection::Ascending);
    }

    #[test]
    fn test_selector_identity() {
        let key = SortKey::key(|p: &Player| p.points);
        let same = key.clone();
        let lookalike = SortKey::key(|p: &Player| p.points);

        assert!(key.same_selector(&same));
        assert!(!key.same_selector(&lookalike));
        assert!(SortKey::<Player>::property("a").same_selector(&"a".into()));
    }

    #[test]
    fn test_member_changes_are_forwarded() {
        let set = SortDescriptorSet::<Player>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        set.changed().connect(move |_| {
            count_clone.fetch_add(1, AtomicOrdering::SeqCst);
        });

        let descriptor = set.add("points", SortDirection::Ascending);
        descriptor.toggle();
        descriptor.set_direction(SortDirection::Descending); // unchanged, no emit
        assert_eq!(count.load(AtomicOrdering::SeqCst), 2);

        set.remove(&SortKey::property("points")).unwrap();
        descriptor.toggle();
        assert_eq!(count.load(AtomicOrdering::SeqCst), 3);
    }

    #[test]
    fn test_remove_missing_fails() {
        let set = SortDescriptorSet::<Player>::new();
        let err = set.remove(&SortKey::property("points")).unwrap_err();
        assert_eq!(err, ViewError::sort_not_found("property 'points'"));
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(SortDirection::Ascending.reversed(), SortDirection::Descending);
        assert_eq!(
            SortDirection::Descending.apply(std::cmp::Ordering::Less),
            std::cmp::Ordering::Greater
        );
    }
}
