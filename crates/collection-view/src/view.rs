//! The view orchestrator.
//!
//! A [`View`] derives three stages from its raw data:
//!
//! ```text
//! data ──filters──▶ filtered ──sort──▶ sorted ──page──▶ paged
//! ```
//!
//! Each mutation invalidates the stage it touches and everything downstream:
//!
//! | Mutation                 | Recomputed                  |
//! |--------------------------|-----------------------------|
//! | [`View::set_data`]       | filtered, sorted, paged     |
//! | filter added/changed     | filtered, sorted, paged     |
//! | sort descriptor changed  | sorted, paged               |
//! | page size / page index   | paged                       |
//!
//! The cascade runs synchronously inside the mutating call and ends with
//! exactly one [`ViewChanged`] emission from the paged stage. Earlier stages
//! recompute silently.
//!
//! # Batching
//!
//! The suppression guards ([`View::suppress_filtering`],
//! [`View::suppress_sorting`], [`View::suppress_paging`]) stop a stage from
//! recomputing automatically while several changes are made. The flag is
//! restored when the guard drops, after which one explicit `apply_*` call
//! brings the pipeline up to date.
//!
//! ```
//! use collection_view::View;
//!
//! let view = View::new(1..=10);
//! {
//!     let _batch = view.suppress_filtering();
//!     view.filters().add(|n: &i32| n % 2 == 0).unwrap();
//!     view.filters().add(|n: &i32| *n > 4).unwrap();
//! }
//! view.apply_filters();
//!
//! assert_eq!(view.view().to_vec(), vec![6, 8, 10]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use collection_view_core::logging::targets;
use collection_view_core::{Signal, StageSpan};
use futures_util::{Stream, StreamExt};
use parking_lot::RwLock;

use crate::config::{ViewBuilder, ViewConfig};
use crate::error::{Result, ViewError};
use crate::filter::{FilterDescriptor, FilterSet, Predicate};
use crate::snapshot::Snapshot;
use crate::sort::{SortDescriptor, SortDescriptorSet, SortDirection, SortKey};
use crate::subscription::{SubscriptionBridge, ViewSubscription};
use crate::value::Record;

/// Name of the descriptor installed by [`View::set_filter`].
pub const DEFAULT_FILTER_NAME: &str = "Default";

/// Payload of [`View::changed`]: the view that changed and its new paged
/// stage.
pub struct ViewChanged<T: Record> {
    source: Weak<View<T>>,
    items: Snapshot<T>,
}

impl<T: Record> ViewChanged<T> {
    /// Returns the view that raised the change, if it is still alive.
    pub fn source(&self) -> Option<Arc<View<T>>> {
        self.source.upgrade()
    }

    /// Returns the paged stage at the time of the change.
    pub fn items(&self) -> &Snapshot<T> {
        &self.items
    }

    /// Consumes the event, returning the paged stage.
    pub fn into_items(self) -> Snapshot<T> {
        self.items
    }
}

impl<T: Record> Clone for ViewChanged<T> {
    fn clone(&self) -> Self {
        Self {
            source: Weak::clone(&self.source),
            items: self.items.clone(),
        }
    }
}

impl<T: Record + fmt::Debug> fmt::Debug for ViewChanged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewChanged")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

/// RAII guard that keeps a stage's auto-recompute disabled.
///
/// Dropping the guard restores the flag to the value it had before the guard
/// was taken, so guards nest.
#[must_use = "the stage is released as soon as the guard is dropped"]
pub struct SuppressionGuard<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl<'a> SuppressionGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        let previous = flag.swap(true, Ordering::SeqCst);
        Self { flag, previous }
    }
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

/// Materialized stages plus paging state.
struct Stages<T> {
    data: Snapshot<T>,
    filtered: Snapshot<T>,
    sorted: Snapshot<T>,
    paged: Snapshot<T>,
    /// Length of the sorted stage the paged stage was sliced from.
    paged_from: usize,
    page_size: usize,
    page_index: usize,
}

impl<T> Stages<T> {
    fn new(data: Snapshot<T>, config: &ViewConfig) -> Self {
        Self {
            data,
            filtered: Snapshot::empty(),
            sorted: Snapshot::empty(),
            paged: Snapshot::empty(),
            paged_from: 0,
            page_size: config.page_size,
            page_index: config.page_index,
        }
    }
}

/// A filtered, sorted and paged view over a collection of records.
///
/// Views are always handled through `Arc<View<T>>`: the filter and sort sets
/// notify the view through a weak reference to it.
///
/// # Example
///
/// ```
/// use collection_view::View;
///
/// let view = View::new(1..=25);
/// view.set_page_size(10).unwrap();
/// assert_eq!(view.view().to_vec(), (1..=10).collect::<Vec<_>>());
///
/// view.go_to_next_page().unwrap();
/// assert_eq!(view.view().to_vec(), (11..=20).collect::<Vec<_>>());
/// ```
pub struct View<T: Record> {
    weak_self: Weak<View<T>>,
    stages: RwLock<Stages<T>>,
    filters: FilterSet<T>,
    sort_descriptors: SortDescriptorSet<T>,
    filtering_suppressed: AtomicBool,
    sorting_suppressed: AtomicBool,
    paging_suppressed: AtomicBool,
    changed: Signal<ViewChanged<T>>,
    bridge: OnceLock<SubscriptionBridge<T>>,
    config: ViewConfig,
}

static_assertions::assert_impl_all!(View<i32>: Send, Sync);

impl<T: Record> View<T> {
    /// Creates a view over `data` with the default configuration.
    pub fn new(data: impl IntoIterator<Item = T>) -> Arc<Self> {
        Self::create(data.into_iter().collect(), ViewConfig::default())
    }

    /// Creates a view with no records.
    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    /// Creates a view with an explicit configuration.
    pub fn with_config(data: impl IntoIterator<Item = T>, config: ViewConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Self::create(data.into_iter().collect(), config))
    }

    /// Returns a builder for a view.
    pub fn builder() -> ViewBuilder<T> {
        ViewBuilder::new()
    }

    pub(crate) fn create(data: Vec<T>, config: ViewConfig) -> Arc<Self> {
        let view = Arc::new_cyclic(|weak: &Weak<Self>| {
            let filters = FilterSet::new();
            let weak_view = Weak::clone(weak);
            filters.changed().connect(move |_| {
                if let Some(view) = weak_view.upgrade() {
                    view.filters_changed();
                }
            });

            let sort_descriptors = SortDescriptorSet::new();
            let weak_view = Weak::clone(weak);
            sort_descriptors.changed().connect(move |_| {
                if let Some(view) = weak_view.upgrade() {
                    view.sorting_changed();
                }
            });

            Self {
                weak_self: Weak::clone(weak),
                stages: RwLock::new(Stages::new(Snapshot::from(data), &config)),
                filters,
                sort_descriptors,
                filtering_suppressed: AtomicBool::new(false),
                sorting_suppressed: AtomicBool::new(false),
                paging_suppressed: AtomicBool::new(false),
                changed: Signal::new(),
                bridge: OnceLock::new(),
                config,
            }
        });
        tracing::debug!(
            target: targets::VIEW,
            records = view.stages.read().data.len(),
            page_size = config.page_size,
            "view created"
        );
        view.apply_filters();
        view
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Replaces the raw data and recomputes every stage.
    pub fn set_data(&self, data: impl IntoIterator<Item = T>) {
        let data: Snapshot<T> = data.into_iter().collect();
        tracing::trace!(target: targets::VIEW, records = data.len(), "data replaced");
        self.stages.write().data = data;
        self.filters_changed();
    }

    /// Consumes a push-based source of replacement snapshots.
    ///
    /// Every emission replaces the raw data through [`set_data`](Self::set_data).
    /// The returned future completes when the source ends; spawn or await it
    /// on whatever executor drives the source.
    pub async fn follow<S>(&self, source: S)
    where
        S: Stream,
        S::Item: IntoIterator<Item = T>,
    {
        futures_util::pin_mut!(source);
        let mut emissions = 0usize;
        while let Some(batch) = source.next().await {
            self.set_data(batch);
            emissions += 1;
        }
        tracing::debug!(target: targets::VIEW, emissions, "data source completed");
    }

    /// Returns the raw data.
    pub fn data(&self) -> Snapshot<T> {
        self.stages.read().data.clone()
    }

    // -------------------------------------------------------------------------
    // Stages
    // -------------------------------------------------------------------------

    /// Returns the current page. Same as [`paged_view`](Self::paged_view).
    pub fn view(&self) -> Snapshot<T> {
        self.paged_view()
    }

    /// Returns the records that passed every filter.
    pub fn filtered_view(&self) -> Snapshot<T> {
        self.stages.read().filtered.clone()
    }

    /// Returns the filtered records in sort order.
    pub fn sorted_view(&self) -> Snapshot<T> {
        self.stages.read().sorted.clone()
    }

    /// Returns the current page of the sorted records.
    pub fn paged_view(&self) -> Snapshot<T> {
        self.stages.read().paged.clone()
    }

    /// Recomputes the filtered stage, then cascades downstream.
    ///
    /// Runs even while filtering is suppressed; the cascade into the sorted
    /// and paged stages honours their own suppression flags.
    pub fn apply_filters(&self) {
        let filtered = {
            let _span = StageSpan::new("filtered");
            let data = self.stages.read().data.clone();
            let filtered = Snapshot::from(self.filters.apply(&data));
            tracing::trace!(
                target: targets::VIEW,
                input = data.len(),
                output = filtered.len(),
                "filtered stage recomputed"
            );
            filtered
        };
        self.stages.write().filtered = filtered;
        self.sorting_changed();
    }

    /// Recomputes the sorted stage, then cascades into paging.
    pub fn apply_sorting(&self) {
        let sorted = {
            let _span = StageSpan::new("sorted");
            let mut records = self.stages.read().filtered.to_vec();
            self.sort_descriptors.apply(&mut records);
            tracing::trace!(
                target: targets::VIEW,
                descriptors = self.sort_descriptors.len(),
                output = records.len(),
                "sorted stage recomputed"
            );
            Snapshot::from(records)
        };
        self.stages.write().sorted = sorted;
        self.paging_changed();
    }

    /// Recomputes the paged stage and raises [`changed`](Self::changed).
    pub fn apply_paging(&self) {
        let paged = {
            let _span = StageSpan::new("paged");
            let mut stages = self.stages.write();
            let sorted = stages.sorted.clone();
            let start = stages
                .page_index
                .saturating_mul(stages.page_size)
                .min(sorted.len());
            let end = start.saturating_add(stages.page_size).min(sorted.len());
            let paged = Snapshot::from(sorted[start..end].to_vec());
            stages.paged = paged.clone();
            stages.paged_from = sorted.len();
            tracing::trace!(
                target: targets::VIEW,
                page_index = stages.page_index,
                start,
                end,
                "paged stage recomputed"
            );
            paged
        };
        self.changed.emit(ViewChanged {
            source: Weak::clone(&self.weak_self),
            items: paged,
        });
    }

    fn filters_changed(&self) {
        if self.is_filtering_suppressed() {
            tracing::trace!(target: targets::VIEW, "filtering suppressed, stage left stale");
            return;
        }
        self.apply_filters();
    }

    fn sorting_changed(&self) {
        if self.is_sorting_suppressed() {
            tracing::trace!(target: targets::VIEW, "sorting suppressed, stage left stale");
            return;
        }
        self.apply_sorting();
    }

    fn paging_changed(&self) {
        if self.is_paging_suppressed() {
            tracing::trace!(target: targets::VIEW, "paging suppressed, stage left stale");
            return;
        }
        self.apply_paging();
    }

    // -------------------------------------------------------------------------
    // Suppression
    // -------------------------------------------------------------------------

    /// Disables automatic filtered-stage recomputes until the guard drops.
    pub fn suppress_filtering(&self) -> SuppressionGuard<'_> {
        SuppressionGuard::engage(&self.filtering_suppressed)
    }

    /// Disables automatic sorted-stage recomputes until the guard drops.
    pub fn suppress_sorting(&self) -> SuppressionGuard<'_> {
        SuppressionGuard::engage(&self.sorting_suppressed)
    }

    /// Disables automatic paged-stage recomputes until the guard drops.
    pub fn suppress_paging(&self) -> SuppressionGuard<'_> {
        SuppressionGuard::engage(&self.paging_suppressed)
    }

    /// Returns `true` while filtering is suppressed.
    pub fn is_filtering_suppressed(&self) -> bool {
        self.filtering_suppressed.load(Ordering::SeqCst)
    }

    /// Returns `true` while sorting is suppressed.
    pub fn is_sorting_suppressed(&self) -> bool {
        self.sorting_suppressed.load(Ordering::SeqCst)
    }

    /// Returns `true` while paging is suppressed.
    pub fn is_paging_suppressed(&self) -> bool {
        self.paging_suppressed.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    /// Returns the filter set.
    pub fn filters(&self) -> &FilterSet<T> {
        &self.filters
    }

    /// Returns the predicate when exactly one filter is installed.
    pub fn filter(&self) -> Option<Predicate<T>> {
        match self.filters.descriptors().as_slice() {
            [only] => Some(only.predicate()),
            _ => None,
        }
    }

    /// Replaces every filter with `predicate`, named [`DEFAULT_FILTER_NAME`],
    /// or removes all filters when `predicate` is `None`.
    pub fn set_filter(&self, predicate: Option<Predicate<T>>) {
        {
            let _filtering = self.suppress_filtering();
            let descriptor = predicate
                .map(|predicate| Arc::new(FilterDescriptor::from_predicate(DEFAULT_FILTER_NAME, predicate)));
            self.filters.replace_all(descriptor);
        }
        self.filters_changed();
    }

    /// Replaces every filter with `predicate`.
    pub fn filter_by<F>(&self, predicate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.set_filter(Some(Arc::new(predicate)));
    }

    /// Removes every filter.
    pub fn clear_filter(&self) {
        self.set_filter(None);
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Returns the sort descriptor set.
    pub fn sort_descriptors(&self) -> &SortDescriptorSet<T> {
        &self.sort_descriptors
    }

    /// Replaces every sort descriptor with one built from `key`.
    pub fn sort(
        &self,
        key: impl Into<SortKey<T>>,
        direction: SortDirection,
    ) -> Arc<SortDescriptor<T>> {
        let descriptor = Arc::new(SortDescriptor::new(key, direction));
        {
            let _sorting = self.suppress_sorting();
            self.sort_descriptors
                .replace_all(Some(Arc::clone(&descriptor)));
        }
        self.sorting_changed();
        descriptor
    }

    /// Removes every sort descriptor, restoring the filtered order.
    pub fn clear_sort(&self) {
        {
            let _sorting = self.suppress_sorting();
            self.sort_descriptors.clear();
        }
        self.sorting_changed();
    }

    /// Flips the direction of every sort descriptor, recomputing once.
    pub fn toggle_sort_order(&self) {
        {
            let _sorting = self.suppress_sorting();
            for descriptor in self.sort_descriptors.descriptors() {
                descriptor.toggle();
            }
        }
        self.sorting_changed();
    }

    /// Flips the direction of the descriptor whose selector matches `key`.
    ///
    /// Returns the new direction, or [`ViewError::SortDescriptorNotFound`].
    pub fn toggle_sort_order_by(&self, key: &SortKey<T>) -> Result<SortDirection> {
        let descriptor = self.sort_descriptors.find(key).ok_or_else(|| {
            tracing::debug!(target: targets::VIEW, %key, "toggle of unknown sort descriptor");
            ViewError::sort_not_found(key.to_string())
        })?;
        Ok(descriptor.toggle())
    }

    // -------------------------------------------------------------------------
    // Paging
    // -------------------------------------------------------------------------

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.stages.read().page_size
    }

    /// Sets the page size.
    ///
    /// Fails with [`ViewError::InvalidPageSize`] if `page_size` is 0; the
    /// previous page size stands.
    pub fn set_page_size(&self, page_size: usize) -> Result<()> {
        if page_size < 1 {
            tracing::debug!(target: targets::VIEW, page_size, "invalid page size rejected");
            return Err(ViewError::InvalidPageSize { size: page_size });
        }
        self.stages.write().page_size = page_size;
        self.paging_changed();
        Ok(())
    }

    /// Returns the zero-based page index.
    pub fn page_index(&self) -> usize {
        self.stages.read().page_index
    }

    /// Sets the zero-based page index.
    pub fn set_page_index(&self, page_index: usize) {
        self.stages.write().page_index = page_index;
        self.paging_changed();
    }

    /// Moves to `page_index`, optionally changing the page size, recomputing
    /// once.
    pub fn page(&self, page_index: usize, page_size: Option<usize>) -> Result<()> {
        {
            let _paging = self.suppress_paging();
            if let Some(page_size) = page_size {
                self.set_page_size(page_size)?;
            }
            self.set_page_index(page_index);
        }
        self.paging_changed();
        Ok(())
    }

    /// Moves to `page_index` keeping the current page size.
    pub fn go_to_page(&self, page_index: usize) {
        self.set_page_index(page_index);
    }

    /// Returns `true` if there is a page before the current one.
    pub fn can_navigate_to_previous_page(&self) -> bool {
        self.stages.read().page_index > 0
    }

    /// Returns `true` if records remain past the current page.
    ///
    /// Measured against the sorted length recorded by the most recent paging
    /// recompute.
    pub fn can_navigate_to_next_page(&self) -> bool {
        let stages = self.stages.read();
        stages
            .page_index
            .saturating_add(1)
            .saturating_mul(stages.page_size)
            < stages.paged_from
    }

    /// Moves to the previous page.
    pub fn go_to_previous_page(&self) -> Result<()> {
        let page_index = self.page_index();
        if !self.can_navigate_to_previous_page() {
            tracing::debug!(target: targets::VIEW, page_index, "no previous page");
            return Err(ViewError::NoPreviousPage { page_index });
        }
        self.go_to_page(page_index - 1);
        Ok(())
    }

    /// Moves to the next page.
    pub fn go_to_next_page(&self) -> Result<()> {
        let page_index = self.page_index();
        if !self.can_navigate_to_next_page() {
            tracing::debug!(target: targets::VIEW, page_index, "no next page");
            return Err(ViewError::NoNextPage { page_index });
        }
        self.go_to_page(page_index + 1);
        Ok(())
    }

    /// Returns the number of pages the sorted stage spans.
    pub fn page_count(&self) -> usize {
        let stages = self.stages.read();
        stages.sorted.len().div_ceil(stages.page_size)
    }

    /// Returns the number of records in the sorted stage.
    pub fn total_count(&self) -> usize {
        self.stages.read().sorted.len()
    }

    // -------------------------------------------------------------------------
    // Notification
    // -------------------------------------------------------------------------

    /// Signal raised once per settled change, carrying the new paged stage.
    pub fn changed(&self) -> &Signal<ViewChanged<T>> {
        &self.changed
    }

    /// Subscribes to the paged stage as a stream.
    ///
    /// The stream yields the current page immediately, then every later
    /// change. All subscriptions share one bridge, created on first use.
    pub fn subscribe(&self) -> ViewSubscription<T> {
        let bridge = self
            .bridge
            .get_or_init(|| SubscriptionBridge::attach(&self.changed, self.config.broadcast_capacity));
        let updates = bridge.receiver();
        ViewSubscription::new(self.paged_view(), updates)
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.bridge
            .get()
            .map_or(0, SubscriptionBridge::subscriber_count)
    }

    /// Returns the configuration the view was created with.
    ///
    /// The paging fields are not updated by later paging calls; use
    /// [`page_size`](Self::page_size) and [`page_index`](Self::page_index)
    /// for the current values.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }
}

impl<T: Record> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages = self.stages.read();
        f.debug_struct("View")
            .field("records", &stages.data.len())
            .field("filtered", &stages.filtered.len())
            .field("sorted", &stages.sorted.len())
            .field("paged", &stages.paged.len())
            .field("page_size", &stages.page_size)
            .field("page_index", &stages.page_index)
            .field("filters", &self.filters)
            .field("sort_descriptors", &self.sort_descriptors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn change_counter(view: &View<i32>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        view.changed().connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_each_mutation_raises_one_change() {
        let view = View::new(1..=20);
        let count = change_counter(&view);

        view.set_data(1..=30);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        view.filters().add(|n| n % 3 == 0).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        view.sort(SortKey::key(|n: &i32| *n), SortDirection::Descending);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        view.set_page_size(4).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 4);

        view.page(1, Some(3)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert_eq!(view.view().to_vec(), vec![21, 18, 15]);
    }

    #[test]
    fn test_listeners_only_observe_settled_views() {
        let view = View::new(vec![3, 1, 2]);
        let observed = Arc::new(Mutex::new(Vec::new()));

        let observed_clone = observed.clone();
        view.changed().connect(move |event: &ViewChanged<i32>| {
            let source = event.source().unwrap();
            // Every stage is already consistent with the event.
            assert_eq!(source.paged_view(), *event.items());
            observed_clone.lock().push(event.items().to_vec());
        });

        view.sort(SortKey::key(|n: &i32| *n), SortDirection::Ascending);
        view.filter_by(|n| *n > 1);

        assert_eq!(*observed.lock(), vec![vec![1, 2, 3], vec![2, 3]]);
    }

    #[test]
    fn test_filter_accessor() {
        let view = View::new(1..=5);
        assert!(view.filter().is_none());

        view.filter_by(|n| *n > 3);
        let predicate = view.filter().unwrap();
        assert!(predicate(&4));
        assert_eq!(view.filters().names(), vec![DEFAULT_FILTER_NAME]);

        view.filters().add(|n| *n < 5).unwrap();
        assert!(view.filter().is_none());
        assert_eq!(view.view().to_vec(), vec![4]);

        view.clear_filter();
        assert!(view.filters().is_empty());
        assert_eq!(view.view().to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_set_filter_replaces_whole_set_with_one_change() {
        let view = View::new(1..=10);
        view.filters().add_named("a", |n| *n > 2).unwrap();
        view.filters().add_named("b", |n| *n < 9).unwrap();
        let count = change_counter(&view);

        view.filter_by(|n| n % 5 == 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(view.view().to_vec(), vec![5, 10]);
    }

    #[test]
    fn test_suppressed_filtering_batches_changes() {
        let view = View::new(1..=10);
        let count = change_counter(&view);

        {
            let _batch = view.suppress_filtering();
            view.filters().add(|n| *n > 2).unwrap();
            view.filters().add(|n| *n < 6).unwrap();
            assert_eq!(count.load(Ordering::SeqCst), 0);
            assert_eq!(view.view().len(), 10);
        }
        assert!(!view.is_filtering_suppressed());

        view.apply_filters();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(view.view().to_vec(), vec![3, 4, 5]);
    }

    #[test]
    fn test_suppression_guards_nest() {
        let view = View::<i32>::empty();
        {
            let _outer = view.suppress_sorting();
            {
                let _inner = view.suppress_sorting();
            }
            assert!(view.is_sorting_suppressed());
        }
        assert!(!view.is_sorting_suppressed());
    }

    #[test]
    fn test_suppressed_paging_stops_cascade_at_sorted_stage() {
        let view = View::new(vec![2, 1, 3]);
        let count = change_counter(&view);

        {
            let _paging = view.suppress_paging();
            view.sort(SortKey::key(|n: &i32| *n), SortDirection::Ascending);
        }
        assert_eq!(view.sorted_view().to_vec(), vec![1, 2, 3]);
        assert_eq!(view.paged_view().to_vec(), vec![2, 1, 3]);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        view.apply_paging();
        assert_eq!(view.paged_view().to_vec(), vec![1, 2, 3]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_page_call_restores_suppression() {
        let view = View::new(1..=10);
        view.set_page_size(3).unwrap();

        let err = view.page(2, Some(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!view.is_paging_suppressed());
        assert_eq!(view.page_size(), 3);
        assert_eq!(view.page_index(), 0);
    }

    #[test]
    fn test_toggle_sort_order_recomputes_once() {
        let view = View::new(vec![1, 2, 3]);
        view.sort_descriptors()
            .add(SortKey::key(|n: &i32| n % 2), SortDirection::Ascending);
        view.sort_descriptors()
            .add(SortKey::key(|n: &i32| *n), SortDirection::Ascending);
        assert_eq!(view.view().to_vec(), vec![2, 1, 3]);

        let count = change_counter(&view);
        view.toggle_sort_order();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(view.view().to_vec(), vec![3, 1, 2]);
    }

    #[test]
    fn test_toggle_sort_order_by() {
        let view = View::new(vec![1, 3, 2]);
        let key = SortKey::key(|n: &i32| *n);
        view.sort(key.clone(), SortDirection::Ascending);

        assert_eq!(
            view.toggle_sort_order_by(&key).unwrap(),
            SortDirection::Descending
        );
        assert_eq!(view.view().to_vec(), vec![3, 2, 1]);

        let stranger = SortKey::key(|n: &i32| *n);
        let err = view.toggle_sort_order_by(&stranger).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(view.view().to_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn test_clear_sort_restores_filtered_order() {
        let view = View::new(vec![3, 1, 2]);
        view.sort(SortKey::key(|n: &i32| *n), SortDirection::Ascending);
        view.clear_sort();
        assert_eq!(view.view().to_vec(), vec![3, 1, 2]);
    }

    #[test]
    fn test_page_beyond_end_is_empty() {
        let view = View::new(1..=5);
        view.page(4, Some(2)).unwrap();
        assert!(view.view().is_empty());
        assert!(!view.can_navigate_to_next_page());
        assert!(view.can_navigate_to_previous_page());
    }

    #[test]
    fn test_next_page_guard_uses_length_from_last_paging() {
        let view = View::new(1..=25);
        view.page(2, Some(10)).unwrap();
        assert!(!view.can_navigate_to_next_page());

        // The guard keeps the length recorded by the last paging recompute,
        // so it goes stale while paging is suppressed.
        {
            let _paging = view.suppress_paging();
            view.set_data(1..=100);
        }
        assert_eq!(view.total_count(), 100);
        assert!(!view.can_navigate_to_next_page());
        assert_eq!(view.view().to_vec(), (21..=25).collect::<Vec<_>>());

        view.apply_paging();
        assert!(view.can_navigate_to_next_page());
        assert_eq!(view.view().to_vec(), (21..=30).collect::<Vec<_>>());
    }

    #[test]
    fn test_next_page_guard_after_page_size_change() {
        let view = View::new(1..=100);
        view.page(2, Some(10)).unwrap();
        assert!(view.can_navigate_to_next_page());

        view.set_page_size(50).unwrap();
        assert!(view.view().is_empty());
        assert!(!view.can_navigate_to_next_page());

        view.set_page_size(5).unwrap();
        assert!(view.can_navigate_to_next_page());

        view.set_page_index(19);
        assert_eq!(view.view().to_vec(), vec![96, 97, 98, 99, 100]);
        assert!(!view.can_navigate_to_next_page());
    }

    #[test]
    fn test_page_count_and_total() {
        let view = View::new(1..=25);
        assert_eq!(view.page_count(), 1);

        view.set_page_size(10).unwrap();
        assert_eq!(view.page_count(), 3);
        assert_eq!(view.total_count(), 25);

        view.set_data(Vec::new());
        assert_eq!(view.page_count(), 0);
    }

    #[test]
    fn test_listener_may_mutate_view() {
        let view = View::new(1..=30);
        view.set_page_size(10).unwrap();

        // Snap back to the first page whenever the data shrinks below the
        // current page.
        view.changed().connect(|event: &ViewChanged<i32>| {
            if event.items().is_empty() {
                if let Some(view) = event.source() {
                    if view.page_index() > 0 {
                        view.go_to_page(0);
                    }
                }
            }
        });

        view.go_to_page(2);
        view.set_data(1..=5);
        assert_eq!(view.page_index(), 0);
        assert_eq!(view.view().to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_config_keeps_creation_values() {
        let view = View::with_config(1..=30, ViewConfig::paged(10)).unwrap();
        view.page(2, Some(5)).unwrap();

        assert_eq!(view.config().page_size, 10);
        assert_eq!(view.config().page_index, 0);
        assert_eq!(view.page_size(), 5);
        assert_eq!(view.page_index(), 2);
    }

    #[test]
    fn test_with_config_validates() {
        assert!(View::with_config(1..=3, ViewConfig::paged(0)).is_err());
        let view = View::with_config(1..=3, ViewConfig::paged(2)).unwrap();
        assert_eq!(view.view().to_vec(), vec![1, 2]);
    }
}
