//! View configuration and builder.

use std::sync::Arc;

use crate::error::{Result, ViewError};
use crate::filter::FilterDescriptor;
use crate::sort::{SortDescriptor, SortDirection, SortKey};
use crate::value::Record;
use crate::view::View;

/// Page size that fits every record on a single page.
pub const UNBOUNDED_PAGE_SIZE: usize = usize::MAX;

/// Default capacity of the subscription broadcast channel.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Configuration for creating a [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// Number of records per page. Must be at least 1.
    pub page_size: usize,
    /// Zero-based index of the current page.
    pub page_index: usize,
    /// How many snapshots a slow subscriber may fall behind before it starts
    /// skipping them.
    pub broadcast_capacity: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: UNBOUNDED_PAGE_SIZE,
            page_index: 0,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl ViewConfig {
    /// Create a configuration with the given page size.
    pub fn paged(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    /// Checks the configuration, rejecting a page size below 1.
    pub fn validate(&self) -> Result<()> {
        if self.page_size < 1 {
            return Err(ViewError::InvalidPageSize {
                size: self.page_size,
            });
        }
        Ok(())
    }
}

/// Builder for creating views with initial data, filters and sorting.
///
/// The pipeline is computed once, after every initial filter and sort
/// descriptor has been installed.
///
/// # Example
///
/// ```
/// use collection_view::{SortDirection, SortKey, View};
///
/// let view = View::builder()
///     .data(1..=25)
///     .filter("odd", |n: &i32| n % 2 == 1)
///     .sort(SortKey::key(|n: &i32| *n), SortDirection::Descending)
///     .page_size(5)
///     .build()
///     .unwrap();
///
/// assert_eq!(view.view().to_vec(), vec![25, 23, 21, 19, 17]);
/// ```
pub struct ViewBuilder<T: Record> {
    data: Vec<T>,
    config: ViewConfig,
    filters: Vec<Arc<FilterDescriptor<T>>>,
    sort_descriptors: Vec<Arc<SortDescriptor<T>>>,
}

impl<T: Record> Default for ViewBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> ViewBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            config: ViewConfig::default(),
            filters: Vec::new(),
            sort_descriptors: Vec::new(),
        }
    }

    /// Set the initial records.
    pub fn data(mut self, data: impl IntoIterator<Item = T>) -> Self {
        self.data = data.into_iter().collect();
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set the initial page index.
    pub fn page_index(mut self, page_index: usize) -> Self {
        self.config.page_index = page_index;
        self
    }

    /// Set the subscription channel capacity.
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast_capacity = capacity;
        self
    }

    /// Add a named filter.
    pub fn filter<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filters
            .push(Arc::new(FilterDescriptor::new(name, predicate)));
        self
    }

    /// Add a pre-built filter descriptor.
    pub fn filter_descriptor(mut self, descriptor: Arc<FilterDescriptor<T>>) -> Self {
        self.filters.push(descriptor);
        self
    }

    /// Add a sort descriptor.
    pub fn sort(mut self, key: impl Into<SortKey<T>>, direction: SortDirection) -> Self {
        self.sort_descriptors
            .push(Arc::new(SortDescriptor::new(key, direction)));
        self
    }

    /// Add a pre-built sort descriptor.
    pub fn sort_descriptor(mut self, descriptor: Arc<SortDescriptor<T>>) -> Self {
        self.sort_descriptors.push(descriptor);
        self
    }

    /// Build the view.
    ///
    /// Fails if the page size is below 1 or two filters share a name.
    pub fn build(self) -> Result<Arc<View<T>>> {
        self.config.validate()?;
        let view = View::create(self.data, self.config);
        if self.filters.is_empty() && self.sort_descriptors.is_empty() {
            return Ok(view);
        }

        {
            let _filtering = view.suppress_filtering();
            let _sorting = view.suppress_sorting();
            for descriptor in self.filters {
                view.filters().insert(descriptor)?;
            }
            for descriptor in self.sort_descriptors {
                view.sort_descriptors().insert(descriptor);
            }
        }
        view.apply_filters();
        Ok(view)
    }
}
