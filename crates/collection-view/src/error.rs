//! Error types for view operations.

use collection_view_core::SignalError;

/// Result type alias for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;

/// Broad classification of a [`ViewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An argument failed validation; the previous value stands.
    Validation,
    /// A filter with the same name is already registered.
    DuplicateName,
    /// The target of a remove, toggle or disconnect does not exist.
    NotFound,
    /// A navigation guard was violated.
    IllegalState,
}

/// Errors that can occur while configuring or navigating a view.
///
/// Every error is reported synchronously to the caller and leaves the view
/// unchanged. Errors are never delivered through the change signal or the
/// subscription stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// Page size below 1.
    #[error("Invalid page size {size}: page size must be at least 1")]
    InvalidPageSize { size: usize },

    /// Filter name collision.
    #[error("A filter named '{name}' already exists")]
    DuplicateFilterName { name: String },

    /// No filter with the given name.
    #[error("No filter named '{name}'")]
    FilterNotFound { name: String },

    /// No sort descriptor with the given selector.
    #[error("No sort descriptor for {key}")]
    SortDescriptorNotFound { key: String },

    /// Already on the first page.
    #[error("Cannot navigate to the previous page from page {page_index}")]
    NoPreviousPage { page_index: usize },

    /// Already on the last page.
    #[error("Cannot navigate past page {page_index}: no further items")]
    NoNextPage { page_index: usize },

    /// Signal error.
    #[error(transparent)]
    Signal(#[from] SignalError),
}

impl ViewError {
    /// Create a duplicate filter name error.
    pub fn duplicate_filter(name: impl Into<String>) -> Self {
        Self::DuplicateFilterName { name: name.into() }
    }

    /// Create a filter not found error.
    pub fn filter_not_found(name: impl Into<String>) -> Self {
        Self::FilterNotFound { name: name.into() }
    }

    /// Create a sort descriptor not found error.
    pub fn sort_not_found(key: impl Into<String>) -> Self {
        Self::SortDescriptorNotFound { key: key.into() }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPageSize { .. } => ErrorKind::Validation,
            Self::DuplicateFilterName { .. } => ErrorKind::DuplicateName,
            Self::FilterNotFound { .. }
            | Self::SortDescriptorNotFound { .. }
            | Self::Signal(SignalError::InvalidConnection) => ErrorKind::NotFound,
            Self::NoPreviousPage { .. } | Self::NoNextPage { .. } => ErrorKind::IllegalState,
        }
    }
}
