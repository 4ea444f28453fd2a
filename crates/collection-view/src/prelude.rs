//! Prelude module for Collection View.
//!
//! ```ignore
//! use collection_view::prelude::*;
//! ```

// ============================================================================
// View
// ============================================================================

pub use crate::{Snapshot, View, ViewBuilder, ViewChanged, ViewConfig, ViewSubscription};

// ============================================================================
// Filtering and Sorting
// ============================================================================

pub use crate::{FilterDescriptor, FilterSet};
pub use crate::{SortDescriptor, SortDescriptorSet, SortDirection, SortKey};

// ============================================================================
// Records
// ============================================================================

pub use crate::{FieldValue, Record};

// ============================================================================
// Errors and Signals
// ============================================================================

pub use crate::{ConnectionId, Signal, ViewError};
