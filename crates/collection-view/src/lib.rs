//! Collection View - filtered, sorted and paged views over in-memory collections.
//!
//! A [`View`] wraps a collection of records and keeps three derived stages
//! up to date as the data, filters, sort descriptors or paging change:
//!
//! - **Filtering**: a [`FilterSet`] of named predicates, all of which must pass
//! - **Sorting**: a [`SortDescriptorSet`] of keys, the first registered dominating
//! - **Paging**: a page size and zero-based page index over the sorted records
//!
//! Every settled change is announced once through [`View::changed`], and can
//! be consumed as a stream with [`View::subscribe`].
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use collection_view::prelude::*;
//!
//! fn product(name: &str, price: i64) -> HashMap<String, FieldValue> {
//!     HashMap::from([
//!         ("name".to_string(), FieldValue::from(name)),
//!         ("price".to_string(), FieldValue::from(price)),
//!     ])
//! }
//!
//! let view = View::new(vec![
//!     product("lamp", 40),
//!     product("desk", 250),
//!     product("chair", 120),
//! ]);
//!
//! view.filters()
//!     .add_named("affordable", |p| p.field("price").as_int() < Some(200))
//!     .unwrap();
//! view.sort("price", SortDirection::Descending);
//!
//! let names: Vec<_> = view
//!     .view()
//!     .iter()
//!     .map(|p| p.field("name"))
//!     .collect();
//! assert_eq!(names, vec![FieldValue::from("chair"), FieldValue::from("lamp")]);
//! ```

mod config;
mod error;
pub mod filter;
pub mod prelude;
mod snapshot;
pub mod sort;
mod subscription;
mod value;
mod view;

pub use config::{DEFAULT_BROADCAST_CAPACITY, UNBOUNDED_PAGE_SIZE, ViewBuilder, ViewConfig};
pub use error::{ErrorKind, Result, ViewError};
pub use filter::{FilterDescriptor, FilterSet, Predicate};
pub use snapshot::Snapshot;
pub use sort::{SortDescriptor, SortDescriptorSet, SortDirection, SortKey};
pub use subscription::ViewSubscription;
pub use value::{FieldValue, Record};
pub use view::{DEFAULT_FILTER_NAME, SuppressionGuard, View, ViewChanged};

pub use collection_view_core::{ConnectionId, Signal, SignalError};
