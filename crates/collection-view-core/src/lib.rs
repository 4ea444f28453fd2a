//! Core systems for Collection View.
//!
//! This crate provides the foundational pieces shared by the view pipeline:
//!
//! - **Signal/Slot System**: Ordered, synchronous change notification
//! - **Errors**: The signal error type
//! - **Logging**: `tracing` targets and span helpers
//!
//! # Signal/Slot Example
//!
//! ```
//! use collection_view_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! assert!(value_changed.disconnect(conn_id).is_ok());
//! ```

mod error;
pub mod logging;
pub mod signal;

pub use error::{SignalError, SignalResult};
pub use logging::StageSpan;
pub use signal::{ConnectionId, Signal};
