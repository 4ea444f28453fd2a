//! Signal/slot system for Collection View.
//!
//! A [`Signal`] is an ordered list of slots (callbacks). Emitting the signal
//! invokes every connected slot synchronously, in the order the slots were
//! connected, on the emitting thread. Every mutable entity in the view
//! pipeline (filter descriptors, sort descriptors, descriptor sets and the
//! view itself) owns one signal and raises it when its state changes.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//!
//! # Re-entrancy
//!
//! Emission walks the connection list by position and does not hold the
//! connection lock while a slot runs. A slot may therefore connect or
//! disconnect slots on the signal that is currently emitting; the remainder of
//! that emission observes the partially-updated list. Disconnecting the
//! running slot shifts its successors down by one position, so the next slot
//! is skipped for that emission.
//!
//! # Example
//!
//! ```
//! use collection_view_core::Signal;
//!
//! // Create a signal that passes a string argument
//! let text_changed = Signal::<String>::new();
//!
//! // Connect a slot (closure)
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! // Emit the signal
//! text_changed.emit("Hello".to_string());
//!
//! // Disconnect when done
//! text_changed.disconnect(conn_id).unwrap();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::SignalError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

/// A connected slot.
type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Connection storage. `order` holds the registration order; `slots` owns the
/// callbacks and hands out the keys.
struct Connections<Args> {
    slots: SlotMap<ConnectionId, Slot<Args>>,
    order: Vec<ConnectionId>,
}

impl<Args> Connections<Args> {
    fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    fn slot_at(&self, position: usize) -> Option<Slot<Args>> {
        let id = self.order.get(position)?;
        self.slots.get(*id).cloned()
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. Slots always run on the emitting thread;
/// there is no queued delivery.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<Connections<Args>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections::new()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// The slot is appended after every slot already connected. Returns a
    /// `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use collection_view_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        let id = connections.slots.insert(Arc::new(slot));
        connections.order.push(id);
        id
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns [`SignalError::InvalidConnection`] if the connection does not
    /// exist (never connected, or already disconnected).
    pub fn disconnect(&self, id: ConnectionId) -> Result<(), SignalError> {
        let mut connections = self.connections.lock();
        if connections.slots.remove(id).is_none() {
            tracing::debug!(target: targets::SIGNAL, ?id, "disconnect of unknown connection");
            return Err(SignalError::InvalidConnection);
        }
        if let Some(position) = connections.order.iter().position(|&c| c == id) {
            connections.order.remove(position);
        }
        Ok(())
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let mut connections = self.connections.lock();
        connections.slots.clear();
        connections.order.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().order.len()
    }

    /// Returns `true` if `id` refers to a live connection on this signal.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.lock().slots.contains_key(id)
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` will do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in registration order.
    ///
    /// If the signal is blocked, this does nothing.
    #[tracing::instrument(skip_all, target = "collection_view_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        tracing::trace!(
            target: targets::SIGNAL,
            connection_count = self.connection_count(),
            "emitting signal"
        );

        let mut position = 0;
        loop {
            // The lock is released before the slot runs.
            let slot = self.connections.lock().slot_at(position);
            match slot {
                Some(slot) => slot(&args),
                None => break,
            }
            position += 1;
        }
    }
}
