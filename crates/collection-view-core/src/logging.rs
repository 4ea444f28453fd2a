//! Logging facilities for Collection View.
//!
//! Collection View uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Stage recomputes are logged at `trace` level, rejected mutations at
//! `debug`, and dropped subscription snapshots at `warn`.

/// Span names used throughout Collection View for tracing.
///
/// These constants can be used to filter traces for specific subsystems.
pub mod span_names {
    /// Stage recompute span.
    pub const STAGE: &str = "collection_view::stage";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem, e.g.
/// `RUST_LOG=collection_view::view=trace`.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "collection_view_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "collection_view_core::signal";
    /// View orchestrator target.
    pub const VIEW: &str = "collection_view::view";
    /// Filter descriptors and filter sets.
    pub const FILTER: &str = "collection_view::filter";
    /// Sort descriptors and sort descriptor sets.
    pub const SORT: &str = "collection_view::sort";
    /// Subscription bridge target.
    pub const SUBSCRIPTION: &str = "collection_view::subscription";
}

/// A span covering one stage recompute.
///
/// The span is active until the guard is dropped.
///
/// # Example
///
/// ```
/// use collection_view_core::logging::StageSpan;
///
/// {
///     let _span = StageSpan::new("filtered");
///     // ... recompute the stage ...
/// } // Span ends here
/// ```
pub struct StageSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl StageSpan {
    /// Enter a span for the named stage.
    pub fn new(stage: &'static str) -> Self {
        let span = tracing::trace_span!(target: span_names::STAGE, "stage", stage);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_namespaced() {
        for target in [targets::VIEW, targets::FILTER, targets::SORT, targets::SUBSCRIPTION] {
            assert!(target.starts_with("collection_view::"));
        }
        assert!(targets::SIGNAL.starts_with(targets::CORE));
    }

    #[test]
    fn test_stage_span_uses_stage_target() {
        let _span = StageSpan::new("sorted");
        assert!(span_names::STAGE.starts_with("collection_view::"));
        assert_ne!(span_names::STAGE, targets::VIEW);
    }

    #[test]
    fn test_stage_span_with_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let _span = StageSpan::new("paged");
            tracing::trace!(target: targets::VIEW, "inside stage span");
        });
    }
}
