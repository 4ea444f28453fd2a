//! Push-based subscriptions to a view's paged stage.
//!
//! A view owns at most one bridge, created by the first
//! [`View::subscribe`](crate::View::subscribe) call. The bridge listens to the
//! view's change signal and multicasts every new page over a tokio broadcast
//! channel, so any number of subscribers share one listener.
//!
//! ```ignore
//! use collection_view::View;
//! use tokio_stream::StreamExt;
//!
//! let view = View::new(1..=5);
//! let mut pages = view.subscribe();
//!
//! // The current page is replayed first.
//! assert_eq!(pages.next().await.unwrap().to_vec(), vec![1, 2, 3, 4, 5]);
//!
//! view.filter_by(|n| *n > 3);
//! assert_eq!(pages.next().await.unwrap().to_vec(), vec![4, 5]);
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};

use collection_view_core::Signal;
use collection_view_core::logging::targets;
use pin_project_lite::pin_project;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::snapshot::Snapshot;
use crate::value::Record;
use crate::view::ViewChanged;

/// Forwards view changes into a broadcast channel.
pub(crate) struct SubscriptionBridge<T> {
    sender: broadcast::Sender<Snapshot<T>>,
}

impl<T: Record> SubscriptionBridge<T> {
    /// Connects a new bridge to `changed`.
    pub(crate) fn attach(changed: &Signal<ViewChanged<T>>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let forward = sender.clone();
        changed.connect(move |event: &ViewChanged<T>| {
            if forward.send(event.items().clone()).is_err() {
                tracing::trace!(target: targets::SUBSCRIPTION, "no live subscribers");
            }
        });
        tracing::debug!(target: targets::SUBSCRIPTION, capacity, "subscription bridge attached");
        Self { sender }
    }

    /// Returns a receiver for every change from now on.
    pub(crate) fn receiver(&self) -> broadcast::Receiver<Snapshot<T>> {
        self.sender.subscribe()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pin_project! {
    /// Stream of paged snapshots returned by [`View::subscribe`](crate::View::subscribe).
    ///
    /// Yields the page current at subscription time, then one snapshot per
    /// later change. A subscriber that falls more than the configured
    /// broadcast capacity behind skips the oldest snapshots and resumes with
    /// newer ones. The stream ends when the view is dropped.
    pub struct ViewSubscription<T> {
        replay: Option<Snapshot<T>>,
        #[pin]
        updates: BroadcastStream<Snapshot<T>>,
    }
}

impl<T: Record> ViewSubscription<T> {
    pub(crate) fn new(current: Snapshot<T>, updates: broadcast::Receiver<Snapshot<T>>) -> Self {
        Self {
            replay: Some(current),
            updates: BroadcastStream::new(updates),
        }
    }
}

impl<T: Record> Stream for ViewSubscription<T> {
    type Item = Snapshot<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if let Some(current) = this.replay.take() {
            return Poll::Ready(Some(current));
        }

        loop {
            match this.updates.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(snapshot))) => return Poll::Ready(Some(snapshot)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    tracing::warn!(target: targets::SUBSCRIPTION, skipped, "subscriber lagged, skipping snapshots");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
