// SPDX-License-Identifier: GPL-3.0-or-later
//! Single producer, multiple consumer broadcast channels.
use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::util::stream::StreamExt as _;

/// The sending half of a broadcast channel. Receivers are created on demand with
/// [`stream`][Sender::stream].
#[derive(Clone, Debug)]
pub struct Sender<T> {
    inner: broadcast::Sender<T>,
}

impl<T: 'static + Clone + Send> Sender<T> {
    /// Create a channel holding up to `capacity` unreceived items per receiver.
    pub fn new(capacity: usize) -> Self {
        // broadcast::channel panics on a zero capacity
        let (inner, _) = broadcast::channel(capacity.max(1));
        Self { inner }
    }

    /// Send `item` to every current receiver, returning how many there were.
    ///
    /// Items sent while there are no receivers are dropped.
    pub fn send(&self, item: T) -> usize {
        // Send errors only mean nobody is listening right now.
        self.inner.send(item).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.inner.receiver_count()
    }

    /// Subscribe to every item sent after this call.
    ///
    /// A receiver that falls more than the channel capacity behind skips the oldest items.
    pub fn stream(&self) -> impl Stream<Item = T> {
        BroadcastStream::new(self.inner.subscribe()).skip_lagged()
    }
}

impl<T: 'static + Clone + Send> Default for Sender<T> {
    fn default() -> Self {
        Self::new(1)
    }
}
