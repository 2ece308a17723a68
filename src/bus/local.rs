// SPDX-License-Identifier: GPL-3.0-or-later
use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tracing::{debug, info_span, trace, warn};
use tracing_futures::Instrument;

use super::spmc;
use super::traits::{Channel, MessageBus, Publisher, SharedSubscriber, Subscription};

/// An in-process message bus with one broadcast channel per [`Channel`].
#[derive(Debug)]
pub struct LocalBus {
    capacity: usize,
    channels: Mutex<HashMap<Channel, spmc::Sender<Bytes>>>,
}

impl LocalBus {
    /// Create a bus where each subscriber can fall up to `capacity` messages behind before it
    /// starts missing messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// The number of channels that currently have a sender.
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    fn messages(&self, channel: Channel) -> impl Stream<Item = Bytes> {
        // Subscribing while holding the lock keeps `publish` from pruning the sender first.
        self.channels
            .lock()
            .entry(channel)
            .or_insert_with(|| spmc::Sender::new(self.capacity))
            .stream()
    }
}

#[async_trait]
impl Publisher for LocalBus {
    type Item = Bytes;
    type Error = anyhow::Error;

    async fn publish(&self, channel: Channel, item: Bytes) -> anyhow::Result<usize> {
        let delivered = {
            let mut channels = self.channels.lock();
            let receivers = channels.get(&channel).map(spmc::Sender::receiver_count);
            match receivers {
                Some(0) => {
                    channels.remove(&channel);
                    debug!(channel, "removed channel without subscribers");
                    0
                }
                Some(_) => channels.get(&channel).map_or(0, |sender| sender.send(item)),
                None => 0,
            }
        };
        trace!(channel, delivered, "published message");
        Ok(delivered)
    }
}

impl MessageBus for LocalBus {
    fn subscribe(&self, channel: Channel, subscriber: SharedSubscriber) -> Subscription {
        // Subscribe before spawning so nothing published after this call is missed.
        let mut messages = Box::pin(self.messages(channel));
        let task = tokio::spawn(
            async move {
                while let Some(message) = messages.next().await {
                    if let Err(err) = subscriber.receive(message).await {
                        warn!(error = %err, "subscriber failed to handle message");
                    }
                }
                debug!("channel closed");
            }
            .instrument(info_span!("subscription", channel)),
        );
        Subscription::new(channel, task)
    }
}
