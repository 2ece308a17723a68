// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinHandle;

/// Identifies a stream of messages on a bus.
pub type Channel = u16;

#[async_trait]
pub trait Publisher {
    type Item;
    type Error;

    /// Send `item` to everything subscribed to `channel`, returning how many subscribers that was.
    async fn publish(&self, channel: Channel, item: Self::Item) -> Result<usize, Self::Error>;
}

#[async_trait]
pub trait Subscriber {
    type Item;
    type Error;

    async fn receive(&self, item: Self::Item) -> Result<(), Self::Error>;
}

pub type SharedSubscriber = Arc<dyn Subscriber<Item = Bytes, Error = anyhow::Error> + Send + Sync>;

/// A bus carrying encoded messages between nodes.
pub trait MessageBus: Publisher<Item = Bytes, Error = anyhow::Error> + Send + Sync {
    /// Deliver every message published on `channel` from now on to `subscriber`, until the
    /// returned [`Subscription`] is dropped.
    fn subscribe(&self, channel: Channel, subscriber: SharedSubscriber) -> Subscription;
}

/// A live subscription. Dropping it stops delivery.
#[derive(Debug)]
pub struct Subscription {
    channel: Channel,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(channel: Channel, task: JoinHandle<()>) -> Self {
        Self { channel, task }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
