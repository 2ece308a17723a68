// SPDX-License-Identifier: GPL-3.0-or-later
//! Moving encoded messages between nodes.
mod local;
pub mod spmc;
mod traits;

pub use local::LocalBus;
pub use traits::{Channel, MessageBus, Publisher, SharedSubscriber, Subscriber, Subscription};
