// SPDX-License-Identifier: GPL-3.0-or-later
//! [`Stream`][futures::Stream] extensions.
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{ready, Stream};
use pin_project::pin_project;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

pub trait StreamExt: Stream {
    /// Pass through received items, logging and skipping over any lag notifications.
    fn skip_lagged<T>(self) -> SkipLagged<Self>
    where
        Self: Sized + Stream<Item = Result<T, BroadcastStreamRecvError>>,
    {
        SkipLagged::new(self)
    }
}

impl<St: Stream> StreamExt for St {}

#[pin_project]
#[derive(Debug)]
pub struct SkipLagged<St> {
    #[pin]
    stream: St,
    skipped: u64,
}

impl<St> SkipLagged<St> {
    fn new(stream: St) -> Self {
        Self { stream, skipped: 0 }
    }
}

impl<St, T> Stream for SkipLagged<St>
where
    St: Stream<Item = Result<T, BroadcastStreamRecvError>>,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        Poll::Ready(loop {
            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(item)) => break Some(item),
                Some(Err(BroadcastStreamRecvError::Lagged(count))) => {
                    *this.skipped += count;
                    warn!(count, total = *this.skipped, "receiver lagged, dropped messages");
                }
                None => break None,
            }
        })
    }
}
