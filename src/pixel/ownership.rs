// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use super::native::{NativeBuffer, NativeStorage};

/// Whether a buffer is responsible for the memory it reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// The buffer holds the only claim it needs on its memory, and gives it up exactly once when
    /// dropped.
    Owned,

    /// The buffer reads memory kept alive by someone else, and never releases it.
    Borrowed,
}

/// The memory behind a buffer's planes.
pub(crate) enum Backing {
    /// Tightly packed storage allocated by this crate.
    Packed(Bytes),

    /// Native memory kept alive by a retained reference, released when this is dropped.
    Retained(NativeBuffer),

    /// Native memory aliased without a reference. Once every reference to the native buffer has
    /// been released, reads return whatever the memory was overwritten with.
    Borrowed(Arc<NativeStorage>),
}

impl Backing {
    pub(crate) fn from_native(handle: &NativeBuffer, take_ownership: bool) -> Self {
        if take_ownership {
            Self::Retained(handle.retain())
        } else {
            Self::Borrowed(handle.alias())
        }
    }

    pub(crate) fn ownership(&self) -> Ownership {
        match self {
            Self::Packed(_) | Self::Retained(_) => Ownership::Owned,
            Self::Borrowed(_) => Ownership::Borrowed,
        }
    }

    /// Run `f` with the raw memory, holding the native read lock for the duration.
    pub(crate) fn with_bytes<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        match self {
            Self::Packed(bytes) => f(bytes),
            Self::Retained(handle) => f(&handle.lock_read()),
            Self::Borrowed(storage) => f(&storage.read()),
        }
    }
}

impl fmt::Debug for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packed(bytes) => f.debug_tuple("Packed").field(&bytes.len()).finish(),
            Self::Retained(handle) => f.debug_tuple("Retained").field(handle).finish(),
            Self::Borrowed(_) => f.debug_tuple("Borrowed").finish(),
        }
    }
}
