// SPDX-License-Identifier: GPL-3.0-or-later
//! A model of the reference-counted pixel buffers handed out by capture drivers.
//!
//! A [`NativeBuffer`] value is one retained reference to a block of image memory. Cloning a
//! reference is explicit ([`NativeBuffer::retain`]), and dropping a value releases it. When the
//! last reference is released the memory is given back, which is modelled by overwriting it with
//! [`POISON`]: anything still aliasing the memory without holding a reference will see garbage
//! instead of the original pixels.
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use super::format::PixelFormat;
use super::plane::PlaneLayout;
use crate::error::{Error, Result};

/// Rows of native buffers start on multiples of this many bytes.
pub const ROW_ALIGNMENT: usize = 16;

/// The byte pattern released memory is overwritten with.
pub const POISON: u8 = 0xDD;

/// Pixel format tags used by native buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeFormat {
    /// Bi-planar 4:2:0 YCbCr, full range (`420f`).
    BiPlanar420Full,
    /// Bi-planar 4:2:0 YCbCr, video range (`420v`).
    BiPlanar420Video,
    /// 32-bit BGRA (`BGRA`).
    Bgra32,
    /// 8-bit single component (`L008`).
    OneComponent8,
    /// Any other four character code.
    Other(u32),
}

impl NativeFormat {
    pub fn fourcc(self) -> u32 {
        match self {
            Self::BiPlanar420Full => u32::from_be_bytes(*b"420f"),
            Self::BiPlanar420Video => u32::from_be_bytes(*b"420v"),
            Self::Bgra32 => u32::from_be_bytes(*b"BGRA"),
            Self::OneComponent8 => u32::from_be_bytes(*b"L008"),
            Self::Other(code) => code,
        }
    }

    /// The buffer layout this format is read as, if it is one this crate understands.
    pub fn pixel_format(self) -> Option<PixelFormat> {
        match self {
            Self::BiPlanar420Full | Self::BiPlanar420Video => Some(PixelFormat::YCbCr),
            Self::Bgra32 => Some(PixelFormat::Bgra),
            Self::OneComponent8 => Some(PixelFormat::Gray),
            Self::Other(_) => None,
        }
    }
}

impl From<PixelFormat> for NativeFormat {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::YCbCr => Self::BiPlanar420Full,
            PixelFormat::Bgra => Self::Bgra32,
            PixelFormat::Gray => Self::OneComponent8,
        }
    }
}

impl fmt::Display for NativeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.fourcc().to_be_bytes();
        if code.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            write!(f, "'{}'", String::from_utf8_lossy(&code))
        } else {
            write!(f, "{:#010x}", self.fourcc())
        }
    }
}

pub(crate) struct NativeStorage {
    format: NativeFormat,
    width: usize,
    height: usize,
    planes: Vec<PlaneLayout>,
    data: RwLock<Vec<u8>>,
    retain_count: AtomicUsize,
}

impl NativeStorage {
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.data.read()
    }
}

/// One retained reference to native image memory.
pub struct NativeBuffer {
    storage: Arc<NativeStorage>,
}

impl NativeBuffer {
    /// Allocate a zero-filled buffer with each row padded out to [`ROW_ALIGNMENT`].
    ///
    /// The new buffer starts with a single retained reference, owned by the returned value.
    pub fn new(format: NativeFormat, width: usize, height: usize) -> Result<Self> {
        let pixel_format = format
            .pixel_format()
            .ok_or(Error::UnsupportedPixelFormat(format))?;
        let allocation_error = || Error::BufferAllocationError {
            format: pixel_format,
            width,
            height,
        };
        if width == 0 || height == 0 || pixel_format.checked_packed_len(width, height).is_none() {
            return Err(allocation_error());
        }
        let mut planes = Vec::with_capacity(pixel_format.plane_count());
        let mut total_len: usize = 0;
        for packed in pixel_format.packed_planes(width, height) {
            let stride = packed
                .row_len()
                .checked_add(ROW_ALIGNMENT - 1)
                .map(|len| len / ROW_ALIGNMENT * ROW_ALIGNMENT)
                .ok_or_else(allocation_error)?;
            let plane = PlaneLayout {
                offset: total_len,
                stride,
                ..packed
            };
            total_len = stride
                .checked_mul(plane.rows)
                .and_then(|len| len.checked_add(total_len))
                .ok_or_else(allocation_error)?;
            planes.push(plane);
        }
        let mut data = Vec::new();
        data.try_reserve_exact(total_len)
            .map_err(|_| allocation_error())?;
        data.resize(total_len, 0u8);
        trace!(%format, width, height, bytes = total_len, "allocated native buffer");
        Ok(Self {
            storage: Arc::new(NativeStorage {
                format,
                width,
                height,
                planes,
                data: RwLock::new(data),
                retain_count: AtomicUsize::new(1),
            }),
        })
    }

    /// Wrap memory described by a driver, taking the single initial reference.
    ///
    /// Nothing is checked here. Formats this crate doesn't model and plane descriptions that
    /// don't fit the memory are rejected when the memory is wrapped by a
    /// [`PixelBuffer`][super::PixelBuffer].
    pub fn from_raw_parts(
        format: NativeFormat,
        width: usize,
        height: usize,
        planes: Vec<PlaneLayout>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            storage: Arc::new(NativeStorage {
                format,
                width,
                height,
                planes,
                data: RwLock::new(data),
                retain_count: AtomicUsize::new(1),
            }),
        }
    }

    pub fn format(&self) -> NativeFormat {
        self.storage.format
    }

    pub fn width(&self) -> usize {
        self.storage.width
    }

    pub fn height(&self) -> usize {
        self.storage.height
    }

    pub fn plane_count(&self) -> usize {
        self.storage.planes.len()
    }

    pub fn plane(&self, index: usize) -> Option<PlaneLayout> {
        self.storage.planes.get(index).copied()
    }

    /// Lock the memory for reading. It is unlocked when the guard is dropped.
    pub fn lock_read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.storage.read()
    }

    /// Lock the memory for writing. It is unlocked when the guard is dropped.
    pub fn lock_write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.storage.data.write()
    }

    /// Take out another reference to the same memory.
    pub fn retain(&self) -> Self {
        let previous = self.storage.retain_count.fetch_add(1, Ordering::AcqRel);
        trace!(retain_count = previous + 1, "retained native buffer");
        Self {
            storage: Arc::clone(&self.storage),
        }
    }

    /// Give up this reference. Equivalent to dropping it.
    pub fn release(self) {}

    pub fn retain_count(&self) -> usize {
        self.storage.retain_count.load(Ordering::Acquire)
    }

    /// A handle to the memory that does *not* hold a reference.
    pub(crate) fn alias(&self) -> Arc<NativeStorage> {
        Arc::clone(&self.storage)
    }
}

impl Drop for NativeBuffer {
    fn drop(&mut self) {
        let previous = self.storage.retain_count.fetch_sub(1, Ordering::AcqRel);
        trace!(retain_count = previous - 1, "released native buffer");
        if previous == 1 {
            let mut data = self.storage.data.write();
            data.iter_mut().for_each(|byte| *byte = POISON);
            trace!("native buffer memory returned");
        }
    }
}

impl fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("format", &self.storage.format)
            .field("width", &self.storage.width)
            .field("height", &self.storage.height)
            .field("planes", &self.storage.planes)
            .field("retain_count", &self.retain_count())
            .finish()
    }
}
