// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;

use bytes::Bytes;
use tracing::{debug, trace};

use super::format::PixelFormat;
use super::native::NativeBuffer;
use super::ownership::{Backing, Ownership};
use super::plane::{chroma_extent, PlaneLayout, Region, NEUTRAL_CHROMA};
use crate::error::{Error, Result};

/// A set of planes sharing one block of memory.
#[derive(Debug)]
struct Planes<const N: usize> {
    layouts: [PlaneLayout; N],
    backing: Backing,
}

impl<const N: usize> Planes<N> {
    fn new(layouts: Vec<PlaneLayout>, backing: Backing) -> Option<Self> {
        let layouts = <[PlaneLayout; N]>::try_from(layouts).ok()?;
        Some(Self { layouts, backing })
    }

    // The first plane is always the full resolution one.
    fn width(&self) -> usize {
        self.layouts[0].cols
    }

    fn height(&self) -> usize {
        self.layouts[0].rows
    }

    /// Tightly packed layouts for the current geometry.
    ///
    /// Planes after the first are 4:2:0 chroma, and always cover `ceil(width / 2)` by
    /// `ceil(height / 2)` pixels, even when an odd crop left the view a row or column short.
    fn packed_layouts(&self) -> [PlaneLayout; N] {
        let (width, height) = (self.width(), self.height());
        let mut offset = 0;
        let mut layouts = self.layouts;
        for (index, layout) in layouts.iter_mut().enumerate() {
            let (cols, rows) = match index {
                0 => (width, height),
                _ => (chroma_extent(width), chroma_extent(height)),
            };
            *layout = PlaneLayout::packed(offset, cols, rows, layout.samples_per_pixel);
            offset += layout.packed_len();
        }
        layouts
    }

    fn pack(&self) -> Bytes {
        let targets = self.packed_layouts();
        let mut packed = Vec::with_capacity(targets.iter().map(PlaneLayout::packed_len).sum());
        self.backing.with_bytes(|data| {
            for (layout, target) in self.layouts.iter().zip(targets.iter()) {
                layout.pack_extended_into(data, target.cols, target.rows, NEUTRAL_CHROMA, &mut packed);
            }
        });
        Bytes::from(packed)
    }

    fn plane_bytes(&self, index: usize) -> Option<Vec<u8>> {
        let layout = self.layouts.get(index)?;
        let mut packed = Vec::with_capacity(layout.packed_len());
        self.backing
            .with_bytes(|data| layout.pack_into(data, &mut packed));
        Some(packed)
    }

    /// Copy into new packed storage.
    fn detached(&self) -> Self {
        Self {
            layouts: self.packed_layouts(),
            backing: Backing::Packed(self.pack()),
        }
    }
}

macro_rules! single_plane_buffer {
    ($(#[$meta:meta])* $name:ident, $format:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(Planes<1>);

        impl $name {
            pub const FORMAT: PixelFormat = $format;

            pub fn width(&self) -> usize {
                self.0.width()
            }

            pub fn height(&self) -> usize {
                self.0.height()
            }

            pub fn planes(&self) -> &[PlaneLayout] {
                &self.0.layouts
            }

            /// Crop in place, silently leaving the buffer untouched if `region` does not fit.
            pub fn crop(&mut self, region: Region) {
                if !region.fits_within(self.width(), self.height()) {
                    debug!(?region, width = self.width(), height = self.height(), "ignoring out of bounds crop");
                    return;
                }
                self.0.layouts[0] = self.0.layouts[0].cropped(&region);
            }
        }
    };
}

single_plane_buffer!(
    /// A single plane of interleaved blue, green, red, and alpha samples.
    BgraBuffer,
    PixelFormat::Bgra
);

single_plane_buffer!(
    /// A single plane of 8-bit luminance samples.
    GrayBuffer,
    PixelFormat::Gray
);

impl GrayBuffer {
    /// Expand each luminance sample into an opaque BGRA pixel with equal color channels.
    pub(crate) fn to_bgra(&self) -> BgraBuffer {
        let (width, height) = (self.width(), self.height());
        let luma = self.0.plane_bytes(0).unwrap_or_default();
        let mut bgra = Vec::with_capacity(width * height * 4);
        for value in luma {
            bgra.extend_from_slice(&[value, value, value, u8::MAX]);
        }
        BgraBuffer(Planes {
            layouts: [PlaneLayout::packed(0, width, height, 4)],
            backing: Backing::Packed(Bytes::from(bgra)),
        })
    }
}

/// Bi-planar 4:2:0 image: full resolution luma followed by half resolution interleaved Cb/Cr.
#[derive(Debug)]
pub struct YCbCrBuffer(Planes<2>);

impl YCbCrBuffer {
    pub const FORMAT: PixelFormat = PixelFormat::YCbCr;

    pub fn width(&self) -> usize {
        self.0.width()
    }

    pub fn height(&self) -> usize {
        self.0.height()
    }

    pub fn planes(&self) -> &[PlaneLayout] {
        &self.0.layouts
    }

    pub fn luma(&self) -> &PlaneLayout {
        &self.0.layouts[0]
    }

    pub fn chroma(&self) -> &PlaneLayout {
        &self.0.layouts[1]
    }

    /// Crop in place, silently leaving the buffer untouched if `region` does not fit.
    ///
    /// The chroma plane is cropped to the region with every coordinate halved and rounded down.
    pub fn crop(&mut self, region: Region) {
        if !region.fits_within(self.width(), self.height()) {
            debug!(?region, width = self.width(), height = self.height(), "ignoring out of bounds crop");
            return;
        }
        let [luma, chroma] = self.0.layouts;
        self.0.layouts = [luma.cropped(&region), chroma.cropped(&region.halved())];
    }
}

/// Dispatch a method call to whichever buffer variant is present.
macro_rules! dispatch {
    ($value:expr, $buffer:ident => $body:expr) => {
        match $value {
            PixelBuffer::YCbCr($buffer) => $body,
            PixelBuffer::Bgra($buffer) => $body,
            PixelBuffer::Gray($buffer) => $body,
        }
    };
}

/// A two dimensional image in one of the supported pixel layouts.
///
/// Buffers either own their memory, or borrow memory owned by a [`NativeBuffer`] (see
/// [`PixelBuffer::from_native`]). Apart from how long the memory stays valid, the two behave
/// identically.
#[derive(Debug)]
pub enum PixelBuffer {
    YCbCr(YCbCrBuffer),
    Bgra(BgraBuffer),
    Gray(GrayBuffer),
}

impl PixelBuffer {
    /// Wrap the memory of a native buffer without copying it.
    ///
    /// With `take_ownership` set, a reference to `handle` is retained and then released when
    /// this buffer is dropped, so the pixels stay valid for as long as the buffer does.
    ///
    /// # Borrowing hazard
    ///
    /// Without `take_ownership` nothing is retained. The returned buffer is only valid while
    /// some other reference to `handle` is alive; once the last one is released, reading from the
    /// buffer returns whatever the memory was overwritten with. Callers are responsible for
    /// keeping the handle alive for as long as the buffer is used.
    pub fn from_native(handle: &NativeBuffer, take_ownership: bool) -> Result<Self> {
        let native_format = handle.format();
        let unsupported = || Error::UnsupportedPixelFormat(native_format);
        let format = native_format.pixel_format().ok_or_else(unsupported)?;
        if handle.width() == 0
            || handle.height() == 0
            || format.checked_packed_len(handle.width(), handle.height()).is_none()
        {
            return Err(unsupported());
        }
        let layouts = {
            let data = handle.lock_read();
            let expected = format.packed_planes(handle.width(), handle.height());
            let layouts: Vec<PlaneLayout> = (0..handle.plane_count())
                .filter_map(|index| handle.plane(index))
                .collect();
            let valid = layouts.len() == expected.len()
                && layouts.iter().zip(expected.iter()).all(|(actual, expected)| {
                    actual.cols == expected.cols
                        && actual.rows == expected.rows
                        && actual.bytes_per_sample == expected.bytes_per_sample
                        && actual.samples_per_pixel == expected.samples_per_pixel
                        && actual.is_consistent()
                        && actual.offset.saturating_add(actual.span()) <= data.len()
                });
            if !valid {
                return Err(unsupported());
            }
            layouts
        };
        let backing = Backing::from_native(handle, take_ownership);
        trace!(
            format = %native_format,
            width = handle.width(),
            height = handle.height(),
            ownership = ?backing.ownership(),
            "wrapped native buffer"
        );
        Self::from_parts(format, layouts, backing).ok_or_else(unsupported)
    }

    /// Assemble a buffer from validated plane layouts.
    pub(crate) fn from_parts(
        format: PixelFormat,
        layouts: Vec<PlaneLayout>,
        backing: Backing,
    ) -> Option<Self> {
        Some(match format {
            PixelFormat::YCbCr => Self::YCbCr(YCbCrBuffer(Planes::new(layouts, backing)?)),
            PixelFormat::Bgra => Self::Bgra(BgraBuffer(Planes::new(layouts, backing)?)),
            PixelFormat::Gray => Self::Gray(GrayBuffer(Planes::new(layouts, backing)?)),
        })
    }

    /// Width in pixels of the full resolution plane.
    pub fn width(&self) -> usize {
        dispatch!(self, buffer => buffer.width())
    }

    /// Height in pixels of the full resolution plane.
    pub fn height(&self) -> usize {
        dispatch!(self, buffer => buffer.height())
    }

    pub fn pixel_format(&self) -> PixelFormat {
        match self {
            Self::YCbCr(_) => YCbCrBuffer::FORMAT,
            Self::Bgra(_) => BgraBuffer::FORMAT,
            Self::Gray(_) => GrayBuffer::FORMAT,
        }
    }

    pub fn ownership(&self) -> Ownership {
        dispatch!(self, buffer => buffer.0.backing.ownership())
    }

    pub fn planes(&self) -> &[PlaneLayout] {
        dispatch!(self, buffer => buffer.planes())
    }

    /// A copy of one plane's pixel data with the row padding removed.
    pub fn plane_bytes(&self, index: usize) -> Option<Vec<u8>> {
        dispatch!(self, buffer => buffer.0.plane_bytes(index))
    }

    /// Crop to `region` (in full resolution pixel coordinates) without copying.
    ///
    /// A region that is empty or extends past the edges of the image is ignored, leaving the
    /// buffer unchanged.
    pub fn crop(&mut self, region: Region) -> &mut Self {
        dispatch!(self, buffer => buffer.crop(region));
        self
    }

    /// Copy the pixels into newly allocated, tightly packed storage owned by the new buffer.
    ///
    /// A YCbCr buffer cropped to an odd size gets its chroma plane back to full 4:2:0 size, with
    /// the last chroma row or column repeated.
    pub fn detach(&self) -> Self {
        match self {
            Self::YCbCr(buffer) => Self::YCbCr(YCbCrBuffer(buffer.0.detached())),
            Self::Bgra(buffer) => Self::Bgra(BgraBuffer(buffer.0.detached())),
            Self::Gray(buffer) => Self::Gray(GrayBuffer(buffer.0.detached())),
        }
    }

    /// Copy into a newly allocated native buffer, which uses its own row alignment.
    pub fn to_native_handle(&self) -> Result<NativeBuffer> {
        let handle = NativeBuffer::new(self.pixel_format().into(), self.width(), self.height())?;
        let packed = self.detach();
        {
            let mut destination = handle.lock_write();
            dispatch!(&packed, buffer => buffer.0.backing.with_bytes(|source| {
                for (index, source_layout) in buffer.planes().iter().enumerate() {
                    let destination_layout = match handle.plane(index) {
                        Some(layout) => layout,
                        None => continue,
                    };
                    let row_len = source_layout.row_len().min(destination_layout.row_len());
                    let rows = source_layout.rows(source).zip(0..destination_layout.rows);
                    for (source_row, row) in rows {
                        let start = destination_layout.offset + row * destination_layout.stride;
                        destination[start..start + row_len].copy_from_slice(&source_row[..row_len]);
                    }
                }
            }));
        }
        Ok(handle)
    }

    pub(crate) fn pack(&self) -> Bytes {
        dispatch!(self, buffer => buffer.0.pack())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::PixelBuffer;
    use crate::error::Error;
    use crate::pixel::native::{NativeBuffer, NativeFormat, POISON};
    use crate::pixel::{Ownership, PixelFormat, Region};

    pub(crate) const WIDTH: usize = 10;
    pub(crate) const HEIGHT: usize = 5;
    pub(crate) const LUMA: u8 = 128;
    pub(crate) const CHROMA: u8 = 255;

    /// Fill only the pixel bytes of each plane, leaving the row padding zeroed.
    pub(crate) fn native_buffer(format: NativeFormat, values: &[u8]) -> NativeBuffer {
        let handle = NativeBuffer::new(format, WIDTH, HEIGHT).unwrap();
        {
            let mut data = handle.lock_write();
            let planes = (0..handle.plane_count()).filter_map(|index| handle.plane(index));
            for (plane, value) in planes.zip(values.iter()) {
                for row in 0..plane.rows {
                    let start = plane.offset + row * plane.stride;
                    data[start..start + plane.row_len()]
                        .iter_mut()
                        .for_each(|b| *b = *value);
                }
            }
        }
        handle
    }

    #[test]
    fn from_native_geometry() {
        let handle = native_buffer(NativeFormat::BiPlanar420Video, &[LUMA, CHROMA]);
        let buffer = PixelBuffer::from_native(&handle, true).unwrap();
        assert_eq!(buffer.width(), WIDTH);
        assert_eq!(buffer.height(), HEIGHT);
        assert_eq!(buffer.pixel_format(), PixelFormat::YCbCr);
        assert_eq!(buffer.ownership(), Ownership::Owned);
        assert_eq!(buffer.planes().len(), 2);
        assert_eq!(buffer.plane_bytes(0).unwrap(), vec![LUMA; WIDTH * HEIGHT]);
        assert_eq!(buffer.plane_bytes(1).unwrap(), vec![CHROMA; 5 * 3 * 2]);
        assert!(buffer.plane_bytes(2).is_none());
        // Zero copy: the planes keep the native stride.
        assert_eq!(buffer.planes()[0].stride, handle.plane(0).unwrap().stride);
    }

    #[test]
    fn from_native_each_format() {
        let gray = native_buffer(NativeFormat::OneComponent8, &[LUMA]);
        let gray = PixelBuffer::from_native(&gray, false).unwrap();
        assert_eq!(gray.pixel_format(), PixelFormat::Gray);
        assert_eq!(gray.ownership(), Ownership::Borrowed);
        let bgra = native_buffer(NativeFormat::Bgra32, &[CHROMA]);
        let bgra = PixelBuffer::from_native(&bgra, true).unwrap();
        assert_eq!(bgra.pixel_format(), PixelFormat::Bgra);
        assert_eq!(bgra.plane_bytes(0).unwrap(), vec![CHROMA; WIDTH * HEIGHT * 4]);
    }

    #[test]
    fn owned_view_retains_and_releases_once() {
        let handle = native_buffer(NativeFormat::OneComponent8, &[LUMA]);
        let owned = PixelBuffer::from_native(&handle, true).unwrap();
        assert_eq!(handle.retain_count(), 2);
        let borrowed = PixelBuffer::from_native(&handle, false).unwrap();
        assert_eq!(handle.retain_count(), 2);
        drop(borrowed);
        assert_eq!(handle.retain_count(), 2);
        drop(owned);
        assert_eq!(handle.retain_count(), 1);
    }

    #[test]
    fn borrowed_view_sees_released_memory() {
        for format in [
            NativeFormat::BiPlanar420Full,
            NativeFormat::Bgra32,
            NativeFormat::OneComponent8,
        ]
        .iter()
        {
            let handle = native_buffer(*format, &[LUMA, CHROMA]);
            let buffer = PixelBuffer::from_native(&handle, false).unwrap();
            let expected = vec![LUMA; buffer.planes()[0].packed_len()];
            assert_eq!(buffer.plane_bytes(0).unwrap(), expected);
            // Release the only reference.
            handle.release();
            let after = buffer.plane_bytes(0).unwrap();
            assert_ne!(after, expected);
            assert!(after.iter().all(|b| *b == POISON));
        }
    }

    #[test]
    fn owned_view_outlives_source_reference() {
        let handle = native_buffer(NativeFormat::BiPlanar420Full, &[LUMA, CHROMA]);
        let owned = PixelBuffer::from_native(&handle, true).unwrap();
        // Only used to look at the memory once the owned view is gone.
        let observer = PixelBuffer::from_native(&handle, false).unwrap();
        handle.release();
        assert_eq!(owned.plane_bytes(0).unwrap(), vec![LUMA; WIDTH * HEIGHT]);
        assert_eq!(observer.plane_bytes(0).unwrap(), vec![LUMA; WIDTH * HEIGHT]);
        drop(owned);
        assert_ne!(observer.plane_bytes(0).unwrap(), vec![LUMA; WIDTH * HEIGHT]);
    }

    #[test]
    fn unsupported_native_format() {
        let format = NativeFormat::Other(u32::from_be_bytes(*b"v210"));
        let planes = PixelFormat::Gray.packed_planes(WIDTH, HEIGHT);
        let handle = NativeBuffer::from_raw_parts(format, WIDTH, HEIGHT, planes, vec![0; 50]);
        match PixelBuffer::from_native(&handle, true) {
            Err(Error::UnsupportedPixelFormat(reported)) => assert_eq!(reported, format),
            other => panic!("expected an unsupported format error, got {:?}", other),
        }
        assert_eq!(handle.retain_count(), 1);
    }

    #[test]
    fn inconsistent_native_planes() {
        let mut planes = PixelFormat::YCbCr.packed_planes(WIDTH, HEIGHT);
        // Chroma rows overlapping each other
        planes[1].stride = 4;
        let handle = NativeBuffer::from_raw_parts(
            NativeFormat::BiPlanar420Full,
            WIDTH,
            HEIGHT,
            planes,
            vec![0; 80],
        );
        assert!(matches!(
            PixelBuffer::from_native(&handle, false),
            Err(Error::UnsupportedPixelFormat(NativeFormat::BiPlanar420Full))
        ));
        // Planes reaching past the end of the memory
        let planes = PixelFormat::Gray.packed_planes(WIDTH, HEIGHT);
        let handle =
            NativeBuffer::from_raw_parts(NativeFormat::OneComponent8, WIDTH, HEIGHT, planes, vec![0; 49]);
        assert!(PixelBuffer::from_native(&handle, false).is_err());
        // Missing the chroma plane
        let planes = PixelFormat::Gray.packed_planes(WIDTH, HEIGHT);
        let handle = NativeBuffer::from_raw_parts(
            NativeFormat::BiPlanar420Video,
            WIDTH,
            HEIGHT,
            planes,
            vec![0; 80],
        );
        assert!(PixelBuffer::from_native(&handle, false).is_err());
        // Right pixel size, wrong split between samples and bytes per sample
        let mut planes = PixelFormat::Bgra.packed_planes(2, 2);
        planes[0].bytes_per_sample = 4;
        planes[0].samples_per_pixel = 1;
        let handle =
            NativeBuffer::from_raw_parts(NativeFormat::Bgra32, 2, 2, planes, (0..16).collect());
        assert!(matches!(
            PixelBuffer::from_native(&handle, true),
            Err(Error::UnsupportedPixelFormat(NativeFormat::Bgra32))
        ));
        assert_eq!(handle.retain_count(), 1);
    }

    #[test]
    fn crop_ycbcr() {
        let handle = native_buffer(NativeFormat::BiPlanar420Video, &[LUMA, CHROMA]);
        let mut buffer = PixelBuffer::from_native(&handle, true).unwrap();
        buffer.crop(Region::new(1, 2, 8, 3));
        assert_eq!(buffer.width(), 8);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.pixel_format(), PixelFormat::YCbCr);
        assert_eq!(buffer.plane_bytes(0).unwrap(), vec![LUMA; 8 * 3]);
        assert_eq!(buffer.plane_bytes(1).unwrap(), vec![CHROMA; 4 * 1 * 2]);
    }

    #[test]
    fn crop_out_of_range() {
        let handle = native_buffer(NativeFormat::BiPlanar420Video, &[LUMA, CHROMA]);
        let mut buffer = PixelBuffer::from_native(&handle, true).unwrap();
        let planes = buffer.planes().to_vec();
        buffer
            .crop(Region::new(1, 2, 20, 3))
            .crop(Region::new(0, 4, 1, 2))
            .crop(Region::new(0, 0, 0, 0));
        assert_eq!(buffer.width(), WIDTH);
        assert_eq!(buffer.height(), HEIGHT);
        assert_eq!(buffer.planes(), &planes[..]);
        assert_eq!(buffer.plane_bytes(0).unwrap(), vec![LUMA; WIDTH * HEIGHT]);
        assert_eq!(buffer.plane_bytes(1).unwrap(), vec![CHROMA; 5 * 3 * 2]);
    }

    #[test]
    fn crop_matches_sub_rectangle() {
        let width = 6;
        let height = 4;
        let bytes: Vec<u8> = (0..(width * height * 4) as u8).collect();
        let mut buffer =
            PixelBuffer::from_wire_bytes(PixelFormat::Bgra, width, height, &bytes).unwrap();
        buffer.crop(Region::new(2, 1, 3, 2));
        let mut expected = Vec::new();
        for row in 1..3 {
            let start = (row * width + 2) * 4;
            expected.extend_from_slice(&bytes[start..start + 3 * 4]);
        }
        assert_eq!((buffer.width(), buffer.height()), (3, 2));
        assert_eq!(buffer.to_wire_bytes(), expected);
        // Cropping shares memory instead of copying it.
        assert_eq!(buffer.planes()[0].stride, width * 4);
    }

    #[test]
    fn crop_is_repeatable() {
        let bytes: Vec<u8> = (0..(WIDTH * HEIGHT) as u8).collect();
        let mut buffer =
            PixelBuffer::from_wire_bytes(PixelFormat::Gray, WIDTH, HEIGHT, &bytes).unwrap();
        buffer.crop(Region::new(2, 1, 6, 4)).crop(Region::new(1, 1, 2, 2));
        assert_eq!(buffer.to_wire_bytes(), vec![23u8, 24, 33, 34]);
    }

    #[test]
    fn odd_crop_packs_full_chroma() {
        let mut bytes: Vec<u8> = (0..16).collect();
        bytes.extend_from_slice(&[10, 11, 12, 13, 14, 15, 16, 17]);
        let mut buffer = PixelBuffer::from_wire_bytes(PixelFormat::YCbCr, 4, 4, &bytes).unwrap();
        buffer.crop(Region::new(1, 0, 3, 4));
        // The view itself keeps the rounded down chroma plane.
        assert_eq!(buffer.plane_bytes(1).unwrap(), vec![10, 11, 14, 15]);
        let wire = buffer.to_wire_bytes();
        assert_eq!(
            wire,
            vec![1u8, 2, 3, 5, 6, 7, 9, 10, 11, 13, 14, 15, 10, 11, 10, 11, 14, 15, 14, 15]
        );
        let decoded = PixelBuffer::from_wire_bytes(PixelFormat::YCbCr, 3, 4, &wire).unwrap();
        assert_eq!(decoded.to_wire_bytes(), wire);
        let detached = buffer.detach();
        assert_eq!((detached.planes()[1].cols, detached.planes()[1].rows), (2, 2));
        assert_eq!(detached.to_wire_bytes(), wire);

        // A single column has no chroma samples left, so packing fills in neutral chroma.
        let mut column = PixelBuffer::from_wire_bytes(PixelFormat::YCbCr, 4, 4, &bytes).unwrap();
        column.crop(Region::new(1, 0, 1, 4));
        assert_eq!(column.to_wire_bytes(), vec![1u8, 5, 9, 13, 128, 128, 128, 128]);
    }

    #[test]
    fn detach_copies_borrowed_memory() {
        let handle = native_buffer(NativeFormat::BiPlanar420Full, &[LUMA, CHROMA]);
        let mut borrowed = PixelBuffer::from_native(&handle, false).unwrap();
        borrowed.crop(Region::new(2, 2, 6, 2));
        let detached = borrowed.detach();
        handle.release();
        assert_eq!(detached.ownership(), Ownership::Owned);
        assert_eq!((detached.width(), detached.height()), (6, 2));
        assert_eq!(detached.plane_bytes(0).unwrap(), vec![LUMA; 12]);
        assert_eq!(detached.plane_bytes(1).unwrap(), vec![CHROMA; 3 * 2]);
        assert_eq!(detached.planes()[1].offset, 12);
    }

    #[test]
    fn native_round_trip() {
        let handle = native_buffer(NativeFormat::BiPlanar420Full, &[LUMA, CHROMA]);
        let buffer = PixelBuffer::from_native(&handle, true).unwrap();
        let exported = buffer.to_native_handle().unwrap();
        assert_eq!(exported.format(), NativeFormat::BiPlanar420Full);
        assert_eq!(exported.retain_count(), 1);
        let reimported = PixelBuffer::from_native(&exported, true).unwrap();
        assert_eq!(reimported.to_wire_bytes(), buffer.to_wire_bytes());
    }

    #[test]
    fn native_export_fills_odd_crop_chroma() {
        let handle = native_buffer(NativeFormat::BiPlanar420Full, &[LUMA, CHROMA]);
        let mut buffer = PixelBuffer::from_native(&handle, true).unwrap();
        buffer.crop(Region::new(1, 2, 8, 3));
        let exported = buffer.to_native_handle().unwrap();
        let chroma = exported.plane(1).unwrap();
        assert_eq!((chroma.cols, chroma.rows), (4, 2));
        let data = exported.lock_read();
        for row in 0..chroma.rows {
            let start = chroma.offset + row * chroma.stride;
            assert!(data[start..start + chroma.row_len()].iter().all(|b| *b == CHROMA));
        }
    }

    #[test]
    fn native_export_strips_and_restores_padding() {
        let bytes = vec![LUMA; WIDTH * HEIGHT];
        let buffer =
            PixelBuffer::from_wire_bytes(PixelFormat::Gray, WIDTH, HEIGHT, &bytes).unwrap();
        let exported = buffer.to_native_handle().unwrap();
        let plane = exported.plane(0).unwrap();
        assert!(plane.stride > WIDTH);
        let data = exported.lock_read();
        for row in 0..HEIGHT {
            let start = row * plane.stride;
            assert!(data[start..start + WIDTH].iter().all(|b| *b == LUMA));
            assert!(data[start + WIDTH..start + plane.stride]
                .iter()
                .all(|b| *b == 0));
        }
    }
}
