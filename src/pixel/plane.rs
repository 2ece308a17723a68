// SPDX-License-Identifier: GPL-3.0-or-later
use serde::Deserialize;

/// The chroma value meaning "no color".
pub(crate) const NEUTRAL_CHROMA: u8 = 128;

/// The number of chroma samples covering `extent` luma samples with 4:2:0 subsampling.
pub(crate) fn chroma_extent(extent: usize) -> usize {
    (extent + 1) / 2
}

/// Describes where one plane of an image lives within a block of memory.
///
/// Every sample in this crate is a single byte, but the layout keeps `bytes_per_sample` so
/// offsets are computed the same way for every plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Byte offset of the first sample of the first row.
    pub offset: usize,

    /// Byte distance between the starts of consecutive rows.
    pub stride: usize,

    /// Number of rows.
    pub rows: usize,

    /// Number of pixels in each row.
    pub cols: usize,

    pub bytes_per_sample: usize,

    /// Number of interleaved samples making up one pixel.
    pub samples_per_pixel: usize,
}

impl PlaneLayout {
    /// A layout with no row padding.
    pub(crate) fn packed(offset: usize, cols: usize, rows: usize, samples_per_pixel: usize) -> Self {
        Self {
            offset,
            stride: cols * samples_per_pixel,
            rows,
            cols,
            bytes_per_sample: 1,
            samples_per_pixel,
        }
    }

    // Layouts can come from drivers, so the size helpers saturate instead of overflowing.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_sample.saturating_mul(self.samples_per_pixel)
    }

    /// The number of bytes holding pixel data in each row, excluding any padding.
    pub fn row_len(&self) -> usize {
        self.cols.saturating_mul(self.bytes_per_pixel())
    }

    /// The number of bytes this plane occupies once the row padding is removed.
    pub fn packed_len(&self) -> usize {
        self.rows.saturating_mul(self.row_len())
    }

    /// The number of bytes past `offset` this plane reaches into, including the padding of
    /// every row except the last.
    pub fn span(&self) -> usize {
        match self.rows {
            0 => 0,
            rows => (rows - 1)
                .saturating_mul(self.stride)
                .saturating_add(self.row_len()),
        }
    }

    /// Whether the stride is large enough to hold a row of pixels.
    pub fn is_consistent(&self) -> bool {
        self.stride >= self.row_len()
    }

    /// A view of a sub-rectangle of this plane, sharing the same memory and stride.
    ///
    /// The region is in this plane's own pixel coordinates and must already be bounds checked.
    pub(crate) fn cropped(&self, region: &Region) -> Self {
        Self {
            offset: self.offset + region.y * self.stride + region.x * self.bytes_per_pixel(),
            rows: region.height,
            cols: region.width,
            ..*self
        }
    }

    /// Iterate over the pixel data of each row, skipping row padding.
    pub(crate) fn rows<'a>(&self, data: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        let Self { offset, stride, .. } = *self;
        let row_len = self.row_len();
        (0..self.rows).map(move |row| {
            let start = offset + row * stride;
            &data[start..start + row_len]
        })
    }

    /// Append the rows of this plane to `out` with the row padding removed.
    pub(crate) fn pack_into(&self, data: &[u8], out: &mut Vec<u8>) {
        for row in self.rows(data) {
            out.extend_from_slice(row);
        }
    }

    /// Append `rows` rows of `cols` pixels to `out`, with the row padding removed.
    ///
    /// Rows and columns past the edges of this plane repeat its last row and column. A plane
    /// with no pixels at all is filled with `fill`.
    pub(crate) fn pack_extended_into(
        &self,
        data: &[u8],
        cols: usize,
        rows: usize,
        fill: u8,
        out: &mut Vec<u8>,
    ) {
        let bytes_per_pixel = self.bytes_per_pixel();
        if self.rows == 0 || self.cols == 0 {
            out.resize(out.len() + rows * cols * bytes_per_pixel, fill);
            return;
        }
        let kept = self.row_len().min(cols * bytes_per_pixel);
        for row in 0..rows {
            let start = self.offset + row.min(self.rows - 1) * self.stride;
            let source = &data[start..start + self.row_len()];
            out.extend_from_slice(&source[..kept]);
            let edge = &source[source.len() - bytes_per_pixel..];
            for _ in self.cols..cols {
                out.extend_from_slice(edge);
            }
        }
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this region has a non-zero area and lies entirely within a `width` by `height`
    /// image.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        match (right, bottom) {
            (Some(right), Some(bottom)) => {
                self.width > 0 && self.height > 0 && right <= width && bottom <= height
            }
            _ => false,
        }
    }

    /// The matching region of a 4:2:0 chroma plane.
    ///
    /// Every coordinate is halved and rounded down, so odd sizes lose their last chroma row or
    /// column. Packing the plane restores them by repeating the edge.
    pub(crate) fn halved(&self) -> Self {
        Self {
            x: self.x / 2,
            y: self.y / 2,
            width: self.width / 2,
            height: self.height / 2,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{chroma_extent, PlaneLayout, Region};

    fn padded_plane() -> PlaneLayout {
        PlaneLayout {
            offset: 4,
            stride: 16,
            rows: 3,
            cols: 5,
            bytes_per_sample: 1,
            samples_per_pixel: 2,
        }
    }

    #[test]
    fn chroma_rounds_up() {
        assert_eq!(chroma_extent(10), 5);
        assert_eq!(chroma_extent(5), 3);
        assert_eq!(chroma_extent(1), 1);
    }

    #[test]
    fn padded_geometry() {
        let plane = padded_plane();
        assert_eq!(plane.bytes_per_pixel(), 2);
        assert_eq!(plane.row_len(), 10);
        assert_eq!(plane.packed_len(), 30);
        assert_eq!(plane.span(), 2 * 16 + 10);
        assert!(plane.is_consistent());
        let squashed = PlaneLayout {
            stride: 8,
            ..plane
        };
        assert!(!squashed.is_consistent());
    }

    #[test]
    fn crop_offsets() {
        let plane = padded_plane();
        let cropped = plane.cropped(&Region::new(1, 2, 3, 1));
        assert_eq!(cropped.offset, 4 + 2 * 16 + 2);
        assert_eq!(cropped.stride, 16);
        assert_eq!((cropped.cols, cropped.rows), (3, 1));
    }

    #[test]
    fn packing_strips_padding() {
        let plane = PlaneLayout {
            offset: 1,
            stride: 4,
            rows: 2,
            cols: 2,
            bytes_per_sample: 1,
            samples_per_pixel: 1,
        };
        let data = [0, 1, 2, 9, 9, 3, 4, 9];
        let mut packed = Vec::new();
        plane.pack_into(&data, &mut packed);
        assert_eq!(packed, vec![1, 2, 3, 4]);
    }

    #[test]
    fn extended_packing_repeats_edges() {
        // Two 2-byte pixels per row, one byte of padding.
        let plane = PlaneLayout {
            offset: 0,
            stride: 5,
            rows: 2,
            cols: 2,
            bytes_per_sample: 1,
            samples_per_pixel: 2,
        };
        let data = [1, 2, 3, 4, 9, 5, 6, 7, 8, 9];
        let mut packed = Vec::new();
        plane.pack_extended_into(&data, 3, 3, 0, &mut packed);
        assert_eq!(
            packed,
            vec![1, 2, 3, 4, 3, 4, 5, 6, 7, 8, 7, 8, 5, 6, 7, 8, 7, 8]
        );
        // Same size is plain packing
        let mut exact = Vec::new();
        plane.pack_extended_into(&data, 2, 2, 0, &mut exact);
        assert_eq!(exact, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn extending_an_empty_plane_fills() {
        let plane = PlaneLayout::packed(0, 0, 1, 2);
        let mut packed = vec![7];
        plane.pack_extended_into(&[], 1, 2, 128, &mut packed);
        assert_eq!(packed, vec![7, 128, 128, 128, 128]);
    }

    #[test]
    fn region_bounds() {
        assert!(Region::new(1, 2, 8, 3).fits_within(10, 5));
        assert!(Region::new(0, 0, 10, 5).fits_within(10, 5));
        assert!(!Region::new(1, 2, 20, 3).fits_within(10, 5));
        assert!(!Region::new(0, 3, 1, 3).fits_within(10, 5));
        assert!(!Region::new(0, 0, 0, 5).fits_within(10, 5));
        assert!(!Region::new(usize::MAX, 0, 2, 1).fits_within(10, 5));
    }

    #[test]
    fn halved_rounds_down() {
        assert_eq!(Region::new(1, 2, 8, 3).halved(), Region::new(0, 1, 4, 1));
    }
}
