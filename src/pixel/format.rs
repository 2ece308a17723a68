// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::str::FromStr;

use serde::de::{Deserialize, IntoDeserializer};
use serde::Serialize;
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::plane::{chroma_extent, PlaneLayout};

/// The pixel layouts a [`PixelBuffer`][super::PixelBuffer] can hold.
#[derive(Clone, Copy, Debug, serde::Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Bi-planar 4:2:0: a full resolution luma plane followed by a half resolution plane of
    /// interleaved Cb/Cr pairs.
    YCbCr,

    /// A single plane of interleaved blue, green, red, alpha bytes.
    Bgra,

    /// A single plane of 8-bit luminance.
    Gray,
}

impl PixelFormat {
    pub(crate) const KINDS: &'static [&'static str] = &["ycbcr", "bgra", "gray"];

    /// The number of planes buffers of this format have.
    pub fn plane_count(self) -> usize {
        match self {
            Self::YCbCr => 2,
            Self::Bgra | Self::Gray => 1,
        }
    }

    /// The size in bytes of a `width` by `height` image with no row padding.
    pub fn packed_len(self, width: usize, height: usize) -> usize {
        self.packed_planes(width, height)
            .iter()
            .map(PlaneLayout::packed_len)
            .sum()
    }

    /// Like [`packed_len`][Self::packed_len], but `None` when the size overflows.
    pub fn checked_packed_len(self, width: usize, height: usize) -> Option<usize> {
        // Four bytes per pixel bounds every format, including 4:2:0 chroma rounding.
        width.checked_mul(height)?.checked_mul(4)?;
        Some(self.packed_len(width, height))
    }

    /// Plane descriptors for a tightly packed image, with each plane immediately following the
    /// previous one.
    pub(crate) fn packed_planes(self, width: usize, height: usize) -> Vec<PlaneLayout> {
        match self {
            Self::Gray => vec![PlaneLayout::packed(0, width, height, 1)],
            Self::Bgra => vec![PlaneLayout::packed(0, width, height, 4)],
            Self::YCbCr => {
                let luma = PlaneLayout::packed(0, width, height, 1);
                let chroma = PlaneLayout::packed(
                    luma.packed_len(),
                    chroma_extent(width),
                    chroma_extent(height),
                    2,
                );
                vec![luma, chroma]
            }
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::YCbCr => "YCbCr",
            Self::Bgra => "BGRA",
            Self::Gray => "Gray",
        })
    }
}

impl FromStr for PixelFormat {
    type Err = serde::de::value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelFormat::deserialize(s.to_ascii_lowercase().into_deserializer())
    }
}

/// Pixel format tags as they appear in image messages.
#[derive(Clone, Copy, Debug, Deserialize_repr, Hash, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum WirePixelFormat {
    Mono = 0,
    Rgba = 1,
    YCrCb420f = 2,
    YCrCb420v = 3,
}

impl fmt::Display for WirePixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mono => "Mono",
            Self::Rgba => "RGBA",
            Self::YCrCb420f => "YCrCb420f",
            Self::YCrCb420v => "YCrCb420v",
        })
    }
}

impl From<WirePixelFormat> for PixelFormat {
    fn from(format: WirePixelFormat) -> Self {
        match format {
            WirePixelFormat::Mono => Self::Gray,
            WirePixelFormat::Rgba => Self::Bgra,
            // Both 4:2:0 range variants share the same bi-planar layout.
            WirePixelFormat::YCrCb420f | WirePixelFormat::YCrCb420v => Self::YCbCr,
        }
    }
}

impl From<PixelFormat> for WirePixelFormat {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::Gray => Self::Mono,
            PixelFormat::Bgra => Self::Rgba,
            PixelFormat::YCbCr => Self::YCrCb420f,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{PixelFormat, WirePixelFormat};

    #[test]
    fn packed_lengths() {
        assert_eq!(PixelFormat::Gray.packed_len(10, 5), 50);
        assert_eq!(PixelFormat::Bgra.packed_len(10, 5), 200);
        // 5x3 chroma pairs for a 10x5 luma plane
        assert_eq!(PixelFormat::YCbCr.packed_len(10, 5), 80);
        assert_eq!(PixelFormat::YCbCr.packed_len(3, 3), 9 + 2 * 2 * 2);
        assert_eq!(PixelFormat::Gray.checked_packed_len(10, 5), Some(50));
        assert_eq!(PixelFormat::Bgra.checked_packed_len(usize::MAX, 2), None);
    }

    #[test]
    fn packed_planes_are_adjacent() {
        let planes = PixelFormat::YCbCr.packed_planes(10, 5);
        assert_eq!(planes.len(), PixelFormat::YCbCr.plane_count());
        assert_eq!(planes[0].offset, 0);
        assert_eq!(planes[1].offset, 50);
        assert_eq!((planes[1].cols, planes[1].rows), (5, 3));
        assert_eq!(planes[1].stride, 10);
    }

    #[test]
    fn wire_mapping() {
        assert_eq!(PixelFormat::from(WirePixelFormat::Mono), PixelFormat::Gray);
        assert_eq!(PixelFormat::from(WirePixelFormat::Rgba), PixelFormat::Bgra);
        assert_eq!(
            PixelFormat::from(WirePixelFormat::YCrCb420f),
            PixelFormat::YCbCr
        );
        assert_eq!(
            PixelFormat::from(WirePixelFormat::YCrCb420v),
            PixelFormat::YCbCr
        );
        for format in [PixelFormat::Gray, PixelFormat::Bgra, PixelFormat::YCbCr].iter() {
            assert_eq!(PixelFormat::from(WirePixelFormat::from(*format)), *format);
        }
    }

    #[test]
    fn parse_from_str() {
        for kind in PixelFormat::KINDS {
            assert!(kind.parse::<PixelFormat>().is_ok(), "{} did not parse", kind);
        }
        assert_eq!("YCbCr".parse::<PixelFormat>().unwrap(), PixelFormat::YCbCr);
        assert!("rgb565".parse::<PixelFormat>().is_err());
    }
}
