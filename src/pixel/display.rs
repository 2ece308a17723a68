// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;

use bytes::Bytes;

use super::buffer::PixelBuffer;
use super::format::PixelFormat;
use super::plane::NEUTRAL_CHROMA;
use crate::error::{Error, Result};
use crate::image_buffer::DisplayImage;

/// Convert one full range BT.601 sample to RGB.
fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = y as f32;
    let cb = cb as f32 - NEUTRAL_CHROMA as f32;
    let cr = cr as f32 - NEUTRAL_CHROMA as f32;
    let clamp = |v: f32| v.round().max(0.0).min(255.0) as u8;
    [
        clamp(y + 1.402 * cr),
        clamp(y - 0.344_136 * cb - 0.714_136 * cr),
        clamp(y + 1.772 * cb),
    ]
}

impl PixelBuffer {
    /// Render to an RGBA image suitable for display.
    pub fn to_display_image(&self) -> Result<DisplayImage> {
        let (width, height) = (self.width(), self.height());
        let format = self.pixel_format();
        let allocation_error = || Error::BufferAllocationError {
            format,
            width,
            height,
        };
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(allocation_error)?;
        let mut rgba = Vec::new();
        rgba.try_reserve_exact(len)
            .map_err(|_| allocation_error())?;
        let luma = self.plane_bytes(0).unwrap_or_default();
        match format {
            PixelFormat::Gray => {
                for value in luma {
                    rgba.extend_from_slice(&[value, value, value, u8::MAX]);
                }
            }
            PixelFormat::Bgra => {
                for pixel in luma.chunks_exact(4) {
                    rgba.extend_from_slice(&[pixel[2], pixel[1], pixel[0], pixel[3]]);
                }
            }
            PixelFormat::YCbCr => {
                let chroma_plane = self.planes().get(1).copied();
                let chroma = self.plane_bytes(1).unwrap_or_default();
                let (chroma_cols, chroma_rows) = chroma_plane
                    .map(|plane| (plane.cols, plane.rows))
                    .unwrap_or_default();
                for (index, y) in luma.iter().enumerate() {
                    let (row, col) = (index / width, index % width);
                    let (cb, cr) = if chroma_cols == 0 || chroma_rows == 0 {
                        (NEUTRAL_CHROMA, NEUTRAL_CHROMA)
                    } else {
                        // Crops to odd sizes can leave the chroma plane a column or row short.
                        let chroma_col = (col / 2).min(chroma_cols - 1);
                        let chroma_row = (row / 2).min(chroma_rows - 1);
                        let offset = (chroma_row * chroma_cols + chroma_col) * 2;
                        (chroma[offset], chroma[offset + 1])
                    };
                    let [r, g, b] = ycbcr_to_rgb(*y, cb, cr);
                    rgba.extend_from_slice(&[r, g, b, u8::MAX]);
                }
            }
        }
        let conversion_failed = |reason: &str| Error::ConversionFailed(reason.to_string());
        let image_width =
            u32::try_from(width).map_err(|_| conversion_failed("width exceeds u32"))?;
        let image_height =
            u32::try_from(height).map_err(|_| conversion_failed("height exceeds u32"))?;
        DisplayImage::from_raw(image_width, image_height, Bytes::from(rgba)).ok_or_else(|| {
            Error::ConversionFailed(format!(
                "pixel data does not fill a {}x{} image",
                width, height
            ))
        })
    }
}
