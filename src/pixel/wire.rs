// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::buffer::PixelBuffer;
use super::format::{PixelFormat, WirePixelFormat};
use super::ownership::Backing;
use crate::error::{Error, Result, WireError};

/// An image as it travels over the message bus.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ImageMessage {
    pub width: u16,
    pub height: u16,
    pub pixel_format: WirePixelFormat,
    pub data: Vec<u8>,
}

impl ImageMessage {
    /// Frame the message for a bus channel.
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(self)?))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl PixelBuffer {
    /// Copy tightly packed pixel data into a new, owned buffer.
    ///
    /// `bytes` must be exactly as long as a packed `width` by `height` image of `format`, with
    /// planes (if there are more than one) following each other in order.
    pub fn from_wire_bytes(
        format: PixelFormat,
        width: usize,
        height: usize,
        bytes: &[u8],
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WireError::EmptyGeometry { width, height }.into());
        }
        let expected = format
            .checked_packed_len(width, height)
            .ok_or(WireError::GeometryTooLarge { width, height })?;
        if bytes.len() != expected {
            return Err(WireError::LengthMismatch {
                format,
                width,
                height,
                expected,
                actual: bytes.len(),
            }
            .into());
        }
        let backing = Backing::Packed(Bytes::copy_from_slice(bytes));
        Self::from_parts(format, format.packed_planes(width, height), backing).ok_or(
            Error::BufferAllocationError {
                format,
                width,
                height,
            },
        )
    }

    pub fn from_message(message: &ImageMessage) -> Result<Self> {
        Self::from_wire_bytes(
            message.pixel_format.into(),
            message.width as usize,
            message.height as usize,
            &message.data,
        )
    }

    /// The pixel data with all row padding removed, luma before chroma.
    pub fn to_wire_bytes(&self) -> Bytes {
        self.pack()
    }

    pub fn to_pixel_data(&self) -> (usize, usize, Bytes) {
        (self.width(), self.height(), self.to_wire_bytes())
    }

    /// Build a bus message tagged with the wire format matching this buffer.
    pub fn to_message(&self) -> Result<ImageMessage> {
        let (width, height) = (self.width(), self.height());
        let too_large = || WireError::GeometryTooLarge { width, height };
        Ok(ImageMessage {
            width: u16::try_from(width).map_err(|_| too_large())?,
            height: u16::try_from(height).map_err(|_| too_large())?,
            pixel_format: self.pixel_format().into(),
            data: self.to_wire_bytes().to_vec(),
        })
    }
}
