// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;

use crate::pixel::{NativeFormat, PixelFormat};

/// Errors produced while building, serializing, or rendering pixel buffers.
#[derive(Debug)]
pub enum Error {
    /// Wire data does not describe a valid image.
    MalformedWireData(WireError),

    /// A native buffer reports a pixel format that has no [`PixelFormat`] counterpart.
    UnsupportedPixelFormat(NativeFormat),

    /// Storage for a new buffer could not be allocated.
    BufferAllocationError {
        format: PixelFormat,
        width: usize,
        height: usize,
    },

    /// A display image could not be built from the buffer contents.
    ConversionFailed(String),
}

/// The ways wire data can be malformed.
#[derive(Debug)]
pub enum WireError {
    /// The byte count does not match the packed size of the declared geometry.
    LengthMismatch {
        format: PixelFormat,
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Width or height was zero.
    EmptyGeometry { width: usize, height: usize },

    /// Width or height does not fit in the 16-bit message fields.
    GeometryTooLarge { width: usize, height: usize },

    /// The framed message could not be encoded or decoded.
    Message(bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedWireData(e) => write!(f, "malformed wire data: {}", e),
            Self::UnsupportedPixelFormat(format) => {
                write!(f, "unsupported native pixel format {}", format)
            }
            Self::BufferAllocationError {
                format,
                width,
                height,
            } => write!(
                f,
                "unable to allocate a {}x{} {} buffer",
                width, height, format
            ),
            Self::ConversionFailed(reason) => write!(f, "display conversion failed: {}", reason),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::MalformedWireData(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                format,
                width,
                height,
                expected,
                actual,
            } => write!(
                f,
                "a {}x{} {} image packs to {} bytes, but {} were given",
                width, height, format, expected, actual
            ),
            Self::EmptyGeometry { width, height } => {
                write!(f, "image geometry {}x{} has no pixels", width, height)
            }
            Self::GeometryTooLarge { width, height } => write!(
                f,
                "image geometry {}x{} does not fit in a wire message",
                width, height
            ),
            Self::Message(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for WireError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Message(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WireError> for Error {
    fn from(e: WireError) -> Self {
        Self::MalformedWireData(e)
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Self::MalformedWireData(WireError::Message(e))
    }
}
