// SPDX-License-Identifier: GPL-3.0-or-later
//! Images in the pixel layouts produced by capture devices, whether backed by memory owned by
//! this crate or by a native buffer.
mod buffer;
mod convert;
mod display;
mod format;
mod native;
mod ownership;
mod plane;
mod wire;

pub use buffer::{BgraBuffer, GrayBuffer, PixelBuffer, YCbCrBuffer};
pub use format::{PixelFormat, WirePixelFormat};
pub use native::{NativeBuffer, NativeFormat, POISON, ROW_ALIGNMENT};
pub use ownership::Ownership;
pub use plane::{PlaneLayout, Region};
pub use wire::ImageMessage;
