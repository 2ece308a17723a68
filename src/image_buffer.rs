// SPDX-License-Identifier: GPL-3.0-or-later
use bytes::Bytes;
use image::{ImageBuffer, Rgba};

/// Rendered images intended for viewing. A shared [bytes::Bytes] buffer is used so the image can
/// be handed to several consumers without copying.
pub type DisplayImage = ImageBuffer<Rgba<u8>, Bytes>;
