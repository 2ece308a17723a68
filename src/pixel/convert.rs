// SPDX-License-Identifier: GPL-3.0-or-later
use tracing::debug;

use super::buffer::PixelBuffer;
use super::format::PixelFormat;

impl PixelBuffer {
    /// Convert to another pixel format.
    ///
    /// Converting to the current format returns the buffer as is. Only gray to BGRA is
    /// implemented as a real conversion, expanding each luminance sample into an opaque pixel with
    /// equal color channels. Every other pairing also returns the buffer unchanged, so callers
    /// needing a particular format should check [`pixel_format`][Self::pixel_format] afterwards.
    pub fn convert(self, target: PixelFormat) -> PixelBuffer {
        let source = self.pixel_format();
        match (self, target) {
            (buffer, target) if source == target => buffer,
            (PixelBuffer::Gray(gray), PixelFormat::Bgra) => PixelBuffer::Bgra(gray.to_bgra()),
            (buffer, target) => {
                debug!(%source, %target, "conversion not implemented, returning buffer unchanged");
                buffer
            }
        }
    }
}
