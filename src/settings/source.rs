// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::{Deserialize, Deserializer, Error};

use crate::bus::Channel;
use crate::pixel::{PixelFormat, Region};

/// Deserialize a `U`, then convert it to the field type with [`TryFrom`].
struct TryFromNum<U>(PhantomData<U>);

impl<U> TryFromNum<U> {
    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<U>,
        <T as TryFrom<U>>::Error: fmt::Display,
        U: Deserialize<'de>,
    {
        let value: U = U::deserialize(deserializer)?;
        T::try_from(value).map_err(D::Error::custom)
    }
}

type TryFromF32 = TryFromNum<f32>;

/// Frames per second. Always finite and positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRate(f32);

impl FrameRate {
    /// The time between frames.
    pub fn period(self) -> Duration {
        Duration::from_secs_f32(1.0 / self.0)
    }
}

impl TryFrom<f32> for FrameRate {
    type Error = String;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(format!(
                "frame rate must be a positive number, not {}",
                value
            ))
        }
    }
}

impl From<FrameRate> for f32 {
    fn from(frame_rate: FrameRate) -> Self {
        frame_rate.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(30.0)
    }
}

fn default_channel() -> Channel {
    1
}

fn default_width() -> usize {
    640
}

fn default_height() -> usize {
    480
}

fn non_zero<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    match usize::deserialize(deserializer)? {
        0 => Err(D::Error::custom("image dimensions must be non-zero")),
        value => Ok(value),
    }
}

fn default_pixel_format() -> PixelFormat {
    PixelFormat::YCbCr
}

fn default_take_ownership() -> bool {
    true
}

/// Settings for the synthetic frame source.
#[derive(Clone, Debug, serde::Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceSettings {
    /// The channel frames are published on. Defaults to 1.
    #[serde(default = "default_channel")]
    pub channel: Channel,

    #[serde(default = "default_width", deserialize_with = "non_zero")]
    pub width: usize,

    #[serde(default = "default_height", deserialize_with = "non_zero")]
    pub height: usize,

    /// One of `ycbcr`, `bgra`, or `gray`. Defaults to `ycbcr`.
    #[serde(default = "default_pixel_format")]
    pub pixel_format: PixelFormat,

    #[serde(default, with = "TryFromF32")]
    pub frame_rate: FrameRate,

    /// Stop after this many frames. Frames are produced until the source is stopped if unset.
    #[serde(default)]
    pub frame_count: Option<u64>,

    /// Crop every frame to this region before publishing it.
    #[serde(default)]
    pub crop: Option<Region>,

    /// Whether frames retain the native buffers they are built from, instead of borrowing them.
    #[serde(default = "default_take_ownership")]
    pub take_ownership: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            width: default_width(),
            height: default_height(),
            pixel_format: default_pixel_format(),
            frame_rate: FrameRate::default(),
            frame_count: None,
            crop: None,
            take_ownership: default_take_ownership(),
        }
    }
}
