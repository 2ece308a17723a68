// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

mod cli;
mod source;
mod viewer;

pub use cli::Args;
pub use source::{FrameRate, SourceSettings};
pub use viewer::ViewerSettings;

fn default_capacity() -> usize {
    4
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BusSettings {
    /// How many messages a subscriber may fall behind before it starts missing them.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub bus: BusSettings,

    /// Settings for the synthetic frame source.
    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub viewer: ViewerSettings,
}

impl Settings {
    /// Read settings from a TOML file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let config_data = fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;
        toml::from_str(&config_data)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Apply any overrides given on the command line.
    pub fn merge_args(&mut self, args: &Args) {
        if let Some(pixel_format) = args.pixel_format {
            self.source.pixel_format = pixel_format;
        }
        if let Some(frame_count) = args.frame_count {
            self.source.frame_count = Some(frame_count);
        }
    }
}
