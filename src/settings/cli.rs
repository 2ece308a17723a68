// SPDX-License-Identifier: GPL-3.0-or-later
use structopt::StructOpt;

use std::path::PathBuf;

use crate::pixel::PixelFormat;

#[derive(Debug, StructOpt)]
#[structopt()]
pub struct Args {
    /// Path to a configuration file.
    #[structopt(short, long, parse(from_os_str), default_value = "config.toml")]
    pub config_path: PathBuf,

    /// Override the pixel format of the generated frames.
    #[structopt(short, long, possible_values = PixelFormat::KINDS, case_insensitive = true)]
    pub pixel_format: Option<PixelFormat>,

    /// Override the number of frames to generate before stopping.
    #[structopt(short = "n", long)]
    pub frame_count: Option<u64>,
}
