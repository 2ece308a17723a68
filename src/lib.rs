// SPDX-License-Identifier: GPL-3.0-or-later
pub mod bus;
pub mod error;
pub mod image_buffer;
pub mod node;
pub mod pixel;
pub mod settings;
pub mod source;
mod util;
pub mod viewer;

pub use error::{Error, Result};
