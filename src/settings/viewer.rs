// SPDX-License-Identifier: GPL-3.0-or-later
use serde::Deserialize;

use crate::bus::Channel;

fn default_channel() -> Channel {
    1
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ViewerSettings {
    /// The channel to display frames from. Defaults to 1.
    #[serde(default = "default_channel")]
    pub channel: Channel,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ViewerSettings;

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let config: ViewerSettings = toml::from_str("")?;
        assert_eq!(config, ViewerSettings::default());
        assert!(config.enabled);
        assert_eq!(config.channel, 1);
        Ok(())
    }

    #[test]
    fn disabled() -> anyhow::Result<()> {
        let config: ViewerSettings = toml::from_str("enabled = false\nchannel = 4")?;
        assert!(!config.enabled);
        assert_eq!(config.channel, 4);
        Ok(())
    }
}
