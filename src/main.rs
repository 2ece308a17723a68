// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use frame_toolkit::bus::{LocalBus, MessageBus};
use frame_toolkit::node::{NodeOrganizer, NodeState, SequenceGenerator};
use frame_toolkit::settings::{Args, Settings};
use frame_toolkit::source::TestPatternSource;
use frame_toolkit::viewer::ImageViewer;

/// How often the viewer status is logged.
const STATUS_PERIOD: Duration = Duration::from_secs(1);

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = if args.config_path.exists() {
        Settings::from_path(&args.config_path)?
    } else {
        info!(path = %args.config_path.display(), "no config file found, using defaults");
        Settings::default()
    };
    settings.merge_args(args);
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::from_args();
    let settings = load_settings(&args).context("Unable to load settings")?;

    let bus: Arc<dyn MessageBus> = Arc::new(LocalBus::new(settings.bus.capacity));
    let ids = SequenceGenerator::new();
    let mut organizer = NodeOrganizer::new();

    // Subscribe the viewer first so it sees the first frame.
    let viewer = if settings.viewer.enabled {
        let viewer = ImageViewer::new(&ids, Arc::clone(&bus), settings.viewer.channel);
        let display = viewer.display_state();
        organizer.add(Box::new(viewer)).await?;
        Some(display)
    } else {
        None
    };
    let source = TestPatternSource::new(&ids, Arc::clone(&bus), settings.source.clone());
    let source_id = organizer.add(Box::new(source)).await?;

    organizer.start().await?;
    info!(
        format = %settings.source.pixel_format,
        width = settings.source.width,
        height = settings.source.height,
        "frame pipeline running"
    );

    let mut status = tokio::time::interval(STATUS_PERIOD);
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Unable to listen for ctrl-c")?;
                info!("interrupted, shutting down");
                break;
            }
            _ = status.tick() => {
                if let Some(display_state) = &viewer {
                    let state = display_state.lock();
                    info!(
                        fps = state.fps,
                        format = %state.pixel_format,
                        resolution = %state.resolution,
                        frames = state.frames(),
                        "viewer status"
                    );
                }
                match organizer.get(source_id).map(|node| node.state()) {
                    Some(NodeState::Stopped) => {
                        info!("frame source finished");
                        break;
                    }
                    Some(NodeState::Failed) => {
                        warn!("frame source failed");
                        break;
                    }
                    _ => (),
                }
            }
        }
    }
    organizer.stop().await
}
