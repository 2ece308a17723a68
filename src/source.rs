// SPDX-License-Identifier: GPL-3.0-or-later
//! A frame producing node that stands in for a capture device.
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, trace, warn};
use tracing_futures::Instrument;

use crate::bus::{MessageBus, Publisher as _};
use crate::node::{Node, NodeId, NodeState, SequenceGenerator};
use crate::pixel::{NativeBuffer, PixelBuffer, PixelFormat};
use crate::settings::SourceSettings;
use crate::util::flatten_join_result;

/// Draw frame number `index` of a moving test pattern into a new native buffer.
///
/// Luma (or gray) samples form a diagonal gradient that shifts by one every frame, chroma pairs
/// vary across the image, and BGRA pixels encode their column, row, and the frame number.
pub fn render_test_pattern(
    format: PixelFormat,
    width: usize,
    height: usize,
    index: u64,
) -> crate::error::Result<NativeBuffer> {
    let handle = NativeBuffer::new(format.into(), width, height)?;
    {
        let mut data = handle.lock_write();
        let shift = index as usize;
        for plane_index in 0..handle.plane_count() {
            let plane = match handle.plane(plane_index) {
                Some(plane) => plane,
                None => continue,
            };
            for row in 0..plane.rows {
                let start = plane.offset + row * plane.stride;
                let pixels = data[start..start + plane.row_len()]
                    .chunks_exact_mut(plane.bytes_per_pixel())
                    .enumerate();
                for (col, pixel) in pixels {
                    match (format, plane_index) {
                        (PixelFormat::Bgra, _) => {
                            pixel.copy_from_slice(&[col as u8, row as u8, index as u8, u8::MAX])
                        }
                        (PixelFormat::YCbCr, 1) => {
                            pixel.copy_from_slice(&[(col * 8) as u8, (row * 8) as u8])
                        }
                        _ => pixel[0] = col.wrapping_add(row).wrapping_add(shift) as u8,
                    }
                }
            }
        }
    }
    Ok(handle)
}

/// Render frame `index` and encode it as a bus message.
pub fn encode_frame(settings: &SourceSettings, index: u64) -> crate::error::Result<Bytes> {
    let handle = render_test_pattern(settings.pixel_format, settings.width, settings.height, index)?;
    let mut buffer = PixelBuffer::from_native(&handle, settings.take_ownership)?;
    if let Some(region) = settings.crop {
        buffer.crop(region);
    }
    // `handle` is still alive, so reading through a borrowed view is fine here.
    let message = buffer.to_message()?;
    message.encode()
}

async fn publish_frames(
    bus: Arc<dyn MessageBus>,
    settings: SourceSettings,
) -> anyhow::Result<u64> {
    let mut interval = tokio::time::interval(settings.frame_rate.period());
    let mut index = 0u64;
    while settings.frame_count.map_or(true, |count| index < count) {
        interval.tick().await;
        let frame = encode_frame(&settings, index)
            .with_context(|| format!("Unable to create frame {}", index))?;
        let delivered = bus.publish(settings.channel, frame).await?;
        trace!(index, delivered, "published frame");
        index += 1;
    }
    Ok(index)
}

/// Publishes test pattern frames at a fixed rate.
pub struct TestPatternSource {
    id: NodeId,
    bus: Arc<dyn MessageBus>,
    settings: SourceSettings,
    state: Arc<Mutex<NodeState>>,
    task: Option<JoinHandle<anyhow::Result<u64>>>,
}

impl TestPatternSource {
    pub fn new(ids: &SequenceGenerator, bus: Arc<dyn MessageBus>, settings: SourceSettings) -> Self {
        Self {
            id: ids.next_id(),
            bus,
            settings,
            state: Arc::new(Mutex::new(NodeState::Idle)),
            task: None,
        }
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }
}

#[async_trait]
impl Node for TestPatternSource {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        "test pattern source"
    }

    fn state(&self) -> NodeState {
        *self.state.lock()
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        *self.state.lock() = NodeState::Starting;
        // Fail early on settings that can never produce a frame.
        if let Err(err) = encode_frame(&self.settings, 0) {
            *self.state.lock() = NodeState::Failed;
            return Err(err).context("Invalid frame source settings");
        }
        if let Some(region) = self.settings.crop {
            if !region.fits_within(self.settings.width, self.settings.height) {
                warn!(?region, "crop region does not fit the frames, frames will not be cropped");
            }
        }
        *self.state.lock() = NodeState::Running;
        let bus = Arc::clone(&self.bus);
        let settings = self.settings.clone();
        let state = Arc::clone(&self.state);
        let task = async move {
            let result = publish_frames(bus, settings).await;
            match &result {
                Ok(count) => {
                    info!(frames = count, "frame source finished");
                    *state.lock() = NodeState::Stopped;
                }
                Err(err) => {
                    warn!(error = ?err, "frame source failed");
                    *state.lock() = NodeState::Failed;
                }
            }
            result
        };
        self.task = Some(tokio::spawn(
            task.instrument(info_span!("source", id = %self.id, channel = self.settings.channel)),
        ));
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        let task = match self.task.take() {
            Some(task) => task,
            None => return Ok(()),
        };
        task.abort();
        let result = match task.await {
            Err(err) if err.is_cancelled() => {
                debug!("frame source cancelled");
                Ok(())
            }
            other => flatten_join_result(other).map(drop),
        };
        *self.state.lock() = if result.is_ok() {
            NodeState::Stopped
        } else {
            NodeState::Failed
        };
        result
    }
}
