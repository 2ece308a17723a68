// SPDX-License-Identifier: GPL-3.0-or-later
//! A node keeping the latest frame from a channel ready for display.
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use tracing::{debug, warn};

use crate::bus::{Channel, MessageBus, Subscriber, Subscription};
use crate::image_buffer::DisplayImage;
use crate::node::{Node, NodeId, NodeState, SequenceGenerator};
use crate::pixel::{ImageMessage, PixelBuffer};
use crate::util::moving_average::{BoxcarFilter, MovingAverage};

const PLACEHOLDER_WIDTH: u32 = 640;
const PLACEHOLDER_HEIGHT: u32 = 480;

/// Number of frame intervals the frame rate is averaged over.
const FPS_WINDOW: usize = 10;

/// Gray noise, shown until the first frame arrives.
fn noise_image(width: u32, height: u32) -> DisplayImage {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(width) << 32 | u64::from(height));
    let mut noise = vec![0u8; width as usize * height as usize];
    rng.fill_bytes(&mut noise);
    let pixels: Vec<u8> = noise
        .into_iter()
        .flat_map(|value| [value, value, value, u8::MAX])
        .collect();
    DisplayImage::from_raw(width, height, Bytes::from(pixels)).unwrap_or_default()
}

/// Everything a display needs to show the latest frame.
#[derive(Debug)]
pub struct ViewerState {
    pub image: DisplayImage,

    /// Frames per second, averaged over the last few frames.
    pub fps: f32,

    /// The wire format of the latest frame.
    pub pixel_format: String,

    /// The latest frame's size, as `width/height`.
    pub resolution: String,

    frames: u64,
    last_frame: Option<Instant>,
    intervals: BoxcarFilter<Duration, FPS_WINDOW>,
}

impl ViewerState {
    pub fn new() -> Self {
        Self {
            image: noise_image(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT),
            fps: 0.0,
            pixel_format: String::new(),
            resolution: String::new(),
            frames: 0,
            last_frame: None,
            intervals: BoxcarFilter::new(),
        }
    }

    /// The number of frames received so far, including ones that failed to render.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Update the labels and image from a frame received at `now`.
    ///
    /// If the frame cannot be rendered the previous image is kept.
    pub fn update(&mut self, message: &ImageMessage, now: Instant) {
        self.frames += 1;
        if let Some(last_frame) = self.last_frame {
            let average = self
                .intervals
                .update(now.saturating_duration_since(last_frame));
            if average > Duration::from_secs(0) {
                self.fps = 1.0 / average.as_secs_f32();
            }
        }
        self.last_frame = Some(now);
        self.pixel_format = message.pixel_format.to_string();
        self.resolution = format!("{}/{}", message.width, message.height);
        match PixelBuffer::from_message(message).and_then(|buffer| buffer.to_display_image()) {
            Ok(image) => self.image = image,
            Err(err) => warn!(error = %err, "unable to render frame, keeping previous image"),
        }
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes bus messages into a shared [`ViewerState`].
struct ViewerSubscriber {
    state: Arc<Mutex<ViewerState>>,
}

#[async_trait]
impl Subscriber for ViewerSubscriber {
    type Item = Bytes;
    type Error = anyhow::Error;

    async fn receive(&self, item: Bytes) -> anyhow::Result<()> {
        let message = ImageMessage::decode(&item)?;
        let now = Instant::now();
        self.state.lock().update(&message, now);
        Ok(())
    }
}

/// Shows the frames published on one channel.
pub struct ImageViewer {
    id: NodeId,
    bus: Arc<dyn MessageBus>,
    channel: Channel,
    state: Arc<Mutex<ViewerState>>,
    node_state: NodeState,
    subscription: Option<Subscription>,
}

impl ImageViewer {
    pub fn new(ids: &SequenceGenerator, bus: Arc<dyn MessageBus>, channel: Channel) -> Self {
        Self {
            id: ids.next_id(),
            bus,
            channel,
            state: Arc::new(Mutex::new(ViewerState::new())),
            node_state: NodeState::Idle,
            subscription: None,
        }
    }

    /// The display state, shared with the subscription updating it.
    pub fn display_state(&self) -> Arc<Mutex<ViewerState>> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl Node for ImageViewer {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        "image viewer"
    }

    fn state(&self) -> NodeState {
        self.node_state
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        self.node_state = NodeState::Starting;
        let subscriber = Arc::new(ViewerSubscriber {
            state: Arc::clone(&self.state),
        });
        self.subscription = Some(self.bus.subscribe(self.channel, subscriber));
        debug!(channel = self.channel, "viewer subscribed");
        self.node_state = NodeState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.subscription = None;
        self.node_state = NodeState::Stopped;
        Ok(())
    }
}
