// SPDX-License-Identifier: GPL-3.0-or-later
//! Long running units of work attached to a message bus.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use async_trait::async_trait;
use tracing::{info, warn};

/// Identifies a node for as long as the process runs.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Hands out [`NodeId`]s, each one only once.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    Starting,
    Running,
    Stopped,
    Failed,
}

impl NodeState {
    /// Whether the node has a task or subscription that needs stopping.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

#[async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    fn state(&self) -> NodeState;

    async fn start(&mut self) -> anyhow::Result<()>;

    async fn stop(&mut self) -> anyhow::Result<()>;
}

/// Owns a set of nodes and starts and stops them together.
#[derive(Default)]
pub struct NodeOrganizer {
    nodes: Vec<Box<dyn Node>>,
    running: bool,
}

impl NodeOrganizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes
            .iter()
            .find(|node| node.id() == id)
            .map(|node| node.as_ref())
    }

    /// Add a node, starting it right away if the organizer is already running.
    pub async fn add(&mut self, mut node: Box<dyn Node>) -> anyhow::Result<NodeId> {
        let id = node.id();
        if self.running {
            node.start()
                .await
                .with_context(|| format!("starting {} ({})", node.name(), id))?;
        }
        self.nodes.push(node);
        Ok(id)
    }

    /// Remove a node, stopping it first if needed. Returns `false` if there is no such node.
    pub async fn remove(&mut self, id: NodeId) -> anyhow::Result<bool> {
        let index = match self.nodes.iter().position(|node| node.id() == id) {
            Some(index) => index,
            None => return Ok(false),
        };
        let mut node = self.nodes.remove(index);
        if node.state().is_active() {
            node.stop()
                .await
                .with_context(|| format!("stopping {} ({})", node.name(), id))?;
        }
        Ok(true)
    }

    /// Start every node that is not already active.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.running = true;
        for node in self.nodes.iter_mut() {
            if node.state().is_active() {
                continue;
            }
            info!(node = node.name(), id = %node.id(), "starting node");
            node.start()
                .await
                .with_context(|| format!("starting {} ({})", node.name(), node.id()))?;
        }
        Ok(())
    }

    /// Stop every active node, in the reverse order they were added.
    ///
    /// Every node is given a chance to stop, even if an earlier one fails to.
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        self.running = false;
        let mut first_error = None;
        for node in self.nodes.iter_mut().rev() {
            if !node.state().is_active() {
                continue;
            }
            info!(node = node.name(), id = %node.id(), "stopping node");
            if let Err(err) = node.stop().await {
                warn!(node = node.name(), error = ?err, "node failed to stop cleanly");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for NodeOrganizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeOrganizer")
            .field(
                "nodes",
                &self
                    .nodes
                    .iter()
                    .map(|node| (node.id(), node.state()))
                    .collect::<Vec<_>>(),
            )
            .field("running", &self.running)
            .finish()
    }
}
