//! # Teleop Node
//!
//! The mapping pipeline: one task owns the [`InputMapper`], takes snapshots
//! off a channel one at a time, publishes each command and dispatches the
//! requested mode changes.
//!
//! ## Disable-Thrusters Stall
//!
//! After a `DisableThrusters` request is dispatched the pipeline sleeps for
//! the configured stall (1 s by default) before doing anything else. No
//! snapshot is mapped during the stall; snapshots arriving meanwhile wait in
//! the channel and are mapped in order afterwards. Only this task sleeps, the
//! device reader and the rest of the runtime keep running.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::command::SideEffectRequest;
use super::mapper::InputMapper;
use super::snapshot::InputSnapshot;
use crate::publisher::CommandSink;
use crate::services::ControlSubsystem;

/// Number of snapshots between status log messages
pub const LOG_INTERVAL_SNAPSHOTS: u64 = 1000;

/// Default pause after a disable-thrusters request.
pub const DEFAULT_DISABLE_THRUSTERS_STALL: Duration = Duration::from_secs(1);

/// Pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub snapshots: u64,
    pub published: u64,
    pub publish_failures: u64,
    pub requests_dispatched: u64,
    pub request_failures: u64,
}

/// Single-consumer mapping pipeline.
pub struct TeleopNode<S, C> {
    name: String,
    mapper: InputMapper,
    sink: S,
    control: C,
    stall: Duration,
    stats: NodeStats,
}

impl<S: CommandSink, C: ControlSubsystem> TeleopNode<S, C> {
    /// Creates a node with the default 1 s disable-thrusters stall.
    pub fn new(name: impl Into<String>, mapper: InputMapper, sink: S, control: C) -> Self {
        Self {
            name: name.into(),
            mapper,
            sink,
            control,
            stall: DEFAULT_DISABLE_THRUSTERS_STALL,
            stats: NodeStats::default(),
        }
    }

    /// Override the disable-thrusters stall.
    #[must_use]
    pub fn with_stall(mut self, stall: Duration) -> Self {
        self.stall = stall;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mapper(&self) -> &InputMapper {
        &self.mapper
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    /// Map, publish and dispatch one snapshot.
    ///
    /// Never fails: publish and dispatch errors are logged and counted.
    pub async fn handle(&mut self, snapshot: &InputSnapshot) {
        let span = info_span!("teleop", node = %self.name, seq = snapshot.header.seq);
        self.handle_inner(snapshot).instrument(span).await;
    }

    async fn handle_inner(&mut self, snapshot: &InputSnapshot) {
        let (command, requests) = {
            // The mapper logs synchronously; keep its events inside the node span
            let _entered = info_span!("map").entered();
            self.mapper.map(snapshot)
        };
        self.stats.snapshots += 1;

        match self.sink.publish(&command).await {
            Ok(()) => self.stats.published += 1,
            Err(e) => {
                self.stats.publish_failures += 1;
                warn!("Failed to publish command: {}", e);
            }
        }

        for request in requests {
            self.dispatch(request).await;

            if request == SideEffectRequest::DisableThrusters && !self.stall.is_zero() {
                debug!("Stalling mapping pipeline for {:?}", self.stall);
                tokio::time::sleep(self.stall).await;
            }
        }

        if self.stats.snapshots % LOG_INTERVAL_SNAPSHOTS == 0 {
            let state = self.mapper.state();
            info!(
                "Mapped {} snapshots (depth {:.2}, heading {:.2}, depth position mode {})",
                self.stats.snapshots, state.vertical_accum, state.yaw_accum, state.depth_position_mode
            );
        }
    }

    async fn dispatch(&mut self, request: SideEffectRequest) {
        match self.control.request(request).await {
            Ok(()) => {
                self.stats.requests_dispatched += 1;
                debug!("Request {} delivered", request);
            }
            Err(e) => {
                self.stats.request_failures += 1;
                error!("{}: request {} failed: {}", self.name, request, e);
            }
        }
    }

    /// Process snapshots until the channel closes. Returns the final counters.
    pub async fn run(mut self, mut snapshots: mpsc::Receiver<InputSnapshot>) -> NodeStats {
        info!("{}: mapping pipeline started", self.name);

        while let Some(snapshot) = snapshots.recv().await {
            self.handle(&snapshot).await;
        }

        info!(
            "{}: input closed after {} snapshots ({} publish failures, {} request failures)",
            self.name, self.stats.snapshots, self.stats.publish_failures, self.stats.request_failures
        );
        self.stats
    }
}
