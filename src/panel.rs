// MIT License - Copyright (c) 2026 Peter Wright
// Panel facade and shared model

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::codec::encode_frame;
use crate::config::PanelConfig;
use crate::constants::{CRLF, MAX_ZONES};
use crate::devices::output::Output;
use crate::devices::partition::{ArmStatus, Partition};
use crate::devices::zone::Zone;
use crate::error::{AdemcoError, Result};
use crate::event::{event_channel, EventReceiver, EventSender, PanelEvent};
use crate::protocol::Command;
use crate::transport::link::{supervise, LinkState};
use crate::transport::queue::CommandQueue;
use crate::transport::{Connector, SerialConnector};

/// State shared between the facade, the link duties and the device handles.
pub(crate) struct PanelShared {
    pub(crate) config: PanelConfig,
    pub(crate) queue: CommandQueue,
    weak_self: Weak<PanelShared>,
    zones: Vec<Zone>,
    outputs: RwLock<BTreeMap<u32, bool>>,
    partitions: RwLock<BTreeMap<u32, Partition>>,
    zone_partitions: RwLock<Option<String>>,
    initialized: AtomicBool,
    event_tx: EventSender,
    link_state: watch::Sender<LinkState>,
}

impl PanelShared {
    pub(crate) fn new(config: PanelConfig) -> Arc<Self> {
        let (event_tx, _) = event_channel(config.event_capacity.max(1));
        let (link_state, _) = watch::channel(LinkState::Disconnected);
        Arc::new_cyclic(|weak| Self {
            zones: (1..=MAX_ZONES).map(|id| Zone::new(id, weak.clone())).collect(),
            weak_self: weak.clone(),
            config,
            queue: CommandQueue::new(),
            outputs: RwLock::new(BTreeMap::new()),
            partitions: RwLock::new(BTreeMap::new()),
            zone_partitions: RwLock::new(None),
            initialized: AtomicBool::new(false),
            event_tx,
            link_state,
        })
    }

    pub(crate) fn emit(&self, event: PanelEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    // --- Zones ---

    pub(crate) fn zone(&self, id: u32) -> Option<Zone> {
        self.zones.get((id as usize).wrapping_sub(1)).cloned()
    }

    pub(crate) fn zones(&self) -> Vec<Zone> {
        self.zones.clone()
    }

    pub(crate) fn set_zone_partitions(&self, table: &str) {
        debug!("Zone partition table: {:?}", table);
        *self.zone_partitions.write() = Some(table.to_string());
    }

    pub(crate) fn zone_partition(&self, zone_id: u32) -> Option<char> {
        let table = self.zone_partitions.read();
        table
            .as_deref()?
            .chars()
            .nth((zone_id as usize).checked_sub(1)?)
    }

    // --- Outputs ---

    pub(crate) fn output_state(&self, id: u32) -> Option<bool> {
        self.outputs.read().get(&id).copied()
    }

    pub(crate) fn output(&self, id: u32) -> Option<Output> {
        self.outputs
            .read()
            .contains_key(&id)
            .then(|| Output::new(id, self.weak_self.clone()))
    }

    /// Record an output's state. Returns true and emits an event if it changed.
    pub(crate) fn apply_output_status(&self, id: u32, on: bool) -> bool {
        let previous = self.outputs.write().insert(id, on);
        if previous == Some(on) {
            return false;
        }
        debug!("Output {} is now {}", id, if on { "on" } else { "off" });
        self.emit(PanelEvent::OutputStatusChanged { output_id: id, on });
        true
    }

    /// Queue the relay command, then update local state without waiting
    /// for the panel to confirm.
    pub(crate) fn set_output(&self, id: u32, on: bool) -> Result<()> {
        self.enqueue(&Command::output(id, on))?;
        self.apply_output_status(id, on);
        Ok(())
    }

    // --- Partitions ---

    pub(crate) fn partition(&self, id: u32) -> Option<Partition> {
        self.partitions.read().get(&id).cloned()
    }

    pub(crate) fn partitions(&self) -> Vec<Partition> {
        self.partitions.read().values().cloned().collect()
    }

    /// Create the partition on first sight, otherwise apply the new letter.
    pub(crate) fn apply_partition_status(&self, id: u32, code: char) -> Result<bool> {
        let existing = {
            let mut partitions = self.partitions.write();
            match partitions.get(&id) {
                Some(partition) => partition.clone(),
                None => {
                    let status = ArmStatus::from_code(code)?;
                    partitions.insert(id, Partition::new(id, status, self.weak_self.clone()));
                    info!("Partition {} discovered ({:?})", id, status);
                    return Ok(true);
                }
            }
        };
        // Lock released: callbacks may read the partition map.
        existing.process_status(code)
    }

    // --- Commands ---

    /// Encode a pre-checksum body and append it to the outbound queue.
    pub(crate) fn send_body(&self, body: &str) -> Result<()> {
        if body.is_empty() || !body.is_ascii() || body.bytes().any(|b| CRLF.contains(&b)) {
            return Err(AdemcoError::malformed(format!(
                "command body must be non-empty single-line ASCII, got {:?}",
                body
            )));
        }
        debug!("Queueing {}", body);
        self.queue.push(encode_frame(body))
    }

    pub(crate) fn enqueue(&self, command: &Command) -> Result<()> {
        self.send_body(&command.to_body()?)
    }

    // --- Link state ---

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_initialized(&self) {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            info!("Zone status received, panel initialized");
            self.emit(PanelEvent::Initialized);
        }
    }

    pub(crate) fn set_link_state(&self, state: LinkState) -> LinkState {
        self.link_state.send_replace(state)
    }

    /// Connection ended: model stays, initialized flag drops.
    pub(crate) fn link_down(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        if self.set_link_state(LinkState::Disconnected) == LinkState::Connected {
            self.emit(PanelEvent::Disconnected);
        }
    }

    /// Forget everything learned from the panel.
    fn reset_model(&self) {
        self.link_down();
        for zone in &self.zones {
            zone.reset();
        }
        self.outputs.write().clear();
        self.partitions.write().clear();
        *self.zone_partitions.write() = None;
    }
}

type Spawner = Box<dyn Fn(Arc<PanelShared>) -> JoinHandle<()> + Send + Sync>;

/// The main public API for a serial-attached panel.
///
/// Construction validates the configuration and starts a background
/// supervisor that opens the port, polls status and reconnects on failure.
/// State is read synchronously from the in-memory model.
///
/// # Example
///
/// ```no_run
/// use ademco_serial::{Panel, PanelConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = PanelConfig::builder()
///         .device("/dev/ttyUSB0")
///         .zones([1, 2, 3])
///         .outputs([1])
///         .build();
///
///     let panel = Panel::new(config)?;
///
///     if let Some(zone) = panel.zone(1) {
///         let z = zone.clone();
///         zone.register_callback(move || println!("zone 1 open={}", z.opened()));
///     }
///
///     panel.request_output_status()?;
///
///     tokio::signal::ctrl_c().await?;
///     panel.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Panel {
    shared: Arc<PanelShared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    spawner: Spawner,
}

impl Panel {
    /// Start a panel on the configured serial device.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: PanelConfig) -> Result<Self> {
        Self::with_connector(config, SerialConnector)
    }

    /// Start a panel over a custom transport.
    pub fn with_connector<C: Connector>(config: PanelConfig, connector: C) -> Result<Self> {
        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(AdemcoError::InvalidConfig {
                reason: "Panel must be created inside a Tokio runtime".to_string(),
            });
        }

        let connector = Arc::new(connector);
        let spawner: Spawner =
            Box::new(move |shared| tokio::spawn(supervise(shared, connector.clone())));

        let shared = PanelShared::new(config);
        let handle = spawner(shared.clone());
        info!("Panel driver started");

        Ok(Self {
            shared,
            supervisor: Mutex::new(Some(handle)),
            spawner,
        })
    }

    /// Subscribe to panel events.
    pub fn subscribe(&self) -> EventReceiver {
        self.shared.subscribe()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.shared.config
    }

    // --- Device Accessors ---

    /// Get a zone by ID (1-96).
    pub fn zone(&self, id: u32) -> Option<Zone> {
        self.shared.zone(id)
    }

    /// All 96 zones, in id order.
    pub fn zones(&self) -> Vec<Zone> {
        self.shared.zones()
    }

    /// The zones named in the configuration.
    pub fn configured_zones(&self) -> Vec<Zone> {
        self.shared
            .config
            .zones
            .iter()
            .filter_map(|&id| self.shared.zone(id))
            .collect()
    }

    /// Get an output by ID. `None` until a status report or a command has
    /// brought it into use.
    pub fn output(&self, id: u32) -> Option<Output> {
        self.shared.output(id)
    }

    /// Handles for the outputs named in the configuration, whether or not
    /// the panel has reported them yet.
    pub fn configured_outputs(&self) -> Vec<Output> {
        self.shared
            .config
            .outputs
            .iter()
            .map(|&id| Output::new(id, Arc::downgrade(&self.shared)))
            .collect()
    }

    pub fn partition(&self, id: u32) -> Option<Partition> {
        self.shared.partition(id)
    }

    pub fn partitions(&self) -> Vec<Partition> {
        self.shared.partitions()
    }

    /// True once a zone status report has been applied on the current link.
    pub fn is_initialized(&self) -> bool {
        self.shared.is_initialized()
    }

    pub fn link_state(&self) -> LinkState {
        *self.shared.link_state.borrow()
    }

    pub fn watch_link_state(&self) -> watch::Receiver<LinkState> {
        self.shared.link_state.subscribe()
    }

    // --- Commands ---

    /// Queue a pre-checksum body (e.g. `08zs00`). The checksum and line
    /// terminator are added here.
    pub fn send_command(&self, body: &str) -> Result<()> {
        self.shared.send_body(body)
    }

    pub fn send(&self, command: &Command) -> Result<()> {
        self.shared.enqueue(command)
    }

    pub fn request_zone_status(&self) -> Result<()> {
        self.send(&Command::ZoneStatusRequest)
    }

    pub fn request_output_status(&self) -> Result<()> {
        self.send(&Command::OutputStatusRequest)
    }

    pub fn request_zone_partitions(&self) -> Result<()> {
        self.send(&Command::ZonePartitionRequest)
    }

    /// Not part of the automatic refresh cycle.
    pub fn request_arming_status(&self) -> Result<()> {
        self.send(&Command::ArmingStatusRequest)
    }

    /// Drive a relay output, creating its entry if the panel has not
    /// reported it yet.
    pub fn set_output(&self, id: u32, on: bool) -> Result<()> {
        self.shared.set_output(id, on)
    }

    // --- Lifecycle ---

    /// Tear down the link, drop queued commands, reset the model and start
    /// a fresh supervisor. Concurrent calls are serialised.
    pub async fn restart(&self) {
        let mut supervisor = self.supervisor.lock().await;
        if let Some(handle) = supervisor.take() {
            handle.abort();
            let _ = handle.await;
        }
        let dropped = self.shared.queue.clear().await;
        self.shared.reset_model();
        info!("Restarting panel driver ({} queued commands dropped)", dropped);
        *supervisor = Some((self.spawner)(self.shared.clone()));
    }

    /// Stop the supervisor. The model keeps its last state.
    pub async fn shutdown(&self) {
        let mut supervisor = self.supervisor.lock().await;
        if let Some(handle) = supervisor.take() {
            info!("Shutting down panel driver");
            handle.abort();
            let _ = handle.await;
        }
        self.shared.link_down();
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        if let Some(handle) = self.supervisor.get_mut().take() {
            handle.abort();
        }
    }
}
