//! Device session lifecycle management.
//!
//! [`DeviceSession`] owns the per-device connection state machine:
//! connect, resolve the measurement service and characteristic, subscribe
//! to notifications, and stream decoded measurements. The BLE binding is
//! injected as a narrow [`SessionTransport`] capability rather than
//! inherited, so the machine can be driven by a scripted transport in
//! tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::uuids::{MEASUREMENT_CHARACTERISTIC_UUID, MEASUREMENT_SERVICE_UUID};
use crate::data::{DeviceAddress, Measurement};
use crate::error::{Error, Result};
use crate::protocol;

/// Connection state for a multimeter session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No connection attempt has been made yet.
    #[default]
    Idle,
    /// Currently attempting to connect.
    Connecting,
    /// Transport-level connection established.
    Connected,
    /// Locating the measurement service and characteristic.
    ServicesResolving,
    /// Enabling notifications on the measurement characteristic.
    Subscribing,
    /// Receiving measurement notifications.
    Streaming,
    /// The last connect or subscribe attempt failed.
    Error,
    /// The transport reported a disconnect.
    Disconnected,
}

impl SessionState {
    /// Check if measurements are flowing.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// Check if in a transitional state between idle and streaming.
    pub fn is_transitioning(&self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Connected | Self::ServicesResolving | Self::Subscribing
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::ServicesResolving => write!(f, "ServicesResolving"),
            Self::Subscribing => write!(f, "Subscribing"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Error => write!(f, "Error"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Event delivered by the transport while a session is up.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The connection to the device was lost.
    Disconnected,
    /// A characteristic notification arrived.
    Notification {
        /// UUID of the characteristic that sent the notification.
        characteristic: Uuid,
        /// The raw frame bytes.
        data: Vec<u8>,
    },
}

/// Narrow BLE transport capability consumed by [`DeviceSession`].
///
/// Commands return `Result`; asynchronous connection and notification
/// events arrive through the stream returned by [`events`](Self::events).
/// The transport owns its own dispatch loop; the session only ever
/// processes one event at a time.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Attempt a transport-level connection.
    async fn connect(&self) -> Result<()>;

    /// Run service discovery on the connected device.
    async fn discover_services(&self) -> Result<()>;

    /// Characteristic UUIDs of a resolved service, or `None` if the
    /// service is not present on the device.
    fn service_characteristics(&self, service: &Uuid) -> Option<Vec<Uuid>>;

    /// Enable notifications on a characteristic.
    async fn subscribe(&self, characteristic: &Uuid) -> Result<()>;

    /// Event stream for the current connection.
    async fn events(&self) -> Result<BoxStream<'static, TransportEvent>>;
}

/// Session state change event.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    /// The address of the session's device.
    pub address: DeviceAddress,
    /// The new session state.
    pub state: SessionState,
}

/// One decoded measurement, tagged with its origin and arrival time.
#[derive(Debug, Clone)]
pub struct MeasurementEvent {
    /// The address of the device that produced the reading.
    pub address: DeviceAddress,
    /// Wall-clock time the notification arrived.
    pub timestamp: DateTime<Utc>,
    /// The decoded measurement.
    pub measurement: Measurement,
}

/// Owns the connection lifecycle for one multimeter.
pub struct DeviceSession<T: SessionTransport> {
    /// The device this session is bound to.
    address: DeviceAddress,
    /// Injected BLE transport.
    transport: T,
    /// Current session state.
    state: Arc<RwLock<SessionState>>,
    /// Whether to reconnect after failures and disconnects.
    auto_reconnect: bool,
    /// Fixed delay between reconnect attempts.
    reconnect_delay: Duration,
    /// Guards against a second concurrent driver.
    running: AtomicBool,
    /// Channel for state change events.
    event_tx: broadcast::Sender<SessionEvent>,
    /// Channel for decoded measurements.
    measurement_tx: broadcast::Sender<MeasurementEvent>,
}

impl<T: SessionTransport> DeviceSession<T> {
    /// Default delay between reconnect attempts.
    pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

    /// Create a new session for a device.
    pub fn new(address: DeviceAddress, transport: T, auto_reconnect: bool) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let (measurement_tx, _) = broadcast::channel(256);

        Self {
            address,
            transport,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            auto_reconnect,
            reconnect_delay: Self::DEFAULT_RECONNECT_DELAY,
            running: AtomicBool::new(false),
            event_tx,
            measurement_tx,
        }
    }

    /// Override the fixed reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// The address of the session's device.
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Subscribe to session state change events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to decoded measurements.
    pub fn subscribe_measurements(&self) -> broadcast::Receiver<MeasurementEvent> {
        self.measurement_tx.subscribe()
    }

    /// Drive the session through its lifecycle.
    ///
    /// With auto-reconnect enabled, connect failures retry unconditionally
    /// after the fixed delay and disconnects immediately re-issue a
    /// connect; the call only returns on a fatal session error. Without
    /// it, the first connect failure or disconnect ends the call.
    ///
    /// A session has at most one driver; a second concurrent call fails
    /// with [`Error::ConnectionFailed`].
    pub async fn run(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::ConnectionFailed {
                reason: "session already active".to_string(),
            });
        }

        let result = self.drive().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn drive(&self) -> Result<()> {
        loop {
            self.set_state(SessionState::Connecting);

            if let Err(e) = self.transport.connect().await {
                warn!("[{}] Connection to multimeter failed: {}", self.address, e);
                self.set_state(SessionState::Error);

                if !self.auto_reconnect {
                    return Err(Error::ConnectionFailed {
                        reason: e.to_string(),
                    });
                }

                info!("[{}] Attempting to reconnect", self.address);
                tokio::time::sleep(self.reconnect_delay).await;
                continue;
            }

            info!("[{}] Connected to multimeter", self.address);
            self.set_state(SessionState::Connected);

            self.set_state(SessionState::ServicesResolving);
            self.transport.discover_services().await?;
            debug!("[{}] Services resolved", self.address);

            // The device must expose the well-known measurement service and
            // characteristic; anything else is not the expected model.
            let characteristics = self
                .transport
                .service_characteristics(&MEASUREMENT_SERVICE_UUID)
                .ok_or_else(|| Error::ServiceNotFound {
                    uuid: MEASUREMENT_SERVICE_UUID.to_string(),
                })?;

            if !characteristics.contains(&MEASUREMENT_CHARACTERISTIC_UUID) {
                return Err(Error::CharacteristicNotFound {
                    uuid: MEASUREMENT_CHARACTERISTIC_UUID.to_string(),
                });
            }

            self.set_state(SessionState::Subscribing);

            // Take the event stream before subscribing so no notification
            // can slip past between the two.
            let mut events = self.transport.events().await?;

            match self.transport.subscribe(&MEASUREMENT_CHARACTERISTIC_UUID).await {
                Ok(()) => {
                    debug!("[{}] Subscribed to measurement notifications", self.address);
                    self.set_state(SessionState::Streaming);
                }
                Err(e) => {
                    // Reported, not fatal: the session stays up so a later
                    // disconnect still triggers reconnect handling, but no
                    // measurements will arrive.
                    warn!(
                        "[{}] Could not subscribe to measurement notifications: {}",
                        self.address, e
                    );
                    self.set_state(SessionState::Error);
                }
            }

            while let Some(event) = events.next().await {
                match event {
                    TransportEvent::Notification {
                        characteristic,
                        data,
                    } if characteristic == MEASUREMENT_CHARACTERISTIC_UUID => {
                        self.handle_frame(&data);
                    }
                    TransportEvent::Notification { .. } => {}
                    TransportEvent::Disconnected => break,
                }
            }

            info!("[{}] Disconnected from multimeter", self.address);
            self.set_state(SessionState::Disconnected);

            if !self.auto_reconnect {
                return Ok(());
            }
        }
    }

    /// Decode one notification frame and forward the measurement.
    ///
    /// Frame-level failures are independent of connection-level failures:
    /// a bad frame is logged and dropped, the session keeps streaming.
    fn handle_frame(&self, data: &[u8]) {
        match protocol::decode(data) {
            Ok(measurement) => {
                let _ = self.measurement_tx.send(MeasurementEvent {
                    address: self.address.clone(),
                    timestamp: Utc::now(),
                    measurement,
                });
            }
            Err(e) => {
                warn!("[{}] Dropping undecodable frame: {}", self.address, e);
            }
        }
    }

    /// Update the session state and emit an event.
    fn set_state(&self, new_state: SessionState) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            *state = new_state;
            old
        };

        if old_state != new_state {
            debug!(
                "[{}] Session state changed: {} -> {}",
                self.address, old_state, new_state
            );

            let _ = self.event_tx.send(SessionEvent {
                address: self.address.clone(),
                state: new_state,
            });
        }
    }
}
