//! btleplug binding of the session transport capability.
//!
//! Wraps one adapter/peripheral pair behind [`SessionTransport`] so the
//! session state machine never touches the BLE stack directly.

use async_trait::async_trait;
use btleplug::api::{Central, Peripheral as _};
use btleplug::platform::{Adapter, Peripheral};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use tracing::trace;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::session::{SessionTransport, TransportEvent};

/// BLE transport for one peripheral.
///
/// Disconnect detection comes from the adapter's central event stream,
/// filtered down to this peripheral; notifications come from the
/// peripheral itself. Both are merged into one session event stream.
pub struct BleTransport {
    adapter: Adapter,
    peripheral: Peripheral,
}

impl BleTransport {
    /// Create a transport for a discovered peripheral.
    pub fn new(adapter: Adapter, peripheral: Peripheral) -> Self {
        Self {
            adapter,
            peripheral,
        }
    }

    /// The wrapped peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }
}

#[async_trait]
impl SessionTransport for BleTransport {
    async fn connect(&self) -> Result<()> {
        if self.peripheral.is_connected().await.unwrap_or(false) {
            trace!("Peripheral already connected at BLE level");
            return Ok(());
        }
        self.peripheral.connect().await.map_err(Error::Bluetooth)
    }

    async fn discover_services(&self) -> Result<()> {
        self.peripheral
            .discover_services()
            .await
            .map_err(Error::Bluetooth)
    }

    fn service_characteristics(&self, service: &Uuid) -> Option<Vec<Uuid>> {
        self.peripheral
            .services()
            .into_iter()
            .find(|s| s.uuid == *service)
            .map(|s| s.characteristics.iter().map(|c| c.uuid).collect())
    }

    async fn subscribe(&self, characteristic: &Uuid) -> Result<()> {
        let target = self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == *characteristic)
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: characteristic.to_string(),
            })?;

        self.peripheral
            .subscribe(&target)
            .await
            .map_err(|e| Error::SubscriptionFailed {
                reason: e.to_string(),
            })
    }

    async fn events(&self) -> Result<BoxStream<'static, TransportEvent>> {
        let notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(Error::Bluetooth)?
            .map(|notification| TransportEvent::Notification {
                characteristic: notification.uuid,
                data: notification.value,
            });

        let id = self.peripheral.id();
        let disconnects = self
            .adapter
            .events()
            .await
            .map_err(Error::Bluetooth)?
            .filter_map(move |event| {
                use btleplug::api::CentralEvent;
                future::ready(match event {
                    CentralEvent::DeviceDisconnected(peripheral_id) if peripheral_id == id => {
                        Some(TransportEvent::Disconnected)
                    }
                    _ => None,
                })
            });

        Ok(futures::stream::select(notifications, disconnects).boxed())
    }
}
