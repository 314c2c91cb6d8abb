//! BLE scanning functionality.
//!
//! Provides the discovery coordinator that finds a multimeter by its
//! advertised name and hands its address to a session.

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::data::DeviceAddress;
use crate::error::{Error, Result};

/// A device matched during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Transport-layer address of the device.
    pub address: DeviceAddress,
    /// The peripheral handle, for building a transport.
    pub peripheral: Peripheral,
}

/// Scans for a multimeter matching a name predicate.
pub struct DiscoveryCoordinator {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl DiscoveryCoordinator {
    /// Create a coordinator on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Create a coordinator with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Scan until a device whose advertised name satisfies the predicate
    /// appears, or the timeout elapses.
    ///
    /// Scanning is exclusive per adapter and expensive, so the scan is
    /// stopped before returning on every path, match or not.
    pub async fn discover<P>(&self, predicate: P, timeout: Duration) -> Result<DiscoveredDevice>
    where
        P: Fn(&str) -> bool,
    {
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        debug!("Scan started");

        let result = tokio::time::timeout(timeout, self.match_first(&predicate)).await;

        if let Err(e) = self.adapter.stop_scan().await {
            debug!("Failed to stop scan: {}", e);
        }

        match result {
            Ok(found) => found,
            Err(_elapsed) => Err(Error::DiscoveryTimeout { timeout }),
        }
    }

    /// Watch adapter events for the first matching device.
    async fn match_first<P>(&self, predicate: &P) -> Result<DiscoveredDevice>
    where
        P: Fn(&str) -> bool,
    {
        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        while let Some(event) = events.next().await {
            let id = match event {
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                _ => continue,
            };

            if let Some(device) = self.check_peripheral(id, predicate).await {
                return Ok(device);
            }
        }

        // The adapter event stream ended without a match.
        Err(Error::Internal(
            "adapter event stream ended during discovery".to_string(),
        ))
    }

    /// Inspect one discovered peripheral's advertised name.
    async fn check_peripheral<P>(&self, id: PeripheralId, predicate: &P) -> Option<DiscoveredDevice>
    where
        P: Fn(&str) -> bool,
    {
        let peripheral = match self.adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return None;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return None,
        };

        let name = properties.local_name.as_deref()?;
        if !predicate(name) {
            trace!("Ignoring device {:?} ({})", id, name);
            return None;
        }

        let address = DeviceAddress::new(properties.address.to_string());
        info!("Discovered multimeter [{}] {}", address, name);

        Some(DiscoveredDevice {
            address,
            peripheral,
        })
    }
}
