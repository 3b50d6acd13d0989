//! Device enumeration port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::device::{pick_device, CaptureDevice, DevicePosition, MediaKind};

/// Device enumeration errors
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("No {kind} device available ({position})")]
    NoDeviceAvailable {
        kind: MediaKind,
        position: DevicePosition,
    },

    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),
}

/// Port for enumerating capture devices.
///
/// `list_devices` returns a snapshot taken at call time; devices may appear
/// or vanish between snapshots.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// List all devices of the given kind.
    async fn list_devices(&self, kind: MediaKind) -> Result<Vec<CaptureDevice>, DeviceError>;

    /// Find one device of the given kind, optionally constrained to a facing.
    ///
    /// # Returns
    /// The first matching device from a fresh snapshot, or
    /// `NoDeviceAvailable` when nothing matches.
    async fn find_device(
        &self,
        kind: MediaKind,
        position: Option<DevicePosition>,
    ) -> Result<CaptureDevice, DeviceError> {
        let devices = self.list_devices(kind).await?;
        pick_device(&devices, kind, position)
            .cloned()
            .ok_or(DeviceError::NoDeviceAvailable {
                kind,
                position: position.unwrap_or(DevicePosition::Unspecified),
            })
    }
}
