//! Capture device value objects and selection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::PositionParseError;

/// Media kinds a device can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical facing of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePosition {
    Front,
    Back,
    #[default]
    Unspecified,
}

impl DevicePosition {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Unspecified => "unspecified",
        }
    }

    /// The facing on the other side of the device, if there is one
    pub const fn opposite(&self) -> Option<DevicePosition> {
        match self {
            Self::Front => Some(Self::Back),
            Self::Back => Some(Self::Front),
            Self::Unspecified => None,
        }
    }
}

impl fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DevicePosition {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            "unspecified" => Ok(Self::Unspecified),
            _ => Err(PositionParseError {
                input: s.to_string(),
            }),
        }
    }
}

/// Stable identifier for a capture device within one enumerator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Immutable snapshot of one capture device.
/// Describes the device at enumeration time; it does not track hot-plug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDevice {
    pub id: DeviceId,
    pub name: String,
    pub kind: MediaKind,
    pub position: DevicePosition,
}

impl CaptureDevice {
    pub fn new(
        id: impl Into<DeviceId>,
        name: impl Into<String>,
        kind: MediaKind,
        position: DevicePosition,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            position,
        }
    }
}

impl fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({}, {})", self.name, self.id, self.kind, self.position)
    }
}

/// Select the first device of the given kind from a snapshot,
/// optionally constrained to a facing.
pub fn pick_device(
    devices: &[CaptureDevice],
    kind: MediaKind,
    position: Option<DevicePosition>,
) -> Option<&CaptureDevice> {
    devices
        .iter()
        .find(|d| d.kind == kind && position.map_or(true, |p| d.position == p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<CaptureDevice> {
        vec![
            CaptureDevice::new("cam0", "Front Camera", MediaKind::Video, DevicePosition::Front),
            CaptureDevice::new("cam1", "Back Camera", MediaKind::Video, DevicePosition::Back),
            CaptureDevice::new("mic0", "Built-in Mic", MediaKind::Audio, DevicePosition::Unspecified),
        ]
    }

    #[test]
    fn pick_video_by_position() {
        let devices = snapshot();
        let front = pick_device(&devices, MediaKind::Video, Some(DevicePosition::Front)).unwrap();
        assert_eq!(front.id, DeviceId::new("cam0"));

        let back = pick_device(&devices, MediaKind::Video, Some(DevicePosition::Back)).unwrap();
        assert_eq!(back.id, DeviceId::new("cam1"));
    }

    #[test]
    fn pick_audio_ignores_position() {
        let devices = snapshot();
        let mic = pick_device(&devices, MediaKind::Audio, None).unwrap();
        assert_eq!(mic.id, DeviceId::new("mic0"));
    }

    #[test]
    fn pick_missing_position_returns_none() {
        let devices = vec![CaptureDevice::new(
            "cam0",
            "Front Camera",
            MediaKind::Video,
            DevicePosition::Front,
        )];
        assert!(pick_device(&devices, MediaKind::Video, Some(DevicePosition::Back)).is_none());
    }

    #[test]
    fn pick_from_empty_snapshot_returns_none() {
        assert!(pick_device(&[], MediaKind::Video, None).is_none());
        assert!(pick_device(&[], MediaKind::Audio, None).is_none());
    }

    #[test]
    fn opposite_positions() {
        assert_eq!(DevicePosition::Front.opposite(), Some(DevicePosition::Back));
        assert_eq!(DevicePosition::Back.opposite(), Some(DevicePosition::Front));
        assert_eq!(DevicePosition::Unspecified.opposite(), None);
    }

    #[test]
    fn position_parses() {
        assert_eq!("front".parse::<DevicePosition>().unwrap(), DevicePosition::Front);
        assert_eq!("Back".parse::<DevicePosition>().unwrap(), DevicePosition::Back);
        assert_eq!(
            " unspecified ".parse::<DevicePosition>().unwrap(),
            DevicePosition::Unspecified
        );
        assert!("sideways".parse::<DevicePosition>().is_err());
    }

    #[test]
    fn kind_display() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
    }

    #[test]
    fn device_display_includes_name_and_id() {
        let device = snapshot().remove(0);
        let rendered = device.to_string();
        assert!(rendered.contains("Front Camera"));
        assert!(rendered.contains("cam0"));
        assert!(rendered.contains("video"));
    }
}
