//! Real device enumeration via cpal and nokhwa

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};
use nokhwa::utils::{ApiBackend, CameraIndex};
use tracing::warn;

use crate::application::ports::{DeviceEnumerator, DeviceError};
use crate::domain::device::{CaptureDevice, DevicePosition, MediaKind};

/// Enumerator backed by the machine's real devices.
///
/// Audio devices come from the default cpal host, video devices from the
/// native nokhwa backend. Every call takes a fresh snapshot.
pub struct HostEnumerator;

impl HostEnumerator {
    pub fn new() -> Self {
        Self
    }

    fn list_audio(&self) -> Result<Vec<CaptureDevice>, DeviceError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| DeviceError::EnumerationFailed(e.to_string()))?;

        let mut snapshot = Vec::new();
        for device in devices {
            // Devices that refuse to report a name are unusable anyway.
            let name = match device.name() {
                Ok(name) => name,
                Err(err) => {
                    warn!(error = %err, "skipping unnamed audio device");
                    continue;
                }
            };
            snapshot.push(CaptureDevice::new(
                name.clone(),
                name,
                MediaKind::Audio,
                DevicePosition::Unspecified,
            ));
        }
        Ok(snapshot)
    }

    fn list_video(&self) -> Result<Vec<CaptureDevice>, DeviceError> {
        let cameras = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| DeviceError::EnumerationFailed(e.to_string()))?;

        let entries: Vec<(String, String)> = cameras
            .into_iter()
            .map(|info| {
                let id = match info.index() {
                    CameraIndex::Index(i) => i.to_string(),
                    CameraIndex::String(s) => s.to_string(),
                };
                (id, info.human_name().to_string())
            })
            .collect();

        let names: Vec<&str> = entries.iter().map(|(_, name)| name.as_str()).collect();
        let positions = assign_positions(&names);

        Ok(entries
            .into_iter()
            .zip(positions)
            .map(|((id, name), position)| {
                CaptureDevice::new(id, name, MediaKind::Video, position)
            })
            .collect())
    }
}

impl Default for HostEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceEnumerator for HostEnumerator {
    async fn list_devices(&self, kind: MediaKind) -> Result<Vec<CaptureDevice>, DeviceError> {
        match kind {
            MediaKind::Video => self.list_video(),
            MediaKind::Audio => self.list_audio(),
        }
    }
}

fn position_from_name(name: &str) -> DevicePosition {
    let lower = name.to_lowercase();
    if lower.contains("front") || lower.contains("user") {
        DevicePosition::Front
    } else if lower.contains("back") || lower.contains("rear") || lower.contains("environment") {
        DevicePosition::Back
    } else {
        DevicePosition::Unspecified
    }
}

/// Map camera names to facings.
///
/// Desktop webcams rarely report a facing. When no name resolves to Front,
/// the first camera without a facing becomes the front camera so a
/// single-webcam machine still has one.
pub(crate) fn assign_positions(names: &[&str]) -> Vec<DevicePosition> {
    let mut positions: Vec<DevicePosition> = names
        .iter()
        .map(|name| position_from_name(name))
        .collect();

    if !positions.contains(&DevicePosition::Front) {
        if let Some(slot) = positions
            .iter_mut()
            .find(|p| **p == DevicePosition::Unspecified)
        {
            *slot = DevicePosition::Front;
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_facings_are_honored() {
        let positions = assign_positions(&["FaceTime Front Camera", "Rear Wide Camera"]);
        assert_eq!(positions, vec![DevicePosition::Front, DevicePosition::Back]);
    }

    #[test]
    fn user_and_environment_aliases() {
        let positions = assign_positions(&["User Facing Cam", "Environment Cam"]);
        assert_eq!(positions, vec![DevicePosition::Front, DevicePosition::Back]);
    }

    #[test]
    fn single_unnamed_webcam_becomes_front() {
        let positions = assign_positions(&["Integrated Webcam"]);
        assert_eq!(positions, vec![DevicePosition::Front]);
    }

    #[test]
    fn first_unnamed_webcam_becomes_front_others_stay() {
        let positions = assign_positions(&["Webcam A", "Webcam B"]);
        assert_eq!(
            positions,
            vec![DevicePosition::Front, DevicePosition::Unspecified]
        );
    }

    #[test]
    fn promotion_skips_cameras_with_a_known_facing() {
        let positions = assign_positions(&["Rear Camera", "Webcam"]);
        assert_eq!(positions, vec![DevicePosition::Back, DevicePosition::Front]);
    }

    #[test]
    fn no_promotion_when_a_front_camera_exists() {
        let positions = assign_positions(&["Webcam", "Front Camera"]);
        assert_eq!(
            positions,
            vec![DevicePosition::Unspecified, DevicePosition::Front]
        );
    }

    #[test]
    fn empty_snapshot() {
        assert!(assign_positions(&[]).is_empty());
    }
}
