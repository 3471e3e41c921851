//! Local media devices
//!
//! Camera and screen streams go through an explicit `Off -> Acquiring ->
//! On` cycle so a failed acquisition is a transition back to `Off` rather
//! than a rollback of an optimistic flag.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a camera or screen stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaState {
    #[default]
    Off,
    /// Waiting on the device; the UI shows a pending indicator
    Acquiring,
    On,
}

impl MediaState {
    pub fn is_on(&self) -> bool {
        matches!(self, MediaState::On)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Microphone,
    Camera,
    Screen,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Microphone => write!(f, "Microphone"),
            MediaKind::Camera => write!(f, "Camera"),
            MediaKind::Screen => write!(f, "Screen"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("{0} permission denied")]
    PermissionDenied(MediaKind),

    #[error("{0} unavailable")]
    DeviceUnavailable(MediaKind),
}

impl MediaError {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaError::PermissionDenied(kind) | MediaError::DeviceUnavailable(kind) => *kind,
        }
    }
}

/// An open microphone stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHandle {
    pub id: u64,
    pub device: String,
}

/// An open camera or screen stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHandle {
    pub id: u64,
    pub kind: MediaKind,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaHandle {
    Audio(AudioHandle),
    Video(VideoHandle),
}

/// Access to the platform's capture devices
pub trait MediaDeviceGateway {
    fn acquire_microphone(&mut self) -> Result<AudioHandle, MediaError>;

    fn acquire_camera(&mut self) -> Result<VideoHandle, MediaError>;

    fn acquire_screen(&mut self, source_id: &str) -> Result<VideoHandle, MediaError>;

    /// Stop a stream previously handed out
    fn release(&mut self, handle: MediaHandle);
}

/// Device gateway with no hardware behind it
///
/// Hands out numbered handles and keeps track of which are open. Kinds can
/// be marked as denied or missing to exercise the failure paths.
#[derive(Debug, Default)]
pub struct SimulatedDevices {
    next_id: u64,
    open: HashSet<u64>,
    denied: HashSet<MediaKind>,
    missing: HashSet<MediaKind>,
}

impl SimulatedDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(mut self, kind: MediaKind) -> Self {
        self.denied.insert(kind);
        self
    }

    pub fn without(mut self, kind: MediaKind) -> Self {
        self.missing.insert(kind);
        self
    }

    pub fn set_denied(&mut self, kind: MediaKind, denied: bool) {
        if denied {
            self.denied.insert(kind);
        } else {
            self.denied.remove(&kind);
        }
    }

    /// Number of handles acquired and not yet released
    pub fn open_streams(&self) -> usize {
        self.open.len()
    }

    fn open(&mut self, kind: MediaKind) -> Result<u64, MediaError> {
        if self.missing.contains(&kind) {
            return Err(MediaError::DeviceUnavailable(kind));
        }
        if self.denied.contains(&kind) {
            return Err(MediaError::PermissionDenied(kind));
        }
        self.next_id += 1;
        self.open.insert(self.next_id);
        Ok(self.next_id)
    }
}

impl MediaDeviceGateway for SimulatedDevices {
    fn acquire_microphone(&mut self) -> Result<AudioHandle, MediaError> {
        let id = self.open(MediaKind::Microphone)?;
        Ok(AudioHandle {
            id,
            device: "default".to_string(),
        })
    }

    fn acquire_camera(&mut self) -> Result<VideoHandle, MediaError> {
        let id = self.open(MediaKind::Camera)?;
        Ok(VideoHandle {
            id,
            kind: MediaKind::Camera,
            source: "default".to_string(),
        })
    }

    fn acquire_screen(&mut self, source_id: &str) -> Result<VideoHandle, MediaError> {
        let id = self.open(MediaKind::Screen)?;
        Ok(VideoHandle {
            id,
            kind: MediaKind::Screen,
            source: source_id.to_string(),
        })
    }

    fn release(&mut self, handle: MediaHandle) {
        let id = match handle {
            MediaHandle::Audio(h) => h.id,
            MediaHandle::Video(h) => h.id,
        };
        self.open.remove(&id);
    }
}
