//! Violation and device status types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pre-classified violation signals from the proctoring client
///
/// The engine never sees raw media; clients classify events before
/// reporting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Exam window or tab lost focus
    FocusLoss,
    /// Examinee switched to another application
    WindowSwitch,
    /// Camera or microphone disconnected mid-session
    DeviceDisconnect,
    /// Face left the camera frame
    FaceNotVisible,
    /// More than one face in frame
    MultipleFaces,
    /// A prohibited application was detected
    ProhibitedApp,
    /// Flagged manually by a live proctor
    ManualFlag,
    /// Anything the client could not classify
    Other,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FocusLoss => "focus_loss",
            Self::WindowSwitch => "window_switch",
            Self::DeviceDisconnect => "device_disconnect",
            Self::FaceNotVisible => "face_not_visible",
            Self::MultipleFaces => "multiple_faces",
            Self::ProhibitedApp => "prohibited_app",
            Self::ManualFlag => "manual_flag",
            Self::Other => "other",
        }
    }
}

/// One recorded violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Weighted severity assigned by the policy at intake
    pub severity: f64,
    pub at: DateTime<Utc>,
    pub description: Option<String>,
}

/// Readiness of the proctoring devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub camera: bool,
    pub microphone: bool,
}
