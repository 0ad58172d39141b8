//! Proctoring policy configuration
//!
//! Maps violation kinds to severity weights and sets the escalation
//! thresholds. Cumulative weighted severity over the session lifetime
//! drives the monitor's state.

use serde::{Deserialize, Serialize};

use super::types::ViolationKind;

/// Severity weight per violation kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    #[serde(default = "default_focus_loss")]
    pub focus_loss: f64,
    #[serde(default = "default_window_switch")]
    pub window_switch: f64,
    #[serde(default = "default_device_disconnect")]
    pub device_disconnect: f64,
    #[serde(default = "default_face_not_visible")]
    pub face_not_visible: f64,
    #[serde(default = "default_multiple_faces")]
    pub multiple_faces: f64,
    #[serde(default = "default_prohibited_app")]
    pub prohibited_app: f64,
    #[serde(default = "default_manual_flag")]
    pub manual_flag: f64,
    #[serde(default = "default_other")]
    pub other: f64,
}

fn default_focus_loss() -> f64 {
    1.0
}

fn default_window_switch() -> f64 {
    2.0
}

fn default_device_disconnect() -> f64 {
    3.0
}

fn default_face_not_visible() -> f64 {
    2.0
}

fn default_multiple_faces() -> f64 {
    4.0
}

fn default_prohibited_app() -> f64 {
    4.0
}

fn default_manual_flag() -> f64 {
    5.0
}

fn default_other() -> f64 {
    1.0
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            focus_loss: default_focus_loss(),
            window_switch: default_window_switch(),
            device_disconnect: default_device_disconnect(),
            face_not_visible: default_face_not_visible(),
            multiple_faces: default_multiple_faces(),
            prohibited_app: default_prohibited_app(),
            manual_flag: default_manual_flag(),
            other: default_other(),
        }
    }
}

impl SeverityWeights {
    pub fn weight(&self, kind: ViolationKind) -> f64 {
        match kind {
            ViolationKind::FocusLoss => self.focus_loss,
            ViolationKind::WindowSwitch => self.window_switch,
            ViolationKind::DeviceDisconnect => self.device_disconnect,
            ViolationKind::FaceNotVisible => self.face_not_visible,
            ViolationKind::MultipleFaces => self.multiple_faces,
            ViolationKind::ProhibitedApp => self.prohibited_app,
            ViolationKind::ManualFlag => self.manual_flag,
            ViolationKind::Other => self.other,
        }
    }
}

/// Escalation policy for one session's proctoring monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProctorPolicy {
    /// Severity weight assigned per violation kind
    #[serde(default)]
    pub severity: SeverityWeights,
    /// Cumulative severity at which the session is flagged for review
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f64,
    /// Cumulative severity at which the session is force-terminated
    #[serde(default = "default_termination_threshold")]
    pub termination_threshold: f64,
    /// Seconds allowed for camera/microphone setup before the session
    /// fails to start
    #[serde(default = "default_setup_timeout_secs")]
    pub setup_timeout_secs: u64,
    /// Whether a camera is required for this exam
    #[serde(default = "default_true")]
    pub require_camera: bool,
    /// Whether a microphone is required for this exam
    #[serde(default = "default_true")]
    pub require_microphone: bool,
}

fn default_review_threshold() -> f64 {
    4.0
}

fn default_termination_threshold() -> f64 {
    9.0
}

fn default_setup_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

impl Default for ProctorPolicy {
    fn default() -> Self {
        Self {
            severity: SeverityWeights::default(),
            review_threshold: default_review_threshold(),
            termination_threshold: default_termination_threshold(),
            setup_timeout_secs: default_setup_timeout_secs(),
            require_camera: true,
            require_microphone: true,
        }
    }
}

impl ProctorPolicy {
    /// Parse a policy from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
