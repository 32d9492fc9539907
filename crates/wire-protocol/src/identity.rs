//! Device identity types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique device identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Format as user-friendly display string (UUID)
    pub fn to_display_string(&self) -> String {
        self.0.to_string().to_uppercase()
    }

    /// Parse from display string
    pub fn from_display_string(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if let Ok(uuid) = Uuid::parse_str(trimmed) {
            return Some(Self(uuid));
        }

        let cleaned: String = trimmed.chars().filter(|c| c.is_alphanumeric()).collect();
        if cleaned.len() != 32 {
            return None;
        }
        Uuid::parse_str(&cleaned.to_lowercase()).ok().map(Self)
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Platform the device is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Ios,
    Android,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MacOs => "macOS",
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::Ios => "iOS",
            Self::Android => "Android",
        };
        write!(f, "{name}")
    }
}

/// Local device identity, immutable for the process lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub device_id: DeviceId,
    pub display_name: String,
    pub platform: Platform,
    pub app_version: String,
}

impl Identity {
    pub fn new(display_name: impl Into<String>, platform: Platform) -> Self {
        Self {
            device_id: DeviceId::new(),
            display_name: display_name.into(),
            platform,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
