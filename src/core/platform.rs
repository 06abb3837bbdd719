//! Apple platforms a pod can support.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An Apple platform.
///
/// Declaration order matches the display-name sort order used for app
/// targets (`iOS`, `macOS`, `tvOS`, `watchOS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Osx,
    Tvos,
    Watchos,
}

impl Platform {
    /// All platforms, in display order.
    pub const ALL: [Platform; 4] = [
        Platform::Ios,
        Platform::Osx,
        Platform::Tvos,
        Platform::Watchos,
    ];

    /// The symbolic name used in podspecs and Podfiles (`osx`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Osx => "osx",
            Platform::Tvos => "tvos",
            Platform::Watchos => "watchos",
        }
    }

    /// The human-facing name (`macOS`).
    pub fn string_name(&self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Osx => "macOS",
            Platform::Tvos => "tvOS",
            Platform::Watchos => "watchOS",
        }
    }

    /// The name accepted by the `platforms` filter option (`macos`).
    pub fn filter_name(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Osx => "macos",
            Platform::Tvos => "tvos",
            Platform::Watchos => "watchos",
        }
    }

    /// All names accepted by the `platforms` filter option.
    pub fn filter_names() -> Vec<&'static str> {
        Platform::ALL.iter().map(Platform::filter_name).collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.string_name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "osx" | "macos" => Ok(Platform::Osx),
            "tvos" => Ok(Platform::Tvos),
            "watchos" => Ok(Platform::Watchos),
            _ => Err(format!("unknown platform `{}`", s)),
        }
    }
}

/// A platform together with an optional minimum deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformTarget {
    /// The platform
    pub name: Platform,

    /// Minimum deployment target (`10.0`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_target: Option<String>,
}

impl PlatformTarget {
    /// Create a platform target.
    pub fn new(name: Platform, deployment_target: Option<String>) -> Self {
        PlatformTarget {
            name,
            deployment_target,
        }
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.deployment_target {
            Some(target) => write!(f, "{} {}", self.name.string_name(), target),
            None => write!(f, "{}", self.name.string_name()),
        }
    }
}
