//! Host application lifecycle states.
//!
//! The hosting platform reports transitions between these states and the
//! session timer reacts to the `(from, to)` pair. Delivery has to be
//! serialized with tick processing; see [`crate::session::SessionService`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Execution state of the hosting application, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycle {
    /// Foregrounded and interactive.
    Active,
    /// Foregrounded but not interactive (screen lock, app switcher).
    Inactive,
    /// Suspended in the background.
    Background,
}

impl AppLifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            AppLifecycle::Active => "active",
            AppLifecycle::Inactive => "inactive",
            AppLifecycle::Background => "background",
        }
    }
}

impl fmt::Display for AppLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifecycle state: {0} (expected active, inactive or background)")]
pub struct ParseLifecycleError(String);

impl FromStr for AppLifecycle {
    type Err = ParseLifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AppLifecycle::Active),
            "inactive" => Ok(AppLifecycle::Inactive),
            "background" => Ok(AppLifecycle::Background),
            other => Err(ParseLifecycleError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_state_names() {
        assert_eq!("active".parse::<AppLifecycle>().unwrap(), AppLifecycle::Active);
        assert_eq!("Inactive".parse::<AppLifecycle>().unwrap(), AppLifecycle::Inactive);
        assert_eq!(
            "BACKGROUND".parse::<AppLifecycle>().unwrap(),
            AppLifecycle::Background
        );
        assert!("suspended".parse::<AppLifecycle>().is_err());
    }

    #[test]
    fn display_matches_serde_form() {
        for state in [
            AppLifecycle::Active,
            AppLifecycle::Inactive,
            AppLifecycle::Background,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }
}
