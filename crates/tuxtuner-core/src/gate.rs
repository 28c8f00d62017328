//! Allowlist checks for everything that may cross into a privileged call.
//!
//! Every value handed to the dispatcher is one of the types below, and those
//! types can only be built by the `validate_*` functions in this module.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_REFRESH_HZ: i64 = 30;
pub const MAX_REFRESH_HZ: i64 = 500;

const MONITOR_NAME_PATTERN: &str = r"^[A-Za-z0-9_-]+$";
const SESSION_ID_PATTERN: &str = r"^[0-9]+$";

static MONITOR_NAME_RE: OnceLock<Option<Regex>> = OnceLock::new();
static SESSION_ID_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Fails closed: a pattern that does not compile matches nothing.
fn full_match(cell: &'static OnceLock<Option<Regex>>, pattern: &str, raw: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(raw))
}

/// Why a proposed privileged action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Invalid GPU mode: {0}")]
    InvalidGpuMode(String),
    #[error("Invalid session id; refusing to switch graphics mode")]
    InvalidSessionId,
    #[error("Invalid monitor name")]
    InvalidMonitorName,
    #[error("Invalid refresh rate format")]
    InvalidRateFormat,
    #[error("Refresh rate {0}Hz is out of the valid range ({MIN_REFRESH_HZ}-{MAX_REFRESH_HZ}Hz)")]
    RateOutOfRange(i64),
    #[error("Core target {target} is out of the valid range (1-{max})")]
    CoreTargetOutOfRange { target: i64, max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuMode {
    Integrated,
    Hybrid,
    Dedicated,
    Compute,
    #[serde(rename = "VFIO")]
    Vfio,
}

impl GpuMode {
    pub const ALL: [GpuMode; 5] = [
        GpuMode::Integrated,
        GpuMode::Hybrid,
        GpuMode::Dedicated,
        GpuMode::Compute,
        GpuMode::Vfio,
    ];

    /// Exact token understood by the helper and by `supergfxctl`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Integrated => "Integrated",
            Self::Hybrid => "Hybrid",
            Self::Dedicated => "Dedicated",
            Self::Compute => "Compute",
            Self::Vfio => "VFIO",
        }
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A numeric login session id, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(Option<String>);

impl SessionId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_omitted(&self) -> bool {
        self.0.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorName(String);

impl MonitorName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRate(u32);

impl RefreshRate {
    pub fn hz(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreTarget(u32);

impl CoreTarget {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Case-sensitive, untrimmed match against the five helper modes.
pub fn validate_gpu_mode(raw: &str) -> Result<GpuMode, Rejection> {
    GpuMode::ALL
        .into_iter()
        .find(|mode| mode.label() == raw)
        .ok_or_else(|| Rejection::InvalidGpuMode(raw.to_string()))
}

/// Empty input means "omit the logout argument"; anything else must be ASCII digits.
pub fn validate_session_id(raw: &str) -> Result<SessionId, Rejection> {
    if raw.is_empty() {
        return Ok(SessionId(None));
    }
    if full_match(&SESSION_ID_RE, SESSION_ID_PATTERN, raw) {
        Ok(SessionId(Some(raw.to_string())))
    } else {
        Err(Rejection::InvalidSessionId)
    }
}

pub fn validate_monitor_name(raw: &str) -> Result<MonitorName, Rejection> {
    if full_match(&MONITOR_NAME_RE, MONITOR_NAME_PATTERN, raw) {
        Ok(MonitorName(raw.to_string()))
    } else {
        Err(Rejection::InvalidMonitorName)
    }
}

pub fn validate_refresh_rate(raw: &str) -> Result<RefreshRate, Rejection> {
    let hz: i64 = raw.parse().map_err(|_| Rejection::InvalidRateFormat)?;
    validate_refresh_hz(hz)
}

pub fn validate_refresh_hz(hz: i64) -> Result<RefreshRate, Rejection> {
    if (MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(&hz) {
        // In range, so the narrowing cannot truncate.
        Ok(RefreshRate(hz as u32))
    } else {
        Err(Rejection::RateOutOfRange(hz))
    }
}

pub fn validate_core_target(raw: i64, max_cores: u32) -> Result<CoreTarget, Rejection> {
    if raw >= 1 && raw <= i64::from(max_cores) {
        Ok(CoreTarget(raw as u32))
    } else {
        Err(Rejection::CoreTargetOutOfRange {
            target: raw,
            max: max_cores,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn gpu_mode_accepts_exactly_the_allowlist() {
        for mode in GpuMode::ALL {
            assert_eq!(validate_gpu_mode(mode.label()), Ok(mode));
        }
        for raw in [
            "integrated",
            "HYBRID",
            " Hybrid",
            "Hybrid\n",
            "Vfio",
            "AsusMuxDgpu",
            "",
            "Hybrid --logout 1",
        ] {
            assert_eq!(
                validate_gpu_mode(raw),
                Err(Rejection::InvalidGpuMode(raw.to_string())),
                "{raw:?} must be rejected"
            );
        }
    }

    #[test]
    fn session_id_is_digits_or_empty() {
        assert_eq!(validate_session_id("1234").unwrap().as_deref(), Some("1234"));
        assert!(validate_session_id("").unwrap().is_omitted());
        for raw in ["12a4", "-1", "+1", " 12", "12 ", "12\n", "١٢", "c2"] {
            assert_eq!(validate_session_id(raw), Err(Rejection::InvalidSessionId), "{raw:?}");
        }
    }

    #[test]
    fn monitor_name_rejects_shell_metacharacters() {
        assert_eq!(validate_monitor_name("DP-1").unwrap().as_str(), "DP-1");
        assert!(validate_monitor_name("eDP_1").is_ok());
        for raw in ["eth0;rm -rf", "", "DP 1", "DP-1,", "HDMI-A-1\n", "$(id)", "DP-1@60"] {
            assert_eq!(validate_monitor_name(raw), Err(Rejection::InvalidMonitorName), "{raw:?}");
        }
    }

    #[test]
    fn refresh_rate_bounds_are_inclusive() {
        assert_eq!(validate_refresh_hz(30).map(RefreshRate::hz), Ok(30));
        assert_eq!(validate_refresh_hz(500).map(RefreshRate::hz), Ok(500));
        assert_eq!(validate_refresh_hz(29), Err(Rejection::RateOutOfRange(29)));
        assert_eq!(validate_refresh_hz(501), Err(Rejection::RateOutOfRange(501)));
        assert_eq!(validate_refresh_hz(-60), Err(Rejection::RateOutOfRange(-60)));
    }

    #[test]
    fn refresh_rate_format_and_range_are_distinct_rejections() {
        assert_eq!(validate_refresh_rate("165").map(RefreshRate::hz), Ok(165));
        assert_eq!(validate_refresh_rate("165Hz"), Err(Rejection::InvalidRateFormat));
        assert_eq!(validate_refresh_rate("59.94"), Err(Rejection::InvalidRateFormat));
        assert_eq!(validate_refresh_rate(""), Err(Rejection::InvalidRateFormat));
        assert_eq!(validate_refresh_rate("1000"), Err(Rejection::RateOutOfRange(1000)));
        assert_ne!(
            Rejection::InvalidRateFormat.to_string(),
            Rejection::RateOutOfRange(1000).to_string()
        );
    }

    #[test]
    fn core_target_must_fit_observed_cores() {
        assert_eq!(validate_core_target(1, 16).map(CoreTarget::get), Ok(1));
        assert_eq!(validate_core_target(16, 16).map(CoreTarget::get), Ok(16));
        assert_eq!(
            validate_core_target(20, 16),
            Err(Rejection::CoreTargetOutOfRange { target: 20, max: 16 })
        );
        assert!(validate_core_target(0, 16).is_err());
        assert!(validate_core_target(-3, 16).is_err());
        assert!(validate_core_target(1, 0).is_err());
    }
}
