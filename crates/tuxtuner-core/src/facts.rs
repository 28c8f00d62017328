//! Read-only host facts as reported by the probes.
//!
//! Everything in here is untrusted display data. Nothing from this module is
//! passed to a privileged call without going through [`crate::gate`].

use serde::{Deserialize, Serialize};

pub const NATIVE_SUFFIX: &str = " (Native)";

/// Two advertised rates closer than this are the same entry.
const RATE_DEDUP_EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreTopology {
    pub total: u32,
    pub online: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuFacts {
    pub supported: Vec<String>,
    pub current: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateOption {
    pub hz: u32,
    pub native: bool,
}

impl RateOption {
    pub fn label(self) -> String {
        if self.native {
            format!("{}Hz{NATIVE_SUFFIX}", self.hz)
        } else {
            format!("{}Hz", self.hz)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayFacts {
    pub monitor: String,
    pub current_hz: Option<u32>,
    pub options: Vec<RateOption>,
}

impl DisplayFacts {
    /// Builds the facts for one monitor from its advertised `WxH@R.RRHz` modes.
    pub fn from_modes<S: AsRef<str>>(monitor: String, current_rate: f64, modes: &[S]) -> Self {
        let current_hz = if current_rate.is_finite() && current_rate >= 1.0 {
            Some(current_rate as u32)
        } else {
            None
        };
        Self {
            monitor,
            current_hz,
            options: derive_rate_options(modes),
        }
    }
}

/// Outcome of one full probe pass. Each source fails independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub cpu: Result<CoreTopology, String>,
    pub gpu: Result<GpuFacts, String>,
    pub display: Result<DisplayFacts, String>,
}

pub fn parse_mode_hz(mode: &str) -> Option<f64> {
    let (_, rate) = mode.split_once('@')?;
    let rate = rate.trim().trim_end_matches("Hz");
    rate.parse::<f64>().ok().filter(|hz| hz.is_finite() && *hz > 0.0)
}

pub fn derive_rate_options<S: AsRef<str>>(modes: &[S]) -> Vec<RateOption> {
    let mut hz_values: Vec<f64> = Vec::new();
    for mode in modes {
        if let Some(hz) = parse_mode_hz(mode.as_ref()) {
            if !hz_values
                .iter()
                .any(|seen| (seen - hz).abs() < RATE_DEDUP_EPSILON)
            {
                hz_values.push(hz);
            }
        }
    }
    hz_values.sort_by(f64::total_cmp);

    let native = hz_values.last().map(|hz| *hz as u32);
    let mut options: Vec<RateOption> = Vec::with_capacity(hz_values.len());
    for hz in hz_values {
        let hz = hz as u32;
        // 59.94 and 60.4 both truncate to 60 but are further apart than the epsilon.
        if options.last().is_some_and(|prev| prev.hz == hz) {
            continue;
        }
        options.push(RateOption {
            hz,
            native: Some(hz) == native,
        });
    }
    options
}

/// Turns a list label such as `165Hz (Native)` back into the digits the gate parses.
pub fn strip_rate_label(label: &str) -> &str {
    let label = label.strip_suffix(NATIVE_SUFFIX).unwrap_or(label);
    label.strip_suffix("Hz").unwrap_or(label)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn native_rate_is_the_maximum_offered() {
        let facts = DisplayFacts::from_modes(
            "DP-1".to_string(),
            60.0,
            &["1920x1200@60.00Hz", "1920x1200@165.01Hz"],
        );
        let labels: Vec<String> = facts.options.iter().map(|opt| opt.label()).collect();
        assert_eq!(labels, vec!["60Hz", "165Hz (Native)"]);
        assert_eq!(facts.current_hz, Some(60));
    }

    #[test]
    fn near_duplicate_rates_collapse_and_sort() {
        let options = derive_rate_options(&[
            "2560x1600@165.00Hz",
            "1920x1080@59.95Hz",
            "2560x1600@60.00Hz",
            "1920x1080@165.02Hz",
            "1280x720@120.00Hz",
            "garbage",
            "800x600@",
        ]);
        let hz: Vec<u32> = options.iter().map(|opt| opt.hz).collect();
        assert_eq!(hz, vec![59, 120, 165]);
        assert!(options[2].native);
        assert!(!options[0].native);
    }

    #[test]
    fn empty_mode_list_has_no_native() {
        let facts = DisplayFacts::from_modes::<&str>("eDP-1".to_string(), 0.0, &[]);
        assert!(facts.options.is_empty());
        assert_eq!(facts.current_hz, None);
    }

    #[test]
    fn strip_rate_label_recovers_digits() {
        assert_eq!(strip_rate_label("165Hz (Native)"), "165");
        assert_eq!(strip_rate_label("60Hz"), "60");
        assert_eq!(strip_rate_label("sixty"), "sixty");
    }
}
