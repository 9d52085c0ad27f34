//! Summary statistics of a power spectrum.

use serde::{Deserialize, Serialize};

use super::welch::PowerSpectrum;

/// Headline numbers for a spectrum, all in dB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Maximum bin power
    pub peak_db: f64,
    /// Median bin power
    pub noise_floor_db: f64,
    /// `peak_db - noise_floor_db`
    pub dynamic_range_db: f64,
}

impl SummaryStats {
    /// Statistics over a slice of dB values, `None` when it is empty.
    pub fn from_db(values: &[f64]) -> Option<Self> {
        let peak_db = values.iter().copied().max_by(f64::total_cmp)?;
        let noise_floor_db = median(values)?;
        Some(Self {
            peak_db,
            noise_floor_db,
            dynamic_range_db: peak_db - noise_floor_db,
        })
    }

    pub fn from_spectrum(spectrum: &PowerSpectrum) -> Option<Self> {
        Self::from_db(&spectrum.power_db)
    }
}

/// Median; even lengths average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_stats() {
        let stats = SummaryStats::from_db(&[-90.0, -80.0, -85.0, -20.0]).unwrap();
        assert_relative_eq!(stats.peak_db, -20.0);
        assert_relative_eq!(stats.noise_floor_db, -82.5);
        assert_relative_eq!(stats.dynamic_range_db, 62.5);
    }

    #[test]
    fn test_flat_spectrum_has_zero_range() {
        let stats = SummaryStats::from_db(&[-100.0; 16]).unwrap();
        assert_relative_eq!(stats.dynamic_range_db, 0.0);
    }

    #[test]
    fn test_serializes_field_names() {
        let stats = SummaryStats::from_db(&[0.0, 10.0]).unwrap();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["peak_db"], 10.0);
        assert_eq!(json["noise_floor_db"], 5.0);
        assert_eq!(json["dynamic_range_db"], 5.0);
    }
}
