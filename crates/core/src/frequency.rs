use serde::{Deserialize, Serialize};
use std::fmt;

/// Cadence of a recurring charge, ordered shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// Inclusive median-gap windows, in days. A median outside every window is
/// not a recognized cadence.
const GAP_WINDOWS: &[(Frequency, f64, f64)] = &[
    (Frequency::Weekly, 5.0, 9.0),
    (Frequency::Monthly, 25.0, 35.0),
    (Frequency::Quarterly, 80.0, 100.0),
    (Frequency::Yearly, 350.0, 380.0),
];

impl Frequency {
    pub fn classify(median_gap_days: f64) -> Option<Self> {
        GAP_WINDOWS
            .iter()
            .find(|(_, lo, hi)| median_gap_days >= *lo && median_gap_days <= *hi)
            .map(|(freq, _, _)| *freq)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Quarterly => write!(f, "quarterly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_window_bounds() {
        assert_eq!(Frequency::classify(5.0), Some(Frequency::Weekly));
        assert_eq!(Frequency::classify(9.0), Some(Frequency::Weekly));
        assert_eq!(Frequency::classify(30.5), Some(Frequency::Monthly));
        assert_eq!(Frequency::classify(90.0), Some(Frequency::Quarterly));
        assert_eq!(Frequency::classify(365.0), Some(Frequency::Yearly));
    }

    #[test]
    fn classify_rejects_between_windows() {
        assert_eq!(Frequency::classify(4.9), None);
        assert_eq!(Frequency::classify(15.0), None);
        assert_eq!(Frequency::classify(60.0), None);
        assert_eq!(Frequency::classify(200.0), None);
        assert_eq!(Frequency::classify(400.0), None);
    }

    #[test]
    fn ordering_is_shortest_first() {
        let mut freqs = vec![Frequency::Yearly, Frequency::Weekly, Frequency::Quarterly];
        freqs.sort();
        assert_eq!(
            freqs,
            vec![Frequency::Weekly, Frequency::Quarterly, Frequency::Yearly]
        );
    }
}
