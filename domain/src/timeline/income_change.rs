//! Income change between the first and last form version

use serde::{Deserialize, Serialize};

/// Change in combined monthly income across a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeChange {
    pub initial: f64,
    #[serde(rename = "final")]
    pub final_income: f64,
    pub net_change: f64,
    /// Percent of the initial income. 0.0 when `baseline_zero` is set.
    pub percent: f64,
    /// The initial income was zero, so `percent` carries no information
    pub baseline_zero: bool,
}

impl IncomeChange {
    pub fn compute(initial: f64, final_income: f64) -> Self {
        let net_change = final_income - initial;
        let baseline_zero = initial == 0.0;
        let percent = if baseline_zero {
            0.0
        } else {
            net_change / initial.abs() * 100.0
        };
        Self {
            initial,
            final_income,
            net_change,
            percent,
            baseline_zero,
        }
    }

    pub fn changed(&self) -> bool {
        self.net_change != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increase_is_exact() {
        let change = IncomeChange::compute(4000.0, 5000.0);
        assert_eq!(change.percent, 25.0);
        assert!(!change.baseline_zero);
        assert!(change.changed());
    }

    #[test]
    fn test_zero_baseline() {
        let change = IncomeChange::compute(0.0, 1000.0);
        assert_eq!(change.percent, 0.0);
        assert!(change.baseline_zero);
        assert_eq!(change.net_change, 1000.0);
    }

    #[test]
    fn test_decrease() {
        let change = IncomeChange::compute(8000.0, 6000.0);
        assert_eq!(change.percent, -25.0);
    }

    #[test]
    fn test_unchanged() {
        assert!(!IncomeChange::compute(5000.0, 5000.0).changed());
    }
}
