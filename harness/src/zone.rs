use core::fmt::{self, Display};

/// Budgets below this share of the baseline are in the danger zone.
pub const DANGER_BELOW_PERCENT: f64 = 33.0;
/// Budgets below this share of the baseline (and not in danger) are in the
/// warning zone.
pub const WARNING_BELOW_PERCENT: f64 = 66.0;

/// Remaining noise budget relative to the scenario baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Zone {
    Safe,
    Warning,
    Danger,
}

impl Zone {
    pub fn classify(current_budget: u32, baseline_budget: u32) -> Self {
        let percentage = budget_percentage(current_budget, baseline_budget);
        if percentage < DANGER_BELOW_PERCENT {
            Self::Danger
        } else if percentage < WARNING_BELOW_PERCENT {
            Self::Warning
        } else {
            Self::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
        }
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `100 * current / baseline`, or `0` for an empty baseline.
pub fn budget_percentage(current_budget: u32, baseline_budget: u32) -> f64 {
    if baseline_budget == 0 {
        0.0
    } else {
        100.0 * current_budget as f64 / baseline_budget as f64
    }
}
