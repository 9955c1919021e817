
use std::ops::AddAssign;

/// Classification counts for one sequence, or a total over several
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SummaryMetrics {
    /// Number of baseline variants matched by the calls
    pub baseline_tp: u64,
    /// Number of baseline variants missing in the calls
    pub baseline_fn: u64,
    /// Number of baseline variants in abandoned regions
    pub baseline_too_complex: u64,
    /// Number of calls variants that match the baseline
    pub calls_tp: u64,
    /// Sum of the calls true positive weights, comparable to `baseline_tp`
    pub calls_tp_weighted: f64,
    /// Number of calls variants that are not in the baseline
    pub calls_fp: u64,
    /// Number of calls variants in abandoned regions
    pub calls_too_complex: u64
}

impl AddAssign for SummaryMetrics {
    // Enables += with stats
    fn add_assign(&mut self, rhs: Self) {
        self.baseline_tp += rhs.baseline_tp;
        self.baseline_fn += rhs.baseline_fn;
        self.baseline_too_complex += rhs.baseline_too_complex;
        self.calls_tp += rhs.calls_tp;
        self.calls_tp_weighted += rhs.calls_tp_weighted;
        self.calls_fp += rhs.calls_fp;
        self.calls_too_complex += rhs.calls_too_complex;
    }
}

impl SummaryMetrics {
    /// Constructor for the unweighted counts; the weighted count defaults to the calls TP count
    pub fn new(baseline_tp: u64, baseline_fn: u64, calls_tp: u64, calls_fp: u64) -> Self {
        Self {
            baseline_tp, baseline_fn,
            calls_tp, calls_tp_weighted: calls_tp as f64, calls_fp,
            ..Default::default()
        }
    }

    /// Calculates recall if it can, which is relative to the baseline
    pub fn recall(&self) -> Option<f64> {
        let denom = self.baseline_tp + self.baseline_fn;
        if denom > 0 {
            Some(self.baseline_tp as f64 / denom as f64)
        } else {
            None
        }
    }

    /// Calculates precision if it can, which is relative to the calls.
    /// The weighted TP count is used so that one baseline variant split over several calls counts once.
    pub fn precision(&self) -> Option<f64> {
        let denom = self.calls_tp_weighted + self.calls_fp as f64;
        if denom > 0.0 {
            Some(self.calls_tp_weighted / denom)
        } else {
            None
        }
    }

    /// Calculates F1 score if possible
    pub fn f1(&self) -> Option<f64> {
        match (self.recall(), self.precision()) {
            (Some(recall), Some(precision)) if recall + precision > 0.0 => {
                Some(2.0 * recall * precision / (recall + precision))
            },
            (Some(_), Some(_)) => Some(0.0),
            _ => None
        }
    }
}
