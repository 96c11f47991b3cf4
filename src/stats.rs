use crate::solve::{format_time, SolveRecord};
use itertools::Itertools;

/// Windows shown on the timer screen
pub const AVERAGE_WINDOWS: [usize; 2] = [5, 12];

/// Trimmed average of the `n` most recent solves, in milliseconds.
///
/// `history` is newest-first. Returns `None` until at least `n` solves exist.
/// For `n >= 5` exactly one best and one worst time are dropped before the
/// mean is taken.
pub fn average_of(history: &[SolveRecord], n: usize) -> Option<u64> {
    if n == 0 || history.len() < n {
        return None;
    }

    let sorted = history[..n]
        .iter()
        .map(|r| r.elapsed_millis as f64)
        .sorted_by(|a, b| a.total_cmp(b))
        .collect::<Vec<f64>>();

    let counted = if n >= 5 {
        &sorted[1..n - 1]
    } else {
        &sorted[..]
    };

    mean(counted).map(|m| m.round() as u64)
}

/// Formatted `average_of`, `None` when not yet available
pub fn display_average(history: &[SolveRecord], n: usize) -> Option<String> {
    average_of(history, n).map(format_time)
}

/// Fastest record in `history`
pub fn best_of(history: &[SolveRecord]) -> Option<&SolveRecord> {
    history.iter().min_by_key(|r| r.elapsed_millis)
}

/// Arithmetic mean of solve times, `None` when there are none
pub fn mean(times: &[f64]) -> Option<f64> {
    if times.is_empty() {
        return None;
    }
    Some(times.iter().sum::<f64>() / times.len() as f64)
}

/// Population standard deviation of solve times
pub fn std_dev(times: &[f64]) -> Option<f64> {
    let avg = mean(times)?;
    let variance = times.iter().map(|t| (t - avg).powi(2)).sum::<f64>() / times.len() as f64;
    Some(variance.sqrt())
}

/// Statistics for the active puzzle's visible history
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub best: Option<u64>,
    pub ao5: Option<u64>,
    pub ao12: Option<u64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Summary {
    /// `best` is passed in because the persisted best can outlive the capped history
    pub fn from_history(history: &[SolveRecord], best: Option<&SolveRecord>) -> Self {
        let times = history
            .iter()
            .map(|r| r.elapsed_millis as f64)
            .collect::<Vec<f64>>();

        Self {
            count: history.len(),
            best: best.map(|r| r.elapsed_millis),
            ao5: average_of(history, 5),
            ao12: average_of(history, 12),
            mean: mean(&times),
            std_dev: std_dev(&times),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleVariant;
    use crate::solve::SolveId;
    use chrono::Local;

    /// Build a newest-first history from times given oldest-first
    fn history(times_oldest_first: &[u64]) -> Vec<SolveRecord> {
        times_oldest_first
            .iter()
            .enumerate()
            .map(|(i, &ms)| {
                SolveRecord::new(
                    SolveId(i as i64),
                    ms,
                    String::new(),
                    PuzzleVariant::ThreeByThree,
                    Local::now(),
                )
            })
            .rev()
            .collect()
    }

    #[test]
    fn test_ao5_scenario() {
        let h = history(&[1000, 2000, 3000, 4000, 5000]);
        assert_eq!(average_of(&h, 5), Some(3000));
        assert_eq!(display_average(&h, 5).as_deref(), Some("3.000s"));
    }

    #[test]
    fn test_ao5_unavailable_below_five() {
        let h = history(&[1000, 2000, 3000, 4000]);
        assert_eq!(average_of(&h, 5), None);
        assert_eq!(display_average(&h, 5), None);
    }

    #[test]
    fn test_ao5_uses_most_recent_five() {
        // the 60s solve is oldest and falls outside the window
        let h = history(&[60_000, 9_000, 10_000, 11_000, 12_000, 13_000]);
        assert_eq!(average_of(&h, 5), Some(11_000));
    }

    #[test]
    fn test_ao5_trims_one_from_each_end_only() {
        let h = history(&[1000, 1000, 5000, 9000, 9000]);
        // sorted: 1000 1000 5000 9000 9000 -> 1000 5000 9000
        assert_eq!(average_of(&h, 5), Some(5000));
    }

    #[test]
    fn test_ao12() {
        let times: Vec<u64> = (1..=12).map(|s| s * 1000).collect();
        let h = history(&times);
        // drop 1000 and 12000, mean of 2000..=11000
        assert_eq!(average_of(&h, 12), Some(6500));
        assert_eq!(average_of(&h[..11], 12), None);
    }

    #[test]
    fn test_average_rounds_to_nearest_ms() {
        let h = history(&[1000, 1001, 1001, 1002, 2000]);
        // middle three: 1001 1001 1002 -> 1001.33
        assert_eq!(average_of(&h, 5), Some(1001));
    }

    #[test]
    fn test_small_window_is_untrimmed() {
        let h = history(&[1000, 2000, 6000]);
        assert_eq!(average_of(&h, 3), Some(3000));
        assert_eq!(average_of(&h, 0), None);
    }

    #[test]
    fn test_best_of() {
        let h = history(&[4000, 2500, 3000]);
        assert_eq!(best_of(&h).map(|r| r.elapsed_millis), Some(2500));
        assert!(best_of(&[]).is_none());
    }

    #[test]
    fn test_mean_of_solve_times() {
        assert_eq!(mean(&[9_000., 11_000., 10_000.]), Some(10_000.0));
        assert_eq!(mean(&[7_005.]), Some(7_005.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev_of_solve_times() {
        assert_eq!(std_dev(&[8_000., 12_000.]), Some(2_000.0));
        assert_eq!(std_dev(&[10_500., 10_500., 10_500.]), Some(0.0));
        let spread = std_dev(&[7_000., 9_000., 11_000.]).unwrap();
        assert!((spread - 1_632.993).abs() < 0.001);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_summary() {
        let h = history(&[1000, 2000, 3000, 4000, 5000]);
        let summary = Summary::from_history(&h, best_of(&h));
        assert_eq!(summary.count, 5);
        assert_eq!(summary.best, Some(1000));
        assert_eq!(summary.ao5, Some(3000));
        assert_eq!(summary.ao12, None);
        assert_eq!(summary.mean, Some(3000.0));
    }
}
