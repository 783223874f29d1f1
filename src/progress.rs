//! Progress calculation and completion detection.
//!
//! Pure functions over the current task states, plus a small edge detector
//! that fires once each time the list goes from incomplete to complete.

use crate::task::Task;

/// Completion percentage, `round(100 * checked / total)`.
///
/// Halves round up. An empty list is 0%.
pub fn percentage(tasks: &[Task]) -> u8 {
    let total = tasks.len();
    if total == 0 {
        return 0;
    }
    let checked = tasks.iter().filter(|t| t.checked).count();
    // Integer form of round-half-up for non-negative values.
    ((200 * checked + total) / (2 * total)) as u8
}

/// Whether every task is checked. An empty list is never complete.
pub fn is_complete(tasks: &[Task]) -> bool {
    !tasks.is_empty() && tasks.iter().all(|t| t.checked)
}

/// Signals when the checklist becomes complete.
#[derive(Debug, Clone, Default)]
pub struct CompletionNotifier {
    was_complete: bool,
}

impl CompletionNotifier {
    /// Start from a known completion state (e.g. the state restored at startup).
    pub fn new(complete: bool) -> Self {
        Self {
            was_complete: complete,
        }
    }

    /// Record the latest completion state.
    ///
    /// Returns true only on an incomplete -> complete transition.
    pub fn observe(&mut self, complete: bool) -> bool {
        let fire = complete && !self.was_complete;
        self.was_complete = complete;
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(states: &[bool]) -> Vec<Task> {
        states
            .iter()
            .enumerate()
            .map(|(i, &checked)| Task {
                id: i.to_string(),
                label: format!("Task {}", i),
                checked,
                completed_at: None,
            })
            .collect()
    }

    #[test]
    fn test_percentage_matches_rounded_ratio() {
        for total in 1..=12usize {
            for checked in 0..=total {
                let states: Vec<bool> = (0..total).map(|i| i < checked).collect();
                let expected = (100.0 * checked as f64 / total as f64).round() as u8;
                assert_eq!(percentage(&tasks(&states)), expected, "{}/{}", checked, total);
            }
        }
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 1/8 = 12.5%, 3/8 = 37.5%
        assert_eq!(percentage(&tasks(&[true, false, false, false, false, false, false, false])), 13);
        assert_eq!(percentage(&tasks(&[true, true, true, false, false, false, false, false])), 38);
    }

    #[test]
    fn test_percentage_is_monotonic() {
        let mut states = vec![false; 7];
        let mut last = percentage(&tasks(&states));
        for i in 0..states.len() {
            states[i] = true;
            let next = percentage(&tasks(&states));
            assert!(next >= last);
            last = next;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_hundred_percent_iff_complete() {
        assert_eq!(percentage(&tasks(&[true, true, true])), 100);
        assert!(is_complete(&tasks(&[true, true, true])));

        for total in 1..=12usize {
            for checked in 0..=total {
                let list = tasks(&(0..total).map(|i| i < checked).collect::<Vec<_>>());
                assert_eq!(percentage(&list) == 100, is_complete(&list));
            }
        }
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(percentage(&[]), 0);
        assert!(!is_complete(&[]));
    }

    #[test]
    fn test_notifier_fires_on_transition_only() {
        let mut notifier = CompletionNotifier::default();
        assert!(!notifier.observe(false));
        assert!(notifier.observe(true));
        assert!(!notifier.observe(true));
        assert!(!notifier.observe(false));
        assert!(notifier.observe(true));
    }

    #[test]
    fn test_notifier_seeded_complete_does_not_fire() {
        let mut notifier = CompletionNotifier::new(true);
        assert!(!notifier.observe(true));
    }
}
