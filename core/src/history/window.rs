use crate::prelude::AnalysisResult;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent analysis samples, oldest first.
pub struct HistoryWindow {
    entries: VecDeque<AnalysisResult>,
    capacity: usize,
}

impl HistoryWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Appends the newest sample, evicting from the front once over capacity.
    pub fn push(&mut self, result: AnalysisResult) {
        self.entries.push_back(result);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &AnalysisResult> {
        self.entries.iter()
    }

    /// Copy of the current contents in order.
    pub fn snapshot(&self) -> Vec<AnalysisResult> {
        self.entries.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Posture;

    fn standing(panting: f32) -> AnalysisResult {
        AnalysisResult::new(true, Posture::Standing, panting).unwrap()
    }

    #[test]
    fn window_fills_to_capacity() {
        let mut window = HistoryWindow::with_capacity(3);
        assert!(window.is_empty());

        window.push(standing(0.1));
        window.push(standing(0.2));
        assert!(!window.is_full());

        window.push(standing(0.3));
        assert!(window.is_full());
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn overflow_drops_exactly_the_oldest_entry() {
        let mut window = HistoryWindow::with_capacity(3);
        for panting in [0.1, 0.2, 0.3, 0.4] {
            window.push(standing(panting));
        }

        assert_eq!(window.len(), 3);
        let pantings: Vec<f32> = window
            .snapshot()
            .iter()
            .map(|r| r.panting_probability())
            .collect();
        assert_eq!(pantings, vec![0.2, 0.3, 0.4]);
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut window = HistoryWindow::with_capacity(usize::MAX);
        window.push(standing(0.7));
        assert_eq!(window.capacity(), usize::MAX);
        assert_eq!(window.len(), 1);
        assert!(!window.is_full());
    }

    #[test]
    fn zero_capacity_is_normalized() {
        let mut window = HistoryWindow::with_capacity(0);
        window.push(standing(0.5));
        window.push(standing(0.6));
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.len(), 1);
    }
}
