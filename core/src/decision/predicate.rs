use crate::history::HistoryWindow;
use crate::prelude::{AnalysisResult, Posture};

/// Panting below this while lying down counts as calm.
pub const CALM_PANTING_LIMIT: f32 = 0.5;

/// A sample is concerning unless the dog is lying down and (probably) not panting.
/// Only meaningful for samples with a dog present.
pub fn is_concerning(result: &AnalysisResult) -> bool {
    !(result.posture() == Posture::LyingDown
        && result.panting_probability() < CALM_PANTING_LIMIT)
}

/// True only when the window is full and every sample shows a dog behaving
/// in a concerning way. Any absent or calm sample vetoes the alert.
pub fn should_alert(window: &HistoryWindow) -> bool {
    if !window.is_full() {
        return false;
    }

    for result in window.iter() {
        if !result.is_dog_present() {
            return false;
        }
        if !is_concerning(result) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 5;

    fn sample(posture: Posture, panting: f32) -> AnalysisResult {
        AnalysisResult::new(true, posture, panting).unwrap()
    }

    fn window_of(entries: &[AnalysisResult]) -> HistoryWindow {
        let mut window = HistoryWindow::with_capacity(N);
        for entry in entries {
            window.push(*entry);
        }
        window
    }

    #[test]
    fn partial_window_never_alerts() {
        let window = window_of(&[sample(Posture::Standing, 0.8); N - 1]);
        assert!(!should_alert(&window));
    }

    #[test]
    fn standing_for_whole_window_alerts() {
        let window = window_of(&[sample(Posture::Standing, 0.8); N]);
        assert!(should_alert(&window));
    }

    #[test]
    fn sitting_for_whole_window_alerts() {
        let window = window_of(&[sample(Posture::Sitting, 0.3); N]);
        assert!(should_alert(&window));
    }

    #[test]
    fn lying_down_calm_does_not_alert() {
        let window = window_of(&[sample(Posture::LyingDown, 0.2); N]);
        assert!(!should_alert(&window));
    }

    #[test]
    fn lying_down_panting_alerts() {
        let window = window_of(&[sample(Posture::LyingDown, 0.8); N]);
        assert!(should_alert(&window));
    }

    #[test]
    fn no_dog_does_not_alert() {
        let window = window_of(&[AnalysisResult::absent(); N]);
        assert!(!should_alert(&window));
    }

    #[test]
    fn single_absent_sample_vetoes() {
        let mut entries = vec![sample(Posture::Standing, 0.9); N - 1];
        entries.insert(2, AnalysisResult::absent());
        assert!(!should_alert(&window_of(&entries)));
    }

    #[test]
    fn single_calm_sample_vetoes() {
        let mut entries = vec![sample(Posture::Standing, 0.7); N - 1];
        entries.push(sample(Posture::LyingDown, 0.1));
        assert!(!should_alert(&window_of(&entries)));
    }

    #[test]
    fn half_panting_is_not_calm() {
        let mut entries = vec![sample(Posture::Standing, 0.7); N - 1];
        entries.push(sample(Posture::LyingDown, 0.5));
        assert!(should_alert(&window_of(&entries)));
    }

    #[test]
    fn present_dog_without_posture_counts_as_concerning() {
        let window = window_of(&[sample(Posture::None, 0.0); N]);
        assert!(should_alert(&window));
    }
}
