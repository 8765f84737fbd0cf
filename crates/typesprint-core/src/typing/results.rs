use serde::{Deserialize, Serialize};

use crate::models::NewResult;

/// Standard word length used for WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Outcome of a completed typing test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub wpm: f64,
    /// Percentage in [0, 100], one decimal place.
    pub accuracy: f64,
    pub correct_chars: usize,
    pub typed_chars: usize,
    pub elapsed_secs: u32,
}

impl Results {
    /// Compute results from the source, the frozen input and elapsed time.
    ///
    /// WPM counts only correctly typed characters. Elapsed time is floored
    /// at one second so an instant finish does not divide by zero.
    pub fn compute(source: &[char], input: &[char], elapsed_secs: u32) -> Self {
        let correct_chars = input
            .iter()
            .zip(source.iter())
            .filter(|(typed, expected)| typed == expected)
            .count();
        let typed_chars = input.len();

        let minutes = f64::from(elapsed_secs.max(1)) / 60.0;
        let wpm = ((correct_chars as f64 / CHARS_PER_WORD) / minutes).round();

        let accuracy = if typed_chars == 0 {
            100.0
        } else {
            let raw = (correct_chars as f64 / typed_chars as f64) * 100.0;
            (raw.clamp(0.0, 100.0) * 10.0).round() / 10.0
        };

        Self {
            wpm,
            accuracy,
            correct_chars,
            typed_chars,
            elapsed_secs,
        }
    }

    pub fn accuracy_display(&self) -> String {
        format!("{:.1}", self.accuracy)
    }

    /// Submission payload for `POST /api/results`.
    pub fn to_submission(&self, text_ref: impl Into<String>) -> NewResult {
        NewResult {
            text_ref: text_ref.into(),
            wpm: self.wpm,
            accuracy: self.accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_accuracy_one_decimal() {
        let results = Results::compute(&chars("cat"), &chars("cax"), 1);
        assert_eq!(results.accuracy, 66.7);
        assert_eq!(results.accuracy_display(), "66.7");
        assert_eq!(results.correct_chars, 2);
        assert_eq!(results.typed_chars, 3);
    }

    #[test]
    fn test_wpm_uses_correct_chars_only() {
        // 50 correct chars in 60s = 10 words per minute
        let source = chars(&"a".repeat(60));
        let mut input = chars(&"a".repeat(50));
        input.extend(chars(&"b".repeat(10)));
        let results = Results::compute(&source, &input, 60);
        assert_eq!(results.wpm, 10.0);
    }

    #[test]
    fn test_zero_elapsed_floors_to_one_second() {
        let results = Results::compute(&chars("hello"), &chars("hello"), 0);
        // 1 word in 1 second
        assert_eq!(results.wpm, 60.0);
        assert_eq!(results.accuracy, 100.0);
    }

    #[test]
    fn test_nothing_typed() {
        let results = Results::compute(&chars("hello"), &[], 12);
        assert_eq!(results.wpm, 0.0);
        assert_eq!(results.accuracy, 100.0);
        assert_eq!(results.accuracy_display(), "100.0");
    }

    #[test]
    fn test_to_submission() {
        let results = Results::compute(&chars("ab"), &chars("ab"), 6);
        let body = results.to_submission("t1");
        assert_eq!(body.text_ref, "t1");
        assert_eq!(body.wpm, results.wpm);
        assert_eq!(body.accuracy, 100.0);
    }
}
