use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Results;

/// Default test length for count-down mode.
pub const DEFAULT_TEST_SECS: u32 = 60;

/// How the on-screen timer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Count down from the given number of seconds; reaching zero ends the test.
    CountDown(u32),
    /// Count up from zero; only the text length ends the test.
    CountUp,
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::CountDown(DEFAULT_TEST_SECS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Active,
    Completed,
}

/// Classification of one source character against the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharState {
    Correct,
    Incorrect,
    /// The next character to type.
    Cursor,
    Pending,
}

/// Classify `source[index]` against `input`.
pub fn classify(source: &[char], input: &[char], index: usize) -> CharState {
    if index < input.len() {
        if source.get(index) == Some(&input[index]) {
            CharState::Correct
        } else {
            CharState::Incorrect
        }
    } else if index == input.len() {
        CharState::Cursor
    } else {
        CharState::Pending
    }
}

/// What an input event did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Not accepted in the current phase (or nothing changed).
    Ignored,
    Accepted,
    /// This event finished the test. Reported once per attempt.
    Completed(Results),
}

/// State of a single typing attempt.
#[derive(Debug, Clone)]
pub struct TypingSession {
    source: Vec<char>,
    text_id: Option<String>,
    input: Vec<char>,
    elapsed_secs: u32,
    timer_mode: TimerMode,
    phase: Phase,
    results: Option<Results>,
}

impl TypingSession {
    pub fn new(text: &str, text_id: Option<String>, timer_mode: TimerMode) -> Self {
        Self {
            source: text.chars().collect(),
            text_id,
            input: Vec::new(),
            elapsed_secs: 0,
            timer_mode,
            phase: Phase::Ready,
            results: None,
        }
    }

    // ===== Accessors =====

    pub fn source(&self) -> &[char] {
        &self.source
    }

    pub fn source_text(&self) -> String {
        self.source.iter().collect()
    }

    pub fn text_id(&self) -> Option<&str> {
        self.text_id.as_deref()
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    pub fn timer_mode(&self) -> TimerMode {
        self.timer_mode
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Value to show on the timer: seconds left, or seconds elapsed.
    pub fn timer_display(&self) -> u32 {
        match self.timer_mode {
            TimerMode::CountDown(total) => total.saturating_sub(self.elapsed_secs),
            TimerMode::CountUp => self.elapsed_secs,
        }
    }

    pub fn classify(&self, index: usize) -> CharState {
        classify(&self.source, &self.input, index)
    }

    /// Classification of every source character, in order.
    pub fn classifications(&self) -> Vec<CharState> {
        (0..self.source.len()).map(|i| self.classify(i)).collect()
    }

    /// Index of the next character to type, if any remain.
    pub fn cursor_index(&self) -> Option<usize> {
        (self.input.len() < self.source.len()).then_some(self.input.len())
    }

    // ===== Transitions =====

    /// Append one typed character.
    pub fn type_char(&mut self, c: char) -> InputOutcome {
        if !self.accepts_input() || self.source.is_empty() {
            return InputOutcome::Ignored;
        }
        self.start_if_ready();
        self.input.push(c);
        self.after_edit()
    }

    /// Remove the last typed character.
    pub fn backspace(&mut self) -> InputOutcome {
        if self.phase != Phase::Active || self.input.pop().is_none() {
            return InputOutcome::Ignored;
        }
        InputOutcome::Accepted
    }

    /// Replace the whole input, as a text field reporting its value would.
    /// Input beyond the source length is dropped.
    pub fn set_input(&mut self, value: &str) -> InputOutcome {
        if !self.accepts_input() || self.source.is_empty() {
            return InputOutcome::Ignored;
        }
        let next: Vec<char> = value.chars().take(self.source.len()).collect();
        if next == self.input {
            return InputOutcome::Ignored;
        }
        if self.phase == Phase::Ready && next.is_empty() {
            return InputOutcome::Ignored;
        }
        self.start_if_ready();
        self.input = next;
        self.after_edit()
    }

    /// Finish early. Only meaningful while active.
    pub fn end_test(&mut self) -> InputOutcome {
        if self.phase != Phase::Active {
            return InputOutcome::Ignored;
        }
        InputOutcome::Completed(self.complete())
    }

    /// Advance the timer by one second.
    pub fn tick(&mut self) -> InputOutcome {
        if self.phase != Phase::Active {
            return InputOutcome::Ignored;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        match self.timer_mode {
            TimerMode::CountDown(total) if self.elapsed_secs >= total => {
                InputOutcome::Completed(self.complete())
            }
            _ => InputOutcome::Accepted,
        }
    }

    /// Start over with a new text. Allowed from any phase.
    pub fn reset(&mut self, text: &str, text_id: Option<String>) {
        self.source = text.chars().collect();
        self.text_id = text_id;
        self.input.clear();
        self.elapsed_secs = 0;
        self.phase = Phase::Ready;
        self.results = None;
    }

    /// Change the timer mode for the next attempt; takes effect immediately
    /// only while ready.
    pub fn set_timer_mode(&mut self, mode: TimerMode) {
        self.timer_mode = mode;
        if self.phase == Phase::Ready {
            self.elapsed_secs = 0;
        }
    }

    fn accepts_input(&self) -> bool {
        self.results.is_none()
    }

    fn start_if_ready(&mut self) {
        if self.phase == Phase::Ready {
            debug!(chars = self.source.len(), "Typing test started");
            self.phase = Phase::Active;
        }
    }

    fn after_edit(&mut self) -> InputOutcome {
        if self.input.len() >= self.source.len() {
            InputOutcome::Completed(self.complete())
        } else {
            InputOutcome::Accepted
        }
    }

    fn complete(&mut self) -> Results {
        let results = Results::compute(&self.source, &self.input, self.elapsed_secs);
        debug!(wpm = results.wpm, accuracy = results.accuracy, "Typing test completed");
        self.phase = Phase::Completed;
        self.results = Some(results.clone());
        results
    }
}
