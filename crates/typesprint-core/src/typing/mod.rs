//! Typing-test engine.
//!
//! A `TypingSession` tracks one attempt: the source text, what has been
//! typed so far, the timer, and the results once the attempt is over.
//! It is driven entirely by discrete events (keystrokes, backspace, ticks,
//! end/reset requests) and performs no I/O.
//!
//! Phases: `Ready` → `Active` on the first keystroke → `Completed` when the
//! input reaches the source length, the count-down expires, or the test is
//! ended early. `reset` returns to `Ready` from anywhere.

pub mod results;
pub mod session;

pub use results::{Results, CHARS_PER_WORD};
pub use session::{
    classify, CharState, InputOutcome, Phase, TimerMode, TypingSession, DEFAULT_TEST_SECS,
};
