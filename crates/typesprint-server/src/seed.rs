//! Passages loaded into an empty texts collection on first start.

use chrono::Utc;
use uuid::Uuid;

use typesprint_core::models::Text;

const PASSAGES: &[(&str, &str)] = &[
    (
        "Quick Brown Fox",
        "The quick brown fox jumps over the lazy dog while the sleepy cat watches from the warm windowsill.",
    ),
    (
        "Lighthouse",
        "Every night the old lighthouse keeper climbed the spiral stairs to light the lamp that guided ships safely past the rocks.",
    ),
    (
        "Garden",
        "A small garden can teach patience, since nothing grows faster because you stare at it, no matter how hard you try.",
    ),
    (
        "Rivers",
        "Rivers carve valleys over thousands of years, carrying sand and stone from the mountains all the way down to the sea.",
    ),
    (
        "Practice",
        "Typing quickly is less about moving your fingers fast and more about making fewer mistakes, one steady keystroke at a time.",
    ),
];

pub fn default_texts() -> Vec<Text> {
    let now = Utc::now();
    PASSAGES
        .iter()
        .map(|(title, content)| Text {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
        })
        .collect()
}
