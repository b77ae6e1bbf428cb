//! Self-help exercise hints.
//!
//! A settled assistant reply that talks about, say, anxiety or breathing
//! gets a matching exercise offered next to it. Matching is a plain
//! case-insensitive keyword search over Chinese and English terms.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{BubbleRole, ChatBubble};

/// Exercises the mentor can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Breathing,
    Reframe,
    Grounding,
    Mindfulness,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::Breathing,
        ExerciseKind::Reframe,
        ExerciseKind::Grounding,
        ExerciseKind::Mindfulness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExerciseKind::Breathing => "呼吸练习",
            ExerciseKind::Reframe => "认知重构",
            ExerciseKind::Grounding => "5-4-3-2-1锚定练习",
            ExerciseKind::Mindfulness => "正念冥想",
        }
    }

    fn keywords(&self) -> &'static Regex {
        match self {
            ExerciseKind::Breathing => &BREATHING,
            ExerciseKind::Reframe => &REFRAME,
            ExerciseKind::Grounding => &GROUNDING,
            ExerciseKind::Mindfulness => &MINDFULNESS,
        }
    }
}

static BREATHING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)呼吸|焦虑|紧张|压力|放松|冷静|深呼吸|breathing|anxiety|stress|relax|calm")
        .expect("Invalid breathing keyword pattern")
});

static REFRAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)想法|思维|认知|重构|负面|消极|思考|perspective|thought|cognitive|reframe|negative",
    )
    .expect("Invalid reframe keyword pattern")
});

static GROUNDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)感官|当下|专注|注意力|锚定|grounding|present|focus|attention|mindful")
        .expect("Invalid grounding keyword pattern")
});

static MINDFULNESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)正念|冥想|觉察|当下|专注呼吸|mindfulness|meditation")
        .expect("Invalid mindfulness keyword pattern")
});

/// Whether `content` mentions anything related to `kind`.
pub fn should_suggest(content: &str, kind: ExerciseKind) -> bool {
    kind.keywords().is_match(content)
}

/// Exercises to offer next to `bubble`.
///
/// Only settled assistant replies get suggestions; a reply still streaming
/// would make the buttons flicker in and out.
pub fn suggestions(bubble: &ChatBubble) -> Vec<ExerciseKind> {
    if bubble.role != BubbleRole::Assistant || bubble.streaming || bubble.is_greeting() {
        return Vec::new();
    }

    ExerciseKind::ALL
        .into_iter()
        .filter(|kind| should_suggest(&bubble.content, *kind))
        .collect()
}
