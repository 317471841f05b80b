//! Heuristic solution segmenter.
//!
//! DESIGN
//! ======
//! Provider text is split into non-blank lines ("paragraphs") and folded
//! left to right over a [`SegmentState`]. Each paragraph is classified by
//! the first rule that matches:
//!
//! 1. final-answer marker → replaces the final answer (last one wins)
//! 2. step marker → appended to the current step run
//! 3. position → introduction (first third), summary (past 70% and no final
//!    answer seen yet), explanation otherwise
//!
//! Positional thresholds use integer arithmetic (`3i < n`, `2i > n`,
//! `10i > 7n`) so classification is exact and deterministic.
//!
//! The output is best-effort. Every paragraph except superseded final
//! answers lands in exactly one bucket with its relative order preserved.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static STEP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(step\s*\d+|\d+\.|\bfirst\b|\bnext\b|\bthen\b)").expect("static regex")
});

static ANSWER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.*?answer[^:]*:\s*").expect("static regex"));

static MATH_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\d+\-*/^()\s=]+|[a-zA-Z]\s*=\s*[\d+\-*/^()\s]+").expect("static regex")
});

const FINAL_ANSWER_PHRASES: [&str; 4] = ["final answer", "the answer is", "therefore", "result is"];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalAnswer {
    pub text: String,
    /// First math-looking fragment of `text`, if any.
    pub math: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedSolution {
    pub introduction: Vec<String>,
    /// Step runs. Non-step paragraphs between steps close a run.
    pub steps: Vec<Vec<String>>,
    pub explanation: Vec<String>,
    pub final_answer: Option<FinalAnswer>,
    pub summary: Vec<String>,
}

impl SegmentedSolution {
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.introduction.is_empty()
            && self.steps.is_empty()
            && self.explanation.is_empty()
            && self.final_answer.is_none()
            && self.summary.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    FinalAnswer,
    Step,
    Introduction,
    Summary,
    Explanation,
}

#[derive(Default)]
struct SegmentState {
    solution: SegmentedSolution,
    in_step_run: bool,
}

// =============================================================================
// SEGMENTATION
// =============================================================================

/// Segment raw provider text. Total: never fails, empty input gives an
/// empty solution.
#[must_use]
pub fn segment(raw: &str) -> SegmentedSolution {
    let paragraphs: Vec<&str> = raw.split('\n').filter(|p| !p.trim().is_empty()).collect();
    let n = paragraphs.len();

    paragraphs
        .iter()
        .enumerate()
        .fold(SegmentState::default(), |mut state, (i, paragraph)| {
            let zone = classify(paragraph, i, n, state.solution.final_answer.is_some());
            apply(&mut state, zone, paragraph);
            state
        })
        .solution
}

fn classify(paragraph: &str, i: usize, n: usize, has_final_answer: bool) -> Zone {
    let lower = paragraph.trim().to_lowercase();

    let marked_final = FINAL_ANSWER_PHRASES.iter().any(|phrase| lower.contains(phrase))
        || (lower.contains("answer:") && i * 2 > n);
    if marked_final {
        return Zone::FinalAnswer;
    }
    if STEP_MARKER.is_match(&lower) {
        return Zone::Step;
    }
    if i * 3 < n {
        Zone::Introduction
    } else if !has_final_answer && i * 10 > n * 7 {
        Zone::Summary
    } else {
        Zone::Explanation
    }
}

fn apply(state: &mut SegmentState, zone: Zone, paragraph: &str) {
    let text = paragraph.trim().to_owned();
    let solution = &mut state.solution;

    match zone {
        Zone::FinalAnswer => solution.final_answer = Some(final_answer(&text)),
        Zone::Step => match solution.steps.last_mut() {
            Some(run) if state.in_step_run => run.push(text),
            _ => solution.steps.push(vec![text]),
        },
        Zone::Introduction => solution.introduction.push(text),
        Zone::Summary => solution.summary.push(text),
        Zone::Explanation => solution.explanation.push(text),
    }
    state.in_step_run = zone == Zone::Step;
}

fn final_answer(paragraph: &str) -> FinalAnswer {
    let stripped = ANSWER_PREFIX.replace(paragraph, "");
    let stripped = stripped.trim();
    let text = if stripped.is_empty() { paragraph.to_owned() } else { stripped.to_owned() };
    let math = extract_math(&text);
    FinalAnswer { text, math }
}

/// First match of the math pattern that carries a digit or `=`. Bare
/// punctuation such as `(` or `-` is not math.
#[must_use]
pub fn extract_math(text: &str) -> Option<String> {
    MATH_HINT
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|s| s.chars().any(|c| c.is_ascii_digit() || c == '='))
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "segment_test.rs"]
mod tests;
