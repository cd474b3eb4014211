use serde::{Deserialize, Serialize};

/// Minimum percent that counts as a pass.
pub const PASS_MARK: u32 = 70;

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole` is 0.
pub fn percent_of(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    ((200 * part + whole) / (2 * whole)) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: u32,
    pub answered: u32,
    pub total: u32,
    pub percent: u32,
    pub passed: bool,
}

impl QuizScore {
    /// Counts above `total` are clamped to it; `answered` is at least `correct`.
    pub fn from_counts(correct: u32, answered: u32, total: u32) -> Self {
        let correct = correct.min(total);
        let answered = answered.min(total).max(correct);
        let percent = percent_of(correct, total);
        Self {
            correct,
            answered,
            total,
            percent,
            passed: percent >= PASS_MARK,
        }
    }

    /// One entry per question: `None` when unanswered, otherwise whether the
    /// selected choice was the correct one.
    pub fn multiple_choice(selections: &[Option<bool>]) -> Self {
        let answered = selections.iter().filter(|s| s.is_some()).count() as u32;
        let correct = selections.iter().filter(|s| **s == Some(true)).count() as u32;
        Self::from_counts(correct, answered, selections.len() as u32)
    }

    /// Free-text answers compared case-insensitively after trimming. Blank
    /// attempts are unanswered and never correct.
    pub fn free_text<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (mut correct, mut answered, mut total) = (0, 0, 0);
        for (attempt, solution) in pairs {
            total += 1;
            let attempt = attempt.trim().to_lowercase();
            if attempt.is_empty() {
                continue;
            }
            answered += 1;
            if attempt == solution.trim().to_lowercase() {
                correct += 1;
            }
        }
        Self::from_counts(correct, answered, total)
    }

    pub fn summary(&self) -> String {
        let verdict = if self.passed {
            format!("Passed ({}%+).", PASS_MARK)
        } else {
            format!("Below {}%. Please try again.", PASS_MARK)
        };
        let mut line = format!(
            "Quiz result: {}/{} ({}%). {}",
            self.correct, self.total, self.percent, verdict
        );
        if self.answered < self.total {
            line.push_str(&format!(" Answered {}/{}.", self.answered, self.total));
        }
        line
    }
}

/// Splits a comma separated answer list, keeping empty slots.
pub fn split_answers(raw: &str) -> Vec<&str> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::trim).collect()
}
