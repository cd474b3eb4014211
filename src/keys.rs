//! Storage key naming for module progress.
//!
//! Each tracked field has one canonical key, `<course>_m<N>_<suffix>`. IELTS
//! also carries deprecated `<course>_module_<N>_<suffix>` aliases for some
//! fields. Reads prefer the canonical key and fall back to the alias; writes
//! go to both.

use serde::{Deserialize, Serialize};

use crate::models::Course;
use crate::store::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Started,
    Completed,
    QuizPassed,
    QuizPercent,
    Reflection,
}

impl Field {
    #[cfg(test)]
    pub const ALL: [Field; 5] = [
        Field::Started,
        Field::Completed,
        Field::QuizPassed,
        Field::QuizPercent,
        Field::Reflection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Started => "started",
            Field::Completed => "completed",
            Field::QuizPassed => "quiz_passed",
            Field::QuizPercent => "quiz_percent",
            Field::Reflection => "reflection",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "started" => Some(Field::Started),
            "completed" | "done" | "complete" => Some(Field::Completed),
            "quiz_passed" | "quiz_pass" | "quiz-passed" => Some(Field::QuizPassed),
            "quiz_percent" | "quiz-percent" | "percent" => Some(Field::QuizPercent),
            "reflection" => Some(Field::Reflection),
            _ => None,
        }
    }
}

/// Resolves the stored keys of one module's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyResolver {
    course: Course,
    module_id: u32,
}

impl KeyResolver {
    pub fn new(course: Course, module_id: u32) -> Self {
        Self { course, module_id }
    }

    /// `None` when the course does not track the field at all.
    pub fn canonical(&self, field: Field) -> Option<String> {
        let suffix = match (self.course, field) {
            (_, Field::Completed) => "done",
            (_, Field::QuizPassed) => "quiz_pass",
            (_, Field::Reflection) => "reflection",
            (Course::Ielts, Field::Started) => "started",
            (Course::Toefl, Field::QuizPercent) => "quiz_percent",
            (Course::Ielts, Field::QuizPercent) | (Course::Toefl, Field::Started) => return None,
        };
        Some(format!("{}_m{}_{}", self.course.as_str(), self.module_id, suffix))
    }

    pub fn legacy(&self, field: Field) -> Option<String> {
        let suffix = match (self.course, field) {
            (Course::Ielts, Field::Completed) => "complete",
            (Course::Ielts, Field::QuizPassed) => "quiz_pass",
            (Course::Ielts, Field::Reflection) => "reflection",
            _ => return None,
        };
        Some(format!("{}_module_{}_{}", self.course.as_str(), self.module_id, suffix))
    }

    pub fn tracks(&self, field: Field) -> bool {
        self.canonical(field).is_some()
    }

    /// An empty canonical value counts as unset, so the alias still shows through.
    pub fn read(&self, storage: &Storage<'_>, field: Field) -> Option<String> {
        let canonical = self.canonical(field)?;
        storage
            .read(&canonical)
            .filter(|v| !v.is_empty())
            .or_else(|| self.legacy(field).and_then(|key| storage.read(&key)))
    }

    pub fn read_flag(&self, storage: &Storage<'_>, field: Field) -> bool {
        self.read(storage, field).as_deref() == Some("true")
    }

    pub fn write(&self, storage: &Storage<'_>, field: Field, value: &str) {
        let Some(canonical) = self.canonical(field) else {
            tracing::debug!(
                course = self.course.as_str(),
                field = field.as_str(),
                "field not tracked for course, skipping write"
            );
            return;
        };
        storage.write(&canonical, value);
        if let Some(legacy) = self.legacy(field) {
            storage.write(&legacy, value);
        }
    }

    /// Rewrites whichever of the field's keys do not already hold `value`.
    pub fn heal(&self, storage: &Storage<'_>, field: Field, value: &str) {
        for key in [self.canonical(field), self.legacy(field)]
            .into_iter()
            .flatten()
        {
            if storage.read(&key).as_deref() != Some(value) {
                tracing::debug!(key = key.as_str(), value, "back-filling progress key");
                storage.write(&key, value);
            }
        }
    }
}
