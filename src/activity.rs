use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Course;
use crate::quiz::{percent_of, QuizScore};
use crate::store::Storage;

pub const LESSONS_PER_TRACK: u32 = 12;

/// Progress credited per writing submission or speaking recording.
pub const ACTIVITY_STEP: u32 = 20;

const WRITING_KEY: &str = "classroom_writing_submissions";
const SPEAKING_KEY: &str = "classroom_speaking_recordings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Reading,
    Listening,
    Writing,
    Speaking,
}

impl Skill {
    pub const ALL: [Skill; 4] = [Skill::Reading, Skill::Listening, Skill::Writing, Skill::Speaking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Reading => "reading",
            Skill::Listening => "listening",
            Skill::Writing => "writing",
            Skill::Speaking => "speaking",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reading" | "r" => Some(Skill::Reading),
            "listening" | "l" => Some(Skill::Listening),
            "writing" | "w" => Some(Skill::Writing),
            "speaking" | "s" => Some(Skill::Speaking),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Skill::Reading => "Reading",
            Skill::Listening => "Listening",
            Skill::Writing => "Writing",
            Skill::Speaking => "Speaking",
        }
    }

    fn score_key(&self) -> String {
        format!("classroom_{}_score", self.as_str())
    }
}

/// A saved auto-scored attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillScore {
    pub correct: u32,
    pub total: u32,
    pub answered: u32,
    pub percent: u32,
    pub at: String,
}

impl SkillScore {
    pub fn feedback(&self, skill: Skill) -> String {
        format!(
            "{} score: {}/{} ({}%). Answered {}/{}. Saved to dashboard.",
            skill.as_str().to_uppercase(),
            self.correct,
            self.total,
            self.percent,
            self.answered,
            self.total
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonProgress {
    pub course: Course,
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
    pub next_lesson: String,
}

impl LessonProgress {
    pub fn label(&self) -> String {
        format!(
            "{}/{} lessons complete ({}%)",
            self.completed, self.total, self.percent
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillProgress {
    pub skill: Skill,
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub reading: Option<SkillScore>,
    pub listening: Option<SkillScore>,
    pub writing_submissions: u32,
    pub speaking_recordings: u32,
}

/// Lesson tracks, skill scores and practice counters.
#[derive(Clone, Copy)]
pub struct Activity<'a> {
    storage: Storage<'a>,
}

impl<'a> Activity<'a> {
    pub fn new(storage: Storage<'a>) -> Self {
        Self { storage }
    }

    fn lesson_key(course: Course) -> String {
        format!("classroom_progress_{}", course.as_str())
    }

    pub fn lesson_progress(&self, course: Course) -> LessonProgress {
        let completed = self.storage.read_count(&Self::lesson_key(course));
        LessonProgress {
            course,
            completed,
            total: LESSONS_PER_TRACK,
            percent: percent_of(completed, LESSONS_PER_TRACK).min(100),
            next_lesson: format!("classroom-lesson-{}-orientation.html", course.as_str()),
        }
    }

    pub fn complete_lesson(&self, course: Course) -> LessonProgress {
        let current = self.storage.read_count(&Self::lesson_key(course));
        let updated = current.saturating_add(1).min(LESSONS_PER_TRACK);
        self.storage
            .write(&Self::lesson_key(course), &updated.to_string());
        tracing::debug!(course = course.as_str(), lessons = updated, "lesson completed");
        self.lesson_progress(course)
    }

    pub fn record_score(&self, skill: Skill, score: &QuizScore, at: DateTime<Utc>) -> SkillScore {
        let saved = SkillScore {
            correct: score.correct,
            total: score.total,
            answered: score.answered,
            percent: score.percent,
            at: at.to_rfc3339(),
        };
        self.storage.write_json(&skill.score_key(), &saved);
        saved
    }

    pub fn score(&self, skill: Skill) -> Option<SkillScore> {
        self.storage.read_json(&skill.score_key())
    }

    fn bump(&self, key: &str) -> u32 {
        let count = self.storage.read_count(key).saturating_add(1);
        self.storage.write(key, &count.to_string());
        count
    }

    pub fn submit_writing(&self) -> u32 {
        self.bump(WRITING_KEY)
    }

    pub fn record_speaking(&self) -> u32 {
        self.bump(SPEAKING_KEY)
    }

    pub fn skill_progress(&self) -> Vec<SkillProgress> {
        Skill::ALL
            .iter()
            .map(|&skill| {
                let percent = match skill {
                    Skill::Reading | Skill::Listening => {
                        self.score(skill).map(|s| s.percent).unwrap_or(0)
                    }
                    Skill::Writing => step_percent(self.storage.read_count(WRITING_KEY)),
                    Skill::Speaking => step_percent(self.storage.read_count(SPEAKING_KEY)),
                };
                SkillProgress { skill, percent }
            })
            .collect()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            reading: self.score(Skill::Reading),
            listening: self.score(Skill::Listening),
            writing_submissions: self.storage.read_count(WRITING_KEY),
            speaking_recordings: self.storage.read_count(SPEAKING_KEY),
        }
    }
}

fn step_percent(count: u32) -> u32 {
    count.saturating_mul(ACTIVITY_STEP).min(100)
}
