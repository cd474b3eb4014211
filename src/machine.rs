//! Module progression as a pure function of (state, action).
//!
//! `transition` never touches storage. It returns the next state together with
//! the field writes that persist it, so the tracker only has to replay them.

use serde::Serialize;

use crate::keys::{Field, KeyResolver};
use crate::models::{Course, ModuleState};
use crate::quiz::{QuizScore, PASS_MARK};

/// Assignment checklist as ticked by the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Checklist {
    pub checked: u32,
    pub total: u32,
}

impl Checklist {
    pub fn new(checked: u32, total: u32) -> Self {
        Self {
            checked: checked.min(total),
            total,
        }
    }

    /// An empty checklist is never complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.checked == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Visit,
    SubmitQuiz(QuizScore),
    SaveReflection(String),
    MarkComplete(Checklist),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rejection {
    Locked,
    ChecklistIncomplete,
    QuizNotPassed { percent: Option<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Applied,
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWrite {
    pub field: Field,
    pub value: String,
}

impl FieldWrite {
    fn new(field: Field, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub state: ModuleState,
    pub writes: Vec<FieldWrite>,
    pub outcome: Outcome,
    pub message: String,
}

impl Transition {
    fn rejected(state: &ModuleState, rejection: Rejection, message: String) -> Self {
        Self {
            state: state.clone(),
            writes: Vec::new(),
            outcome: Outcome::Rejected(rejection),
            message,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

pub fn transition(
    course: Course,
    state: &ModuleState,
    action: &Action,
    unlocked: bool,
) -> Transition {
    let id = state.module_id;

    if !unlocked {
        return Transition::rejected(
            state,
            Rejection::Locked,
            "This module is locked. Complete the previous module first.".to_string(),
        );
    }

    let mut next = state.clone();
    let mut writes = Vec::new();
    let tracks_started = KeyResolver::new(course, id).tracks(Field::Started);

    let message = match action {
        Action::Visit => {
            if tracks_started {
                next.started = true;
                writes.push(FieldWrite::new(Field::Started, true));
            }
            match (state.completed, course) {
                (true, Course::Ielts) => format!(
                    "Module {} already completed. You can continue to the next module.",
                    id
                ),
                (true, Course::Toefl) => format!("Module {} already completed.", id),
                (false, _) => format!("Module {} opened.", id),
            }
        }

        Action::SubmitQuiz(score) => {
            next.quiz_passed = score.passed;
            writes.push(FieldWrite::new(Field::QuizPassed, score.passed));

            match course {
                Course::Ielts => {
                    next.started = true;
                    writes.push(FieldWrite::new(Field::Started, true));
                }
                Course::Toefl => {
                    next.quiz_percent = Some(score.percent);
                    writes.push(FieldWrite::new(Field::QuizPercent, score.percent));
                }
            }

            if !score.passed && !course.completion_is_sticky() {
                next.completed = false;
                writes.push(FieldWrite::new(Field::Completed, false));
            }
            score.summary()
        }

        Action::SaveReflection(text) => {
            let text = text.trim().to_string();
            writes.push(FieldWrite::new(Field::Reflection, &text));
            next.reflection = text;
            if tracks_started {
                next.started = true;
                writes.push(FieldWrite::new(Field::Started, true));
            }
            "Reflection saved.".to_string()
        }

        Action::MarkComplete(checklist) => {
            if course.requires_checklist() && !checklist.is_complete() {
                return Transition::rejected(
                    state,
                    Rejection::ChecklistIncomplete,
                    "Complete all assignment checklist items before marking complete."
                        .to_string(),
                );
            }

            if !state.quiz_passed {
                let message = match course {
                    Course::Ielts => format!(
                        "Pass the mini quiz ({}%+) before marking this module complete.",
                        PASS_MARK
                    ),
                    Course::Toefl => format!(
                        "You need at least {}% on the mini quiz before moving to the next module. Current score: {}%.",
                        PASS_MARK,
                        state.quiz_percent.unwrap_or(0)
                    ),
                };
                return Transition::rejected(
                    state,
                    Rejection::QuizNotPassed {
                        percent: state.quiz_percent,
                    },
                    message,
                );
            }

            next.completed = true;
            writes.push(FieldWrite::new(Field::Completed, true));
            if tracks_started {
                next.started = true;
                writes.push(FieldWrite::new(Field::Started, true));
            }
            match course {
                Course::Ielts => format!("Module {} marked complete. Next module unlocked.", id),
                Course::Toefl => format!("Module {} marked complete.", id),
            }
        }
    };

    if !tracks_started {
        next.started = next.has_progress();
    }

    tracing::debug!(
        course = course.as_str(),
        module = id,
        from = state.phase().label(),
        to = next.phase().label(),
        writes = writes.len(),
        "module transition"
    );

    Transition {
        state: next,
        writes,
        outcome: Outcome::Applied,
        message,
    }
}
