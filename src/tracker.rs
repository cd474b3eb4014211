use std::fmt::Display;

use crate::keys::{Field, KeyResolver};
use crate::machine::{transition, Action, Transition};
use crate::models::{
    Course, CourseSummary, ModuleState, ModuleStatus, ModuleSummary, DASHBOARD_PAGE,
};
use crate::quiz::percent_of;
use crate::store::Storage;

/// Module progression over a key-value store.
#[derive(Clone, Copy)]
pub struct Tracker<'a> {
    storage: Storage<'a>,
}

impl<'a> Tracker<'a> {
    pub fn new(storage: Storage<'a>) -> Self {
        Self { storage }
    }

    /// Derives a module's state without writing anything back.
    pub fn read_state(&self, course: Course, module_id: u32) -> ModuleState {
        let keys = KeyResolver::new(course, module_id);
        let storage = &self.storage;

        let completed = keys.read_flag(storage, Field::Completed);
        let quiz_passed = keys.read_flag(storage, Field::QuizPassed);
        let quiz_percent = keys
            .read(storage, Field::QuizPercent)
            .and_then(|v| v.trim().parse().ok());
        let reflection = keys.read(storage, Field::Reflection).unwrap_or_default();

        let mut state = ModuleState {
            quiz_passed,
            completed,
            quiz_percent,
            reflection,
            ..ModuleState::new(module_id)
        };
        state.started = if keys.tracks(Field::Started) {
            keys.read_flag(storage, Field::Started) || completed || quiz_passed
        } else {
            state.has_progress()
        };
        state
    }

    /// Derives a module's state and back-fills canonical and legacy keys for
    /// every flag that reads as true, migrating alias-only progress.
    pub fn get_state(&self, course: Course, module_id: u32) -> ModuleState {
        let state = self.read_state(course, module_id);
        let keys = KeyResolver::new(course, module_id);

        if state.completed {
            keys.heal(&self.storage, Field::Completed, "true");
        }
        if state.quiz_passed {
            keys.heal(&self.storage, Field::QuizPassed, "true");
        }
        if state.started {
            keys.heal(&self.storage, Field::Started, "true");
        }
        state
    }

    /// Writes to the canonical key and, where one exists, the legacy alias.
    /// Values are not validated.
    pub fn set_field(&self, course: Course, module_id: u32, field: Field, value: impl Display) {
        KeyResolver::new(course, module_id).write(&self.storage, field, &value.to_string());
    }

    pub fn is_unlocked(&self, course: Course, module_id: u32) -> bool {
        if module_id <= 1 {
            return true;
        }
        self.read_state(course, module_id - 1).completed
    }

    /// Page of the first module not yet completed, or the dashboard when all are.
    pub fn first_incomplete_module_link(&self, course: Course, total: u32) -> String {
        (1..=total)
            .find(|&id| !self.read_state(course, id).completed)
            .map(|id| course.module_page(id))
            .unwrap_or_else(|| DASHBOARD_PAGE.to_string())
    }

    pub fn apply(&self, course: Course, module_id: u32, action: &Action) -> Transition {
        let unlocked = self.is_unlocked(course, module_id);
        let state = self.get_state(course, module_id);
        let result = transition(course, &state, action, unlocked);

        let keys = KeyResolver::new(course, module_id);
        for write in &result.writes {
            keys.write(&self.storage, write.field, &write.value);
        }

        if result.is_applied() && result.state.completed && !state.completed {
            tracing::info!(course = course.as_str(), module = module_id, "module completed");
        } else if !result.is_applied() {
            tracing::debug!(
                course = course.as_str(),
                module = module_id,
                outcome = ?result.outcome,
                "action rejected"
            );
        }
        result
    }

    pub fn summary(&self, course: Course) -> CourseSummary {
        let total = course.total_modules();
        let modules: Vec<ModuleSummary> = (1..=total)
            .map(|id| {
                let state = self.get_state(course, id);
                let unlocked = self.is_unlocked(course, id);
                ModuleSummary {
                    status: ModuleStatus::of(&state, unlocked),
                    state,
                    unlocked,
                }
            })
            .collect();

        let completed_count = modules.iter().filter(|m| m.state.completed).count() as u32;

        CourseSummary {
            course,
            completed_count,
            total,
            percent: percent_of(completed_count, total),
            resume_link: self.first_incomplete_module_link(course, total),
            modules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Checklist, Outcome, Rejection};
    use crate::quiz::QuizScore;
    use crate::store::MemoryStore;

    fn complete_module(tracker: &Tracker<'_>, course: Course, id: u32) {
        tracker.set_field(course, id, Field::QuizPassed, true);
        tracker.set_field(course, id, Field::Completed, true);
    }

    mod state_tests {
        use super::*;

        #[test]
        fn empty_store_reads_default_state() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            for course in Course::ALL {
                assert_eq!(tracker.get_state(course, 1), ModuleState::new(1));
            }
            assert_eq!(store.len(), 0);
        }

        #[test]
        fn only_literal_true_counts() {
            let store = MemoryStore::new();
            store.insert_raw("ielts_m1_done", "yes");
            store.insert_raw("ielts_m1_quiz_pass", "True");
            let tracker = Tracker::new(Storage::new(&store));

            let state = tracker.get_state(Course::Ielts, 1);
            assert!(!state.completed);
            assert!(!state.quiz_passed);
        }

        #[test]
        fn started_implied_by_quiz_pass() {
            let store = MemoryStore::new();
            store.insert_raw("ielts_m2_quiz_pass", "true");
            let tracker = Tracker::new(Storage::new(&store));

            let state = tracker.get_state(Course::Ielts, 2);
            assert!(state.started);
            assert_eq!(store.raw("ielts_m2_started").as_deref(), Some("true"));
        }

        #[test]
        fn legacy_only_storage_is_migrated() {
            let store = MemoryStore::new();
            store.insert_raw("ielts_module_1_complete", "true");
            let tracker = Tracker::new(Storage::new(&store));

            let state = tracker.get_state(Course::Ielts, 1);

            assert!(state.completed);
            assert!(state.started);
            assert_eq!(store.raw("ielts_m1_done").as_deref(), Some("true"));
            assert_eq!(store.raw("ielts_m1_started").as_deref(), Some("true"));
        }

        #[test]
        fn legacy_reflection_is_read() {
            let store = MemoryStore::new();
            store.insert_raw("ielts_module_3_reflection", "old notes");
            let tracker = Tracker::new(Storage::new(&store));

            assert_eq!(tracker.read_state(Course::Ielts, 3).reflection, "old notes");
        }

        #[test]
        fn read_state_has_no_side_effects() {
            let store = MemoryStore::new();
            store.insert_raw("ielts_module_1_complete", "true");
            let tracker = Tracker::new(Storage::new(&store));

            assert!(tracker.read_state(Course::Ielts, 1).completed);
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn toefl_state_reads_percent_and_progress() {
            let store = MemoryStore::new();
            store.insert_raw("toefl_m2_quiz_percent", "45");
            let tracker = Tracker::new(Storage::new(&store));

            let state = tracker.get_state(Course::Toefl, 2);
            assert_eq!(state.quiz_percent, Some(45));
            assert!(state.started);
            assert!(!state.quiz_passed);
        }

        #[test]
        fn corrupt_percent_reads_as_absent() {
            let store = MemoryStore::new();
            store.insert_raw("toefl_m2_quiz_percent", "lots");
            let tracker = Tracker::new(Storage::new(&store));

            assert_eq!(tracker.read_state(Course::Toefl, 2).quiz_percent, None);
        }

        #[test]
        fn ielts_set_field_writes_alias() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            tracker.set_field(Course::Ielts, 4, Field::Completed, true);

            assert_eq!(store.raw("ielts_m4_done").as_deref(), Some("true"));
            assert_eq!(store.raw("ielts_module_4_complete").as_deref(), Some("true"));
        }

        #[test]
        fn toefl_set_field_has_no_alias() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            tracker.set_field(Course::Toefl, 4, Field::Completed, true);

            assert_eq!(store.raw("toefl_m4_done").as_deref(), Some("true"));
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn courses_are_isolated() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            complete_module(&tracker, Course::Ielts, 1);

            assert!(tracker.get_state(Course::Ielts, 1).completed);
            assert!(!tracker.get_state(Course::Toefl, 1).completed);
            assert!(!tracker.get_state(Course::Ielts, 2).completed);
        }

        #[test]
        fn unavailable_store_degrades_silently() {
            let store = MemoryStore::unavailable();
            let tracker = Tracker::new(Storage::new(&store));

            tracker.set_field(Course::Ielts, 1, Field::Completed, true);
            assert_eq!(tracker.get_state(Course::Ielts, 1), ModuleState::new(1));
            assert!(tracker.is_unlocked(Course::Ielts, 1));
            assert!(!tracker.is_unlocked(Course::Ielts, 2));

            let t = tracker.apply(Course::Ielts, 1, &Action::Visit);
            assert!(t.is_applied());
        }
    }

    mod unlock_tests {
        use super::*;

        #[test]
        fn first_module_always_unlocked() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            for course in Course::ALL {
                assert!(tracker.is_unlocked(course, 1));
                assert!(tracker.is_unlocked(course, 0));
            }
        }

        #[test]
        fn unlock_follows_predecessor_completion() {
            // Every completion pattern over six modules
            for course in Course::ALL {
                for mask in 0u32..64 {
                    let store = MemoryStore::new();
                    let tracker = Tracker::new(Storage::new(&store));
                    for id in 1..=6 {
                        if mask & (1 << (id - 1)) != 0 {
                            tracker.set_field(course, id, Field::Completed, true);
                        }
                    }
                    for id in 2..=6 {
                        assert_eq!(
                            tracker.is_unlocked(course, id),
                            tracker.get_state(course, id - 1).completed,
                            "{:?} mask {:06b} module {}",
                            course,
                            mask,
                            id
                        );
                    }
                }
            }
        }

        #[test]
        fn unlock_reflects_latest_write() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            assert!(!tracker.is_unlocked(Course::Toefl, 2));
            tracker.set_field(Course::Toefl, 1, Field::Completed, true);
            assert!(tracker.is_unlocked(Course::Toefl, 2));
            tracker.set_field(Course::Toefl, 1, Field::Completed, false);
            assert!(!tracker.is_unlocked(Course::Toefl, 2));
        }

        #[test]
        fn legacy_completion_unlocks_next() {
            let store = MemoryStore::new();
            store.insert_raw("ielts_module_1_complete", "true");
            let tracker = Tracker::new(Storage::new(&store));

            assert!(tracker.is_unlocked(Course::Ielts, 2));
        }
    }

    mod resume_tests {
        use super::*;

        #[test]
        fn resume_points_at_first_incomplete() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            assert_eq!(
                tracker.first_incomplete_module_link(Course::Ielts, 6),
                "classroom-ielts-module-1.html"
            );

            complete_module(&tracker, Course::Ielts, 1);
            complete_module(&tracker, Course::Ielts, 2);
            assert_eq!(
                tracker.first_incomplete_module_link(Course::Ielts, 6),
                "classroom-ielts-module-3.html"
            );
        }

        #[test]
        fn resume_skips_only_completed() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            complete_module(&tracker, Course::Toefl, 2);

            assert_eq!(
                tracker.first_incomplete_module_link(Course::Toefl, 6),
                "classroom-toefl-module-1.html"
            );
        }

        #[test]
        fn resume_all_done_goes_to_dashboard() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            for id in 1..=6 {
                complete_module(&tracker, Course::Toefl, id);
            }

            assert_eq!(
                tracker.first_incomplete_module_link(Course::Toefl, 6),
                "classroom-dashboard.html"
            );
        }
    }

    mod apply_tests {
        use super::*;

        fn pass() -> Action {
            Action::SubmitQuiz(QuizScore::from_counts(7, 10, 10))
        }

        fn fail() -> Action {
            Action::SubmitQuiz(QuizScore::from_counts(6, 10, 10))
        }

        #[test]
        fn full_ielts_flow() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            tracker.apply(Course::Ielts, 1, &Action::Visit);
            assert!(tracker.get_state(Course::Ielts, 1).started);

            tracker.apply(Course::Ielts, 1, &pass());
            assert!(tracker.get_state(Course::Ielts, 1).quiz_passed);

            let t = tracker.apply(Course::Ielts, 1, &Action::MarkComplete(Checklist::new(3, 3)));
            assert!(t.is_applied());

            let state = tracker.get_state(Course::Ielts, 1);
            assert!(state.completed);
            assert_eq!(store.raw("ielts_m1_done").as_deref(), Some("true"));
            assert_eq!(
                store.raw("ielts_module_1_complete"),
                store.raw("ielts_m1_done")
            );
            assert!(tracker.is_unlocked(Course::Ielts, 2));
        }

        #[test]
        fn incomplete_checklist_changes_nothing() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            tracker.apply(Course::Ielts, 1, &pass());
            let before = tracker.get_state(Course::Ielts, 1);
            let keys_before = store.len();

            let t = tracker.apply(Course::Ielts, 1, &Action::MarkComplete(Checklist::new(1, 3)));

            assert_eq!(t.outcome, Outcome::Rejected(Rejection::ChecklistIncomplete));
            assert_eq!(tracker.get_state(Course::Ielts, 1), before);
            assert!(!tracker.get_state(Course::Ielts, 1).completed);
            assert_eq!(store.len(), keys_before);
        }

        #[test]
        fn toefl_failed_retry_revokes_completion() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            tracker.apply(Course::Toefl, 1, &pass());
            tracker.apply(Course::Toefl, 1, &Action::MarkComplete(Checklist::default()));
            assert!(tracker.get_state(Course::Toefl, 1).completed);

            tracker.apply(Course::Toefl, 1, &fail());

            let state = tracker.get_state(Course::Toefl, 1);
            assert!(!state.quiz_passed);
            assert!(!state.completed);
            assert_eq!(state.quiz_percent, Some(60));
            assert_eq!(store.raw("toefl_m1_done").as_deref(), Some("false"));
            assert!(!tracker.is_unlocked(Course::Toefl, 2));
        }

        #[test]
        fn ielts_failed_retry_keeps_completion() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            tracker.apply(Course::Ielts, 1, &pass());
            tracker.apply(Course::Ielts, 1, &Action::MarkComplete(Checklist::new(2, 2)));

            tracker.apply(Course::Ielts, 1, &fail());

            let state = tracker.get_state(Course::Ielts, 1);
            assert!(!state.quiz_passed);
            assert!(state.completed);
            assert!(tracker.is_unlocked(Course::Ielts, 2));
        }

        #[test]
        fn locked_module_is_not_written() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            let t = tracker.apply(Course::Ielts, 2, &pass());

            assert_eq!(t.outcome, Outcome::Rejected(Rejection::Locked));
            assert_eq!(store.len(), 0);
        }

        #[test]
        fn quiz_feedback_is_the_score_summary() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            let score = QuizScore::from_counts(7, 10, 10);

            let t = tracker.apply(Course::Ielts, 1, &Action::SubmitQuiz(score));

            assert!(t.is_applied());
            assert_eq!(t.message, score.summary());
        }

        #[test]
        fn locked_quiz_reports_only_the_lock() {
            for course in Course::ALL {
                let store = MemoryStore::new();
                let tracker = Tracker::new(Storage::new(&store));

                let t = tracker.apply(course, 3, &pass());

                assert_eq!(t.outcome, Outcome::Rejected(Rejection::Locked), "{:?}", course);
                assert_eq!(
                    t.message,
                    "This module is locked. Complete the previous module first."
                );
                assert!(!tracker.get_state(course, 3).quiz_passed);
                assert_eq!(store.len(), 0);
            }
        }

        #[test]
        fn reflection_round_trips() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            tracker.apply(Course::Ielts, 1, &Action::SaveReflection(" plan: more practice ".into()));

            assert_eq!(tracker.get_state(Course::Ielts, 1).reflection, "plan: more practice");
            assert_eq!(
                store.raw("ielts_module_1_reflection").as_deref(),
                Some("plan: more practice")
            );
        }

        #[test]
        fn transition_state_matches_reread() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            let actions = [
                Action::Visit,
                fail(),
                Action::SaveReflection("notes".into()),
                pass(),
                Action::MarkComplete(Checklist::new(1, 1)),
                fail(),
            ];
            for course in Course::ALL {
                for action in &actions {
                    let t = tracker.apply(course, 1, action);
                    assert_eq!(t.state, tracker.read_state(course, 1), "{:?} {:?}", course, action);
                }
            }
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn summary_counts_and_statuses() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));
            complete_module(&tracker, Course::Ielts, 1);
            tracker.set_field(Course::Ielts, 2, Field::Started, true);

            let summary = tracker.summary(Course::Ielts);

            assert_eq!(summary.completed_count, 1);
            assert_eq!(summary.total, 6);
            assert_eq!(summary.percent, 17);
            assert_eq!(summary.resume_link, "classroom-ielts-module-2.html");
            assert_eq!(summary.modules[0].status, ModuleStatus::Completed);
            assert_eq!(summary.modules[1].status, ModuleStatus::InProgress);
            assert_eq!(summary.modules[2].status, ModuleStatus::Locked);
        }

        #[test]
        fn empty_summary() {
            let store = MemoryStore::new();
            let tracker = Tracker::new(Storage::new(&store));

            let summary = tracker.summary(Course::Toefl);

            assert_eq!(summary.completed_count, 0);
            assert_eq!(summary.percent, 0);
            assert_eq!(summary.modules[0].status, ModuleStatus::NotStarted);
            assert!(summary.modules[1..]
                .iter()
                .all(|m| m.status == ModuleStatus::Locked));
        }
    }
}
