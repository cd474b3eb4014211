use serde::{Deserialize, Serialize};

pub const MODULES_PER_COURSE: u32 = 6;
pub const DASHBOARD_PAGE: &str = "classroom-dashboard.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Course {
    Ielts,
    Toefl,
}

impl Course {
    pub const ALL: [Course; 2] = [Course::Ielts, Course::Toefl];

    pub fn as_str(&self) -> &'static str {
        match self {
            Course::Ielts => "ielts",
            Course::Toefl => "toefl",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ielts" | "i" => Some(Course::Ielts),
            "toefl" | "t" => Some(Course::Toefl),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Course::Ielts => "IELTS",
            Course::Toefl => "TOEFL",
        }
    }

    pub fn total_modules(&self) -> u32 {
        MODULES_PER_COURSE
    }

    /// IELTS also requires every assignment checklist item before completion.
    pub fn requires_checklist(&self) -> bool {
        matches!(self, Course::Ielts)
    }

    /// Whether a later failed quiz leaves an earlier completion in place.
    pub fn completion_is_sticky(&self) -> bool {
        matches!(self, Course::Ielts)
    }

    pub fn module_page(&self, module_id: u32) -> String {
        format!("classroom-{}-module-{}.html", self.as_str(), module_id)
    }

    /// Parses a module page name (or a path ending in one) back to its id.
    pub fn module_from_page(&self, page: &str) -> Option<u32> {
        let file = page.rsplit('/').next().unwrap_or_default().to_lowercase();
        let prefix = format!("classroom-{}-module-", self.as_str());
        let digits = file.strip_prefix(&prefix)?.strip_suffix(".html")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn estimated_time(&self, module_id: u32) -> Option<&'static str> {
        match self {
            Course::Ielts => Some(match module_id {
                1 => "60-80 minutes",
                2 => "70-90 minutes",
                3 => "90-120 minutes",
                4 => "90-110 minutes",
                5 => "75-95 minutes",
                6 => "120-150 minutes",
                _ => "75-95 minutes",
            }),
            Course::Toefl => None,
        }
    }
}

/// Progress of one module, derived from several stored keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleState {
    pub module_id: u32,
    pub started: bool,
    pub quiz_passed: bool,
    pub completed: bool,
    pub quiz_percent: Option<u32>,
    pub reflection: String,
}

impl ModuleState {
    pub fn new(module_id: u32) -> Self {
        Self {
            module_id,
            started: false,
            quiz_passed: false,
            completed: false,
            quiz_percent: None,
            reflection: String::new(),
        }
    }

    /// Any recorded activity at all, whether or not a started flag exists.
    pub fn has_progress(&self) -> bool {
        self.started
            || self.completed
            || self.quiz_passed
            || self.quiz_percent.is_some()
            || !self.reflection.is_empty()
    }

    pub fn phase(&self) -> ModulePhase {
        if self.completed {
            ModulePhase::Completed
        } else if self.quiz_passed {
            ModulePhase::QuizPassed
        } else if self.started {
            ModulePhase::Started
        } else {
            ModulePhase::NotStarted
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModulePhase {
    NotStarted,
    Started,
    QuizPassed,
    Completed,
}

impl ModulePhase {
    pub fn label(&self) -> &'static str {
        match self {
            ModulePhase::NotStarted => "Not Started",
            ModulePhase::Started => "Started",
            ModulePhase::QuizPassed => "Quiz Passed",
            ModulePhase::Completed => "Completed",
        }
    }
}

// What the dashboard shows for a module card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStatus {
    Completed,
    Locked,
    InProgress,
    NotStarted,
}

impl ModuleStatus {
    pub fn of(state: &ModuleState, unlocked: bool) -> Self {
        if state.completed {
            ModuleStatus::Completed
        } else if !unlocked {
            ModuleStatus::Locked
        } else if state.started {
            ModuleStatus::InProgress
        } else {
            ModuleStatus::NotStarted
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModuleStatus::Completed => "Completed",
            ModuleStatus::Locked => "Locked",
            ModuleStatus::InProgress => "In Progress",
            ModuleStatus::NotStarted => "Not Started",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ModuleStatus::Completed => "✅",
            ModuleStatus::Locked => "🔒",
            ModuleStatus::InProgress => "🟡",
            ModuleStatus::NotStarted => "⚪",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    pub state: ModuleState,
    pub unlocked: bool,
    pub status: ModuleStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub course: Course,
    pub modules: Vec<ModuleSummary>,
    pub completed_count: u32,
    pub total: u32,
    pub percent: u32,
    pub resume_link: String,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
