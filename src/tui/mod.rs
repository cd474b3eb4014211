mod ui;
mod widgets;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::account::{Accounts, Session};
use crate::activity::{Activity, LessonProgress, Metrics, SkillProgress};
use crate::machine::Action;
use crate::models::{Course, CourseSummary, ModuleSummary};
use crate::store::Storage;
use crate::timer::{PracticeTimer, DEFAULT_MINUTES};
use crate::tracker::Tracker;

const TIMER_PAGE: &str = "classroom-practice-tests.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Modules,
    Skills,
    Timer,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Modules => View::Skills,
            View::Skills => View::Timer,
            View::Timer => View::Modules,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Modules => View::Timer,
            View::Skills => View::Modules,
            View::Timer => View::Skills,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    /// Replaces the items, keeping the cursor where it was when still valid.
    fn replace(&mut self, items: Vec<T>) {
        let selected = match self.selected {
            Some(i) if i < items.len() => Some(i),
            _ if items.is_empty() => None,
            _ => Some(0),
        };
        self.items = items;
        self.selected = selected;
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App<'a> {
    tracker: Tracker<'a>,
    activity: Activity<'a>,
    accounts: Accounts<'a>,
    pub view: View,
    pub course: Course,
    pub summary: CourseSummary,
    pub modules: StatefulList<ModuleSummary>,
    pub lessons: Vec<LessonProgress>,
    pub skills: Vec<SkillProgress>,
    pub metrics: Metrics,
    pub session: Option<Session>,
    pub timer: PracticeTimer<'a>,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(storage: Storage<'a>) -> Self {
        let tracker = Tracker::new(storage);
        let activity = Activity::new(storage);
        let accounts = Accounts::new(storage);
        let course = Course::Ielts;
        let summary = tracker.summary(course);

        Self {
            modules: StatefulList::with_items(summary.modules.clone()),
            summary,
            lessons: Course::ALL
                .iter()
                .map(|&c| activity.lesson_progress(c))
                .collect(),
            skills: activity.skill_progress(),
            metrics: activity.metrics(),
            session: accounts.session(),
            timer: PracticeTimer::load(storage, TIMER_PAGE, DEFAULT_MINUTES),
            tracker,
            activity,
            accounts,
            view: View::Modules,
            course,
            status_message: None,
            should_quit: false,
        }
    }

    pub fn refresh_data(&mut self) {
        self.summary = self.tracker.summary(self.course);
        self.modules.replace(self.summary.modules.clone());
        self.lessons = Course::ALL
            .iter()
            .map(|&c| self.activity.lesson_progress(c))
            .collect();
        self.skills = self.activity.skill_progress();
        self.metrics = self.activity.metrics();
        self.session = self.accounts.session();
    }

    fn switch_course(&mut self) {
        self.course = match self.course {
            Course::Ielts => Course::Toefl,
            Course::Toefl => Course::Ielts,
        };
        self.summary = self.tracker.summary(self.course);
        self.modules = StatefulList::with_items(self.summary.modules.clone());
        self.status_message = None;
    }

    fn open_selected_module(&mut self) {
        let Some(id) = self.modules.selected_item().map(|m| m.state.module_id) else {
            return;
        };
        let result = self.tracker.apply(self.course, id, &Action::Visit);
        self.status_message = Some(result.message);
        self.refresh_data();
    }

    /// Advances the practice timer; called once per event loop iteration.
    pub fn on_tick(&mut self, now: Instant) {
        if self.timer.poll(now) > 0 && self.timer.is_finished() {
            self.status_message = Some("Time is up. Submit your practice answers.".to_string());
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers, now: Instant) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,

            // Refresh: Ctrl+r (vim-like redo/refresh)
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data();
            }

            // Navigation between views: h/l (left/right like vim)
            KeyCode::Char('h') | KeyCode::Left => self.view = self.view.prev(),
            KeyCode::Char('l') | KeyCode::Right => self.view = self.view.next(),
            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => self.view = self.view.prev(),

            _ => match self.view {
                View::Modules => self.handle_modules_key(key),
                View::Timer => self.handle_timer_key(key, now),
                View::Skills => {}
            },
        }
    }

    fn handle_modules_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('j') | KeyCode::Down => self.modules.next(),
            KeyCode::Char('k') | KeyCode::Up => self.modules.previous(),
            KeyCode::Char('g') if !self.modules.items.is_empty() => {
                self.modules.selected = Some(0);
            }
            KeyCode::Char('G') if !self.modules.items.is_empty() => {
                self.modules.selected = Some(self.modules.items.len() - 1);
            }
            KeyCode::Char('c') => self.switch_course(),
            KeyCode::Enter | KeyCode::Char('o') => self.open_selected_module(),
            _ => {}
        }
    }

    fn handle_timer_key(&mut self, key: KeyCode, now: Instant) {
        match key {
            KeyCode::Char('s') => {
                self.timer.start(now);
                self.status_message = None;
            }
            KeyCode::Char('p') => self.timer.pause(),
            KeyCode::Char('r') => {
                self.timer.reset();
                self.status_message = None;
            }
            _ => {}
        }
    }
}

pub fn run(storage: Storage<'_>) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(storage);

    let result = run_app(&mut terminal, &mut app);

    // A running countdown keeps what it has counted so far
    app.timer.pause();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers, Instant::now());
            }
        }
        app.on_tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}
