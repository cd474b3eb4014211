mod account;
mod activity;
mod keys;
mod machine;
mod models;
mod quiz;
mod store;
mod timer;
mod tracker;
mod tui;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use account::{Accounts, Session};
use activity::{Activity, Skill};
use keys::Field;
use machine::{Action, Checklist};
use models::{Course, JsonOutput, MODULES_PER_COURSE};
use quiz::{split_answers, QuizScore};
use store::{KeyValueStore, MemoryStore, SqliteStore, Storage};
use timer::{PracticeTimer, DEFAULT_MINUTES};
use tracker::Tracker;

const DEFAULT_DB_NAME: &str = "classroom.db";
const DEFAULT_TIMER_PAGE: &str = "classroom-practice-tests.html";

#[derive(Parser)]
#[command(name = "classroom")]
#[command(about = "IELTS and TOEFL self-study classroom: modules, quizzes and practice")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the profile database
    Init,

    /// Work through course modules
    #[command(subcommand)]
    Module(ModuleCommands),

    /// Show module progress for every course
    Dashboard,

    /// Print the page of the first module not yet completed
    Resume {
        #[arg(value_parser = parse_course)]
        course: Course,
    },

    /// Lesson tracks
    #[command(subcommand)]
    Lesson(LessonCommands),

    /// Auto-score a reading or listening answer sheet
    Score {
        /// reading or listening
        #[arg(value_parser = parse_scored_skill)]
        skill: Skill,

        /// Comma-separated answers; leave a slot empty to skip it
        #[arg(long, short)]
        answers: String,

        /// Comma-separated answer key
        #[arg(long, short)]
        key: String,
    },

    /// Writing practice
    #[command(subcommand)]
    Writing(WritingCommands),

    /// Speaking practice
    #[command(subcommand)]
    Speaking(SpeakingCommands),

    /// Show skill progress and saved scores
    Skills,

    /// Student account on this profile
    #[command(subcommand)]
    Account(AccountCommands),

    /// Show or reset a practice timer
    Timer {
        /// Page the timer belongs to
        #[arg(long, short, default_value = DEFAULT_TIMER_PAGE)]
        page: String,

        /// Timer length in minutes
        #[arg(long, short, default_value_t = DEFAULT_MINUTES)]
        minutes: u32,

        /// Reset to the full duration
        #[arg(long)]
        reset: bool,
    },

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum ModuleCommands {
    /// Show one module, or every module of a course
    Status {
        #[arg(value_parser = parse_course)]
        course: Course,

        #[arg(value_parser = parse_module_id)]
        id: Option<u32>,
    },

    /// Open a module
    Visit {
        #[arg(value_parser = parse_course)]
        course: Course,

        #[arg(value_parser = parse_module_id)]
        id: u32,
    },

    /// Submit a module quiz result
    Quiz {
        #[arg(value_parser = parse_course)]
        course: Course,

        #[arg(value_parser = parse_module_id)]
        id: u32,

        /// Questions answered correctly
        #[arg(long, short, required_unless_present = "choices")]
        correct: Option<u32>,

        /// Questions in the quiz
        #[arg(long, short, required_unless_present = "choices")]
        total: Option<u32>,

        /// Questions answered at all (defaults to total)
        #[arg(long, short)]
        answered: Option<u32>,

        /// Options picked per question, comma-separated; an empty slot is unanswered
        #[arg(long, conflicts_with_all = ["correct", "total", "answered"], requires = "key")]
        choices: Option<String>,

        /// Correct option per question, comma-separated
        #[arg(long, short, requires = "choices")]
        key: Option<String>,
    },

    /// Save a reflection
    Reflect {
        #[arg(value_parser = parse_course)]
        course: Course,

        #[arg(value_parser = parse_module_id)]
        id: u32,

        text: String,
    },

    /// Mark a module complete
    Complete {
        #[arg(value_parser = parse_course)]
        course: Course,

        #[arg(value_parser = parse_module_id)]
        id: u32,

        /// Checklist items ticked
        #[arg(long, default_value_t = 0)]
        checked: u32,

        /// Checklist items in the assignment
        #[arg(long, default_value_t = 0)]
        items: u32,
    },

    /// Overwrite one stored progress field without any checks
    Set {
        #[arg(value_parser = parse_course)]
        course: Course,

        #[arg(value_parser = parse_module_id)]
        id: u32,

        /// started, completed, quiz_passed, quiz_percent or reflection
        #[arg(value_parser = parse_field)]
        field: Field,

        value: String,
    },
}

#[derive(Subcommand)]
enum LessonCommands {
    /// Show lesson track progress
    Status {
        #[arg(value_parser = parse_course)]
        course: Option<Course>,
    },

    /// Mark the next lesson of a track complete
    Complete {
        #[arg(value_parser = parse_course)]
        course: Course,
    },
}

#[derive(Subcommand)]
enum WritingCommands {
    /// Record a submitted essay
    Submit,
}

#[derive(Subcommand)]
enum SpeakingCommands {
    /// Record a speaking attempt
    Record,
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create the profile's student account and log in
    Register {
        #[arg(long, short)]
        name: String,

        #[arg(long, short)]
        email: String,

        #[arg(long, short)]
        password: String,
    },

    /// Log in with the registered details
    Login {
        #[arg(long, short)]
        email: String,

        #[arg(long, short)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show who is logged in
    Status,
}

fn parse_course(s: &str) -> Result<Course, String> {
    Course::from_str(s).ok_or_else(|| format!("Invalid course '{}'. Use: ielts or toefl", s))
}

fn parse_module_id(s: &str) -> Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(id) if (1..=MODULES_PER_COURSE).contains(&id) => Ok(id),
        _ => Err(format!(
            "Invalid module '{}'. Use a number from 1 to {}",
            s, MODULES_PER_COURSE
        )),
    }
}

fn parse_field(s: &str) -> Result<Field, String> {
    Field::from_str(s).ok_or_else(|| {
        format!(
            "Invalid field '{}'. Use: started, completed, quiz_passed, quiz_percent or reflection",
            s
        )
    })
}

fn parse_scored_skill(s: &str) -> Result<Skill, String> {
    match Skill::from_str(s) {
        Some(skill @ (Skill::Reading | Skill::Listening)) => Ok(skill),
        _ => Err(format!("Invalid skill '{}'. Use: reading or listening", s)),
    }
}

/// Scores a multiple-choice sheet against its key. Choices are compared
/// case-insensitively; a missing or blank choice is unanswered.
fn answer_sheet_score(choices: &str, key: &str) -> QuizScore {
    let picked = split_answers(choices);
    let selections: Vec<Option<bool>> = split_answers(key)
        .iter()
        .enumerate()
        .map(|(i, answer)| match picked.get(i) {
            Some(choice) if !choice.is_empty() => Some(choice.eq_ignore_ascii_case(answer)),
            _ => None,
        })
        .collect();
    QuizScore::multiple_choice(&selections)
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("CLASSROOM_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("classroom");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

/// Opens the profile database, or an in-process store when it cannot be used.
fn open_store(path: &Path) -> Box<dyn KeyValueStore> {
    let opened = SqliteStore::open(path).and_then(|store| {
        store.init()?;
        Ok(store)
    });

    match opened {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "profile storage unavailable, progress will not be saved"
            );
            Box::new(MemoryStore::new())
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("classroom=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let store = open_store(&db_path);
    let storage = Storage::new(store.as_ref());
    let tracker = Tracker::new(storage);
    let activity = Activity::new(storage);
    let accounts = Accounts::new(storage);

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Profile initialized at: {}", db_path.display());
            }
        }

        Commands::Module(module_cmd) => {
            let (course, id, action) = match module_cmd {
                ModuleCommands::Status { course, id: Some(id) } => {
                    let state = tracker.get_state(course, id);
                    let unlocked = tracker.is_unlocked(course, id);
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "course": course,
                                "state": state,
                                "unlocked": unlocked,
                                "page": course.module_page(id),
                                "estimated_time": course.estimated_time(id),
                            })))?
                        );
                    } else {
                        let status = models::ModuleStatus::of(&state, unlocked);
                        println!("{} Module {}", course.label(), id);
                        println!("Status: {} {}", status.icon(), status.label());
                        println!("Phase: {}", state.phase().label());
                        println!("Quiz passed: {}", yes_no(state.quiz_passed));
                        if let Some(percent) = state.quiz_percent {
                            println!("Last quiz score: {}%", percent);
                        }
                        if let Some(estimate) = course.estimated_time(id) {
                            println!("Estimated time: {}", estimate);
                        }
                        if !state.reflection.is_empty() {
                            println!("Reflection: {}", truncate(&state.reflection, 60));
                        }
                        println!("Page: {}", course.module_page(id));
                    }
                    return Ok(());
                }
                ModuleCommands::Status { course, id: None } => {
                    let summary = tracker.summary(course);
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&summary))?);
                    } else {
                        print_course(&summary);
                    }
                    return Ok(());
                }
                ModuleCommands::Set {
                    course,
                    id,
                    field,
                    value,
                } => {
                    tracker.set_field(course, id, field, &value);
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!(
                            "Set {} for {} module {}.",
                            field.as_str(),
                            course.label(),
                            id
                        );
                    }
                    return Ok(());
                }
                ModuleCommands::Visit { course, id } => (course, id, Action::Visit),
                ModuleCommands::Quiz {
                    course,
                    id,
                    correct,
                    total,
                    answered,
                    choices,
                    key,
                } => {
                    let score = match (choices, key) {
                        (Some(choices), Some(key)) => answer_sheet_score(&choices, &key),
                        _ => {
                            let total = total.unwrap_or(0);
                            let correct = correct.unwrap_or(0);
                            QuizScore::from_counts(correct, answered.unwrap_or(total), total)
                        }
                    };
                    (course, id, Action::SubmitQuiz(score))
                }
                ModuleCommands::Reflect { course, id, text } => {
                    (course, id, Action::SaveReflection(text))
                }
                ModuleCommands::Complete {
                    course,
                    id,
                    checked,
                    items,
                } => (
                    course,
                    id,
                    Action::MarkComplete(Checklist::new(checked, items)),
                ),
            };

            let result = tracker.apply(course, id, &action);
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&result))?);
            } else {
                println!("{}", result.message);
            }
        }

        Commands::Dashboard => {
            let summaries: Vec<_> = Course::ALL.iter().map(|&c| tracker.summary(c)).collect();
            let lessons: Vec<_> = Course::ALL
                .iter()
                .map(|&c| activity.lesson_progress(c))
                .collect();
            let session = accounts.session();

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "session": session,
                        "courses": summaries,
                        "lessons": lessons,
                        "skills": activity.skill_progress(),
                    })))?
                );
            } else {
                println!("{}", Session::status_line(session.as_ref()));
                for summary in &summaries {
                    println!();
                    print_course(summary);
                }
                println!();
                println!("=== Lesson Tracks ===");
                for lesson in &lessons {
                    println!("{:<6} {}", lesson.course.label(), lesson.label());
                }
            }
        }

        Commands::Resume { course } => {
            let link = tracker.first_incomplete_module_link(course, course.total_modules());
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "course": course,
                        "link": link,
                        "module": course.module_from_page(&link),
                    })))?
                );
            } else {
                println!("{}", link);
            }
        }

        Commands::Lesson(lesson_cmd) => match lesson_cmd {
            LessonCommands::Status { course } => {
                let courses = match course {
                    Some(c) => vec![c],
                    None => Course::ALL.to_vec(),
                };
                let progress: Vec<_> = courses
                    .iter()
                    .map(|&c| activity.lesson_progress(c))
                    .collect();
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&progress))?);
                } else {
                    for p in &progress {
                        println!("{:<6} {}", p.course.label(), p.label());
                        println!("       Start with: {}", p.next_lesson);
                    }
                }
            }

            LessonCommands::Complete { course } => {
                let progress = activity.complete_lesson(course);
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&progress))?);
                } else {
                    println!("{} {}", course.label(), progress.label());
                }
            }
        },

        Commands::Score {
            skill,
            answers,
            key,
        } => {
            let attempts = split_answers(&answers);
            let solutions = split_answers(&key);
            if solutions.is_empty() {
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Answer key is empty"))?
                    );
                } else {
                    println!("Answer key is empty.");
                }
                return Ok(());
            }

            let pairs = solutions
                .iter()
                .enumerate()
                .map(|(i, &solution)| (attempts.get(i).copied().unwrap_or(""), solution));
            let score = QuizScore::free_text(pairs);
            let saved = activity.record_score(skill, &score, Utc::now());

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&saved))?);
            } else {
                println!("{}", saved.feedback(skill));
            }
        }

        Commands::Writing(WritingCommands::Submit) => {
            let count = activity.submit_writing();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "writing_submissions": count
                    })))?
                );
            } else {
                println!("Writing submitted. Total submissions: {}", count);
            }
        }

        Commands::Speaking(SpeakingCommands::Record) => {
            let count = activity.record_speaking();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "speaking_recordings": count
                    })))?
                );
            } else {
                println!("Speaking attempt recorded. Total recordings: {}", count);
            }
        }

        Commands::Skills => {
            let progress = activity.skill_progress();
            let metrics = activity.metrics();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "progress": progress,
                        "metrics": metrics,
                    })))?
                );
            } else {
                println!("=== Skill Progress ===");
                for p in &progress {
                    println!("{:<10} {:>3}%", p.skill.label(), p.percent);
                }
                println!();
                for (skill, score) in [
                    (Skill::Reading, &metrics.reading),
                    (Skill::Listening, &metrics.listening),
                ] {
                    match score {
                        Some(s) => println!(
                            "{} score: {}/{} ({}%)",
                            skill.label(),
                            s.correct,
                            s.total,
                            s.percent
                        ),
                        None => println!("{} score: -", skill.label()),
                    }
                }
                println!("Writing submissions: {}", metrics.writing_submissions);
                println!("Speaking recordings: {}", metrics.speaking_recordings);
            }
        }

        Commands::Account(account_cmd) => {
            let result = match account_cmd {
                AccountCommands::Register {
                    name,
                    email,
                    password,
                } => accounts.register(&name, &email, &password).map(Some),
                AccountCommands::Login { email, password } => {
                    accounts.login(&email, &password).map(Some)
                }
                AccountCommands::Logout => {
                    accounts.logout();
                    Ok(None)
                }
                AccountCommands::Status => Ok(accounts.session()),
            };

            match result {
                Ok(session) => {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&session))?);
                    } else {
                        println!("{}", Session::status_line(session.as_ref()));
                    }
                }
                Err(e) => {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::<()>::err(e.to_string()))?
                        );
                    } else {
                        println!("{}", e);
                    }
                }
            }
        }

        Commands::Timer {
            page,
            minutes,
            reset,
        } => {
            let mut practice = PracticeTimer::load(storage, &page, minutes);
            if reset {
                practice.reset();
            }
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "page": timer::page_id(&page),
                        "remaining": practice.remaining(),
                        "initial": practice.initial(),
                        "display": practice.display(),
                    })))?
                );
            } else {
                println!("Time left: {}", practice.display());
            }
        }

        Commands::Tui => {
            tui::run(storage)?;
        }
    }

    Ok(())
}

fn print_course(summary: &models::CourseSummary) {
    println!(
        "=== {} Modules: {}/{} complete ({}%) ===",
        summary.course.label(),
        summary.completed_count,
        summary.total,
        summary.percent
    );
    for module in &summary.modules {
        println!(
            "{} Module {:<3} {}",
            module.status.icon(),
            module.state.module_id,
            module.status.label()
        );
    }
    println!("Resume: {}", summary.resume_link);
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
