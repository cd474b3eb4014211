use std::time::{Duration, Instant};

use crate::store::Storage;

pub const DEFAULT_MINUTES: u32 = 30;
pub const MIN_SECONDS: u32 = 60;

const TICK: Duration = Duration::from_secs(1);

/// Countdown for a timed practice page. Remaining seconds are persisted on
/// every change so a reopened page resumes where it left off.
pub struct PracticeTimer<'a> {
    storage: Storage<'a>,
    key: String,
    initial: u32,
    remaining: u32,
    next_tick: Option<Instant>,
}

impl<'a> PracticeTimer<'a> {
    pub fn load(storage: Storage<'a>, page: &str, minutes: u32) -> Self {
        let key = format!("classroom_practice_timer_{}", page_id(page));
        let initial = minutes.saturating_mul(60).max(MIN_SECONDS);
        let remaining = match storage.read_count(&key) {
            0 => initial,
            persisted => persisted,
        };
        Self {
            storage,
            key,
            initial,
            remaining,
            next_tick: None,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn initial(&self) -> u32 {
        self.initial
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Schedules the first tick one second from `now`. No-op while running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.next_tick = Some(now + TICK);
        true
    }

    /// Fires every tick that has come due by `now` and returns how many fired.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let mut fired = 0;
        while let Some(due) = self.next_tick {
            if now < due {
                break;
            }
            self.tick();
            fired += 1;
            if let Some(next) = self.next_tick.as_mut() {
                *next = due + TICK;
            }
        }
        fired
    }

    fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.next_tick = None;
            tracing::debug!(key = self.key.as_str(), "practice timer finished");
        }
        self.persist();
    }

    pub fn pause(&mut self) {
        self.next_tick = None;
        self.persist();
    }

    pub fn reset(&mut self) {
        self.next_tick = None;
        self.remaining = self.initial;
        self.persist();
    }

    fn persist(&self) {
        self.storage.write(&self.key, &self.remaining.to_string());
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }
}

/// Last path segment of a page, or `default` when there is none.
pub fn page_id(page: &str) -> &str {
    match page.rsplit('/').next() {
        Some(last) if !last.is_empty() => last,
        _ => "default",
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const PAGE: &str = "classroom-practice-tests.html";
    const KEY: &str = "classroom_practice_timer_classroom-practice-tests.html";

    mod load_tests {
        use super::*;

        #[test]
        fn fresh_timer_uses_duration() {
            let store = MemoryStore::new();
            let timer = PracticeTimer::load(Storage::new(&store), PAGE, 30);
            assert_eq!(timer.remaining(), 1800);
            assert!(!timer.is_running());
            assert_eq!(timer.display(), "30:00");
        }

        #[test]
        fn duration_has_a_floor() {
            let store = MemoryStore::new();
            let timer = PracticeTimer::load(Storage::new(&store), PAGE, 0);
            assert_eq!(timer.initial(), 60);
        }

        #[test]
        fn resumes_persisted_value() {
            let store = MemoryStore::new();
            store.insert_raw(KEY, "95");
            let timer = PracticeTimer::load(Storage::new(&store), PAGE, 30);
            assert_eq!(timer.remaining(), 95);
            assert_eq!(timer.display(), "01:35");
        }

        #[test]
        fn ignores_unusable_persisted_value() {
            for raw in ["0", "-5", "soon", ""] {
                let store = MemoryStore::new();
                store.insert_raw(KEY, raw);
                let timer = PracticeTimer::load(Storage::new(&store), PAGE, 2);
                assert_eq!(timer.remaining(), 120, "for '{}'", raw);
            }
        }

        #[test]
        fn page_id_takes_last_segment() {
            assert_eq!(page_id("/a/b/practice.html"), "practice.html");
            assert_eq!(page_id("practice.html"), "practice.html");
            assert_eq!(page_id("/a/b/"), "default");
            assert_eq!(page_id(""), "default");
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn nothing_fires_before_start() {
            let store = MemoryStore::new();
            let mut timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
            let now = Instant::now();

            assert_eq!(timer.poll(now + Duration::from_secs(10)), 0);
            assert_eq!(timer.remaining(), 60);
        }

        #[test]
        fn ticks_once_per_second() {
            let store = MemoryStore::new();
            let mut timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
            let now = Instant::now();

            assert!(timer.start(now));
            assert_eq!(timer.poll(now + Duration::from_millis(999)), 0);
            assert_eq!(timer.poll(now + Duration::from_millis(3500)), 3);
            assert_eq!(timer.remaining(), 57);
            assert_eq!(store.raw(KEY).as_deref(), Some("57"));
        }

        #[test]
        fn start_is_idempotent() {
            let store = MemoryStore::new();
            let mut timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
            let now = Instant::now();

            assert!(timer.start(now));
            assert!(!timer.start(now + Duration::from_millis(500)));
            assert_eq!(timer.poll(now + Duration::from_secs(1)), 1);
        }

        #[test]
        fn stops_at_zero() {
            let store = MemoryStore::new();
            store.insert_raw(KEY, "2");
            let mut timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
            let now = Instant::now();

            timer.start(now);
            assert_eq!(timer.poll(now + Duration::from_secs(10)), 2);
            assert!(timer.is_finished());
            assert!(!timer.is_running());
            assert_eq!(timer.display(), "00:00");
            assert_eq!(store.raw(KEY).as_deref(), Some("0"));
        }

        #[test]
        fn pause_cancels_pending_tick() {
            let store = MemoryStore::new();
            let mut timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
            let now = Instant::now();

            timer.start(now);
            timer.poll(now + Duration::from_secs(1));
            timer.pause();

            assert!(!timer.is_running());
            assert_eq!(timer.poll(now + Duration::from_secs(30)), 0);
            assert_eq!(timer.remaining(), 59);
            assert_eq!(store.raw(KEY).as_deref(), Some("59"));
        }

        #[test]
        fn reset_restores_initial() {
            let store = MemoryStore::new();
            let mut timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
            let now = Instant::now();

            timer.start(now);
            timer.poll(now + Duration::from_secs(5));
            timer.reset();

            assert!(!timer.is_running());
            assert_eq!(timer.remaining(), 60);
            assert_eq!(store.raw(KEY).as_deref(), Some("60"));
        }

        #[test]
        fn finished_timer_restarts_from_initial_on_reload() {
            let store = MemoryStore::new();
            store.insert_raw(KEY, "1");
            {
                let mut timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
                let now = Instant::now();
                timer.start(now);
                timer.poll(now + Duration::from_secs(1));
            }

            let timer = PracticeTimer::load(Storage::new(&store), PAGE, 1);
            assert_eq!(timer.remaining(), 60);
        }
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3600), "60:00");
    }
}
