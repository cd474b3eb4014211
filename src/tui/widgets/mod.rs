pub mod modules;
pub mod skills;
pub mod timer;

/// Ten-cell text bar for a 0-100 percentage.
pub fn progress_bar(percent: u32) -> String {
    let filled = (percent.min(100) / 10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}
