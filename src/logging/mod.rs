//! Logging and output control
//!
//! This module provides the [`Logger`] used by the endpoint caller and the CLI.
//! Endpoint providers never log; everything user-visible goes through here.

use reqwest::{Method, StatusCode};
use std::time::{Duration, Instant};

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    /// Sub-section heading
    pub fn subsection(&self, title: &str) {
        if !self.quiet {
            println!("\n--- {} ---", title);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("📝 {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  WARNING: {}", message);
        }
    }

    /// Error message, printed even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("   {}", message);
        }
    }

    /// Outgoing registry request
    pub fn request(&self, method: &Method, url: &str) {
        self.verbose(&format!("{} {}", method, url));
    }

    /// Registry response status with the time spent waiting for it
    pub fn response(&self, status: StatusCode, elapsed: Duration) {
        self.detail(&format!("<- {} ({})", status, self.format_duration(elapsed)));
    }

    /// Key-value pair summary display
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            self.subsection(title);
            for (key, value) in items {
                println!("  {}: {}", key, value);
            }
        }
    }

    /// Format byte counts in human-readable units
    pub fn format_size(&self, bytes: u64) -> String {
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else if bytes < 1024 * 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }

    /// Format duration; sub-second durations are shown in milliseconds
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs == 0 {
            format!("{}ms", duration.as_millis())
        } else if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }

    /// Time since the logger was created
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_size(512), "512 B");
        assert_eq!(logger.format_size(2048), "2.0 KB");
        assert_eq!(logger.format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_duration() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(logger.format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(logger.format_duration(Duration::from_secs(125)), "2m5s");
        assert_eq!(logger.format_duration(Duration::from_secs(3725)), "1h2m5s");
    }

    #[test]
    fn test_elapsed_without_start_time() {
        let mut logger = Logger::new_quiet();
        logger.start_time = None;
        assert_eq!(logger.elapsed(), Duration::ZERO);

        let logger = Logger::new_quiet();
        std::thread::sleep(Duration::from_millis(5));
        assert!(logger.elapsed() >= Duration::from_millis(5));
    }
}
