//! Console sink implementation

use crate::core::{LogLevel, LogRecord, Result, Sink};
use colored::Colorize;
use std::borrow::Cow;
use std::io::Write;

/// Writes to stdout, optionally coloring the level name of each line
pub struct ConsoleSink {
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn write(&self, text: &[u8]) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(text)?;
        Ok(())
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

fn is_token_edge(c: Option<char>) -> bool {
    c.map_or(true, |c| !(c.is_alphanumeric() || c == '-' || c == '_'))
}

/// Offset of `name` rendered as `[NAME]`
fn bracketed_at(line: &str, name: &str) -> Option<usize> {
    line.match_indices(name)
        .map(|(pos, _)| pos)
        .find(|&pos| line[..pos].ends_with('[') && line[pos + name.len()..].starts_with(']'))
}

/// Offset of `name` standing alone, so `INFO-proxy` or `INFORMATION` never match
fn token_at(line: &str, name: &str) -> Option<usize> {
    line.match_indices(name).map(|(pos, _)| pos).find(|&pos| {
        is_token_edge(line[..pos].chars().next_back())
            && is_token_edge(line[pos + name.len()..].chars().next())
    })
}

fn level_at(line: &str, level: LogLevel) -> Option<usize> {
    let name = level.to_str();
    bracketed_at(line, name).or_else(|| token_at(line, name))
}

fn paint(line: &str, pos: usize, level: LogLevel) -> String {
    let name = level.to_str();
    let colored = name.color(level.color_code()).to_string();
    let mut out = String::with_capacity(line.len() + colored.len());
    out.push_str(&line[..pos]);
    out.push_str(&colored);
    out.push_str(&line[pos + name.len()..]);
    out
}

/// Color `level`'s name where the pattern rendered it
fn colorize_level(line: &str, level: LogLevel) -> Cow<'_, str> {
    match level_at(line, level) {
        Some(pos) => Cow::Owned(paint(line, pos, level)),
        None => Cow::Borrowed(line),
    }
}

/// Color the level name on each line, preferring a bracketed one
fn colorize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for line in text.split_inclusive('\n') {
        let earliest = |find: fn(&str, &str) -> Option<usize>| {
            LogLevel::ALL
                .iter()
                .filter_map(|level| find(line, level.to_str()).map(|pos| (pos, *level)))
                .min_by_key(|(pos, _)| *pos)
        };
        match earliest(bracketed_at).or_else(|| earliest(token_at)) {
            Some((pos, level)) => out.push_str(&paint(line, pos, level)),
            None => out.push_str(line),
        }
    }
    out
}

impl Sink for ConsoleSink {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        if !self.use_colors {
            return self.write(data);
        }
        let text = String::from_utf8_lossy(data);
        self.write(colorize_lines(&text).as_bytes())
    }

    fn log_record(&mut self, record: &LogRecord, rendered: &[u8]) -> Result<()> {
        if !self.use_colors {
            return self.write(rendered);
        }
        let text = String::from_utf8_lossy(rendered);
        self.write(colorize_level(&text, record.level()).as_bytes())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_keeps_text_without_level() {
        assert_eq!(colorize_lines("plain text\n"), "plain text\n");
        assert!(matches!(
            colorize_level("no level here", LogLevel::Info),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_colorize_preserves_surrounding_text() {
        let colored = colorize_lines("[12:00:00][WARN] disk INFO\n[ERROR] x\n");
        let lines: Vec<&str> = colored.split_inclusive('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[12:00:00]["));
        assert!(lines[0].ends_with("] disk INFO\n"));
        assert!(lines[0].contains("WARN"));
        assert!(lines[1].contains("ERROR"));
    }

    #[test]
    fn test_level_found_at_rendered_position() {
        // Logger names that start with a level name are not the level
        let line = "[12:00:00][INFO-proxy][WARN] upstream slow\n";
        assert_eq!(level_at(line, LogLevel::Warn), Some(23));
        assert_eq!(level_at(line, LogLevel::Info), None);

        let line = "[INFO-proxy][INFO] started\n";
        assert_eq!(level_at(line, LogLevel::Info), Some(13));

        let line = "INFO-proxy INFO started\n";
        assert_eq!(level_at(line, LogLevel::Info), Some(11));
        assert_eq!(level_at("INFORMATION only", LogLevel::Info), None);
    }

    #[test]
    fn test_colorize_leaves_logger_name_alone() {
        let line = "[INFO-proxy][WARN] upstream slow\n";
        let colored = colorize_level(line, LogLevel::Warn);
        assert!(colored.starts_with("[INFO-proxy]["));
        assert!(colored.ends_with("] upstream slow\n"));

        let colored = colorize_lines("disk INFO [ERROR] x\n");
        assert!(colored.starts_with("disk INFO ["));
    }

    #[test]
    fn test_console_sink_writes() {
        let mut sink = ConsoleSink::with_colors(true);
        assert!(sink.log(b"[INFO] console sink test\n").is_ok());
        assert!(sink.flush().is_ok());
        assert_eq!(sink.name(), "console");
    }
}
