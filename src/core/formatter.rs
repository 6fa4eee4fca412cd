//! Pattern parsing and record rendering
//!
//! A pattern is compiled once into a token list when a logger is built, so
//! malformed patterns fail before any record is logged.
//!
//! | Token | Output |
//! |---|---|
//! | `%d{fmt}` | local time, `fmt` in strftime syntax (`%d` alone uses `%H:%M:%S`) |
//! | `%t` | thread id |
//! | `%c` | logger name |
//! | `%f` | source file |
//! | `%l` | source line |
//! | `%p` | level name |
//! | `%T` | tab |
//! | `%m` | message |
//! | `%n` | newline |
//! | `%%` | literal `%` |

use super::{
    error::{LoggerError, Result},
    record::LogRecord,
};
use chrono::format::{Item, StrftimeItems};
use std::fmt::Write as _;

/// Pattern used when a logger is built without one
pub const DEFAULT_PATTERN: &str = "[%d{%y-%m-%d|%H:%M:%S}][%t][%c][%f:%l][%p]%T%m%n";

/// Time format used by a bare `%d`
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Time(String),
    ThreadId,
    LoggerName,
    File,
    Line,
    Level,
    Tab,
    Message,
    Newline,
}

/// Compiled log pattern
///
/// # Example
///
/// ```
/// use rust_log_relay::{Formatter, LogLevel, LogRecord};
///
/// let formatter = Formatter::new("[%p][%c] %m%n").unwrap();
/// let record = LogRecord::new(LogLevel::Info, "main.rs", 3, "app", "ready");
/// assert_eq!(formatter.render(&record), "[INFO][app] ready\n");
///
/// assert!(Formatter::new("%q").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Formatter {
    pattern: String,
    tokens: Vec<Token>,
}

impl Formatter {
    /// Compile `pattern`, failing on unknown tokens, a dangling `%`, an
    /// unclosed `%d{` or an invalid time format.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            tokens: Self::parse(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn parse(pattern: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            let directive = chars
                .next()
                .ok_or_else(|| LoggerError::pattern(pattern, "dangling '%' at end of pattern"))?;

            let token = match directive {
                '%' => {
                    literal.push('%');
                    continue;
                }
                'd' => {
                    let format = if chars.peek() == Some(&'{') {
                        chars.next();
                        let mut sub = String::new();
                        loop {
                            match chars.next() {
                                Some('}') => break,
                                Some(ch) => sub.push(ch),
                                None => {
                                    return Err(LoggerError::pattern(pattern, "unclosed '{' after %d"))
                                }
                            }
                        }
                        sub
                    } else {
                        DEFAULT_TIME_FORMAT.to_string()
                    };
                    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
                        return Err(LoggerError::pattern(
                            pattern,
                            format!("invalid time format '{}'", format),
                        ));
                    }
                    Token::Time(format)
                }
                't' => Token::ThreadId,
                'c' => Token::LoggerName,
                'f' => Token::File,
                'l' => Token::Line,
                'p' => Token::Level,
                'T' => Token::Tab,
                'm' => Token::Message,
                'n' => Token::Newline,
                other => {
                    return Err(LoggerError::pattern(
                        pattern,
                        format!("unknown token '%{}'", other),
                    ))
                }
            };

            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(token);
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Ok(tokens)
    }

    /// Render `record` into a new string
    pub fn render(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(self.pattern.len() + record.message().len() + 64);
        self.render_into(record, &mut out);
        out
    }

    /// Append the rendering of `record` to `out`
    pub fn render_into(&self, record: &LogRecord, out: &mut String) {
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Time(format) => {
                    let _ = write!(out, "{}", record.local_time().format(format));
                }
                Token::ThreadId => out.push_str(record.thread_id()),
                Token::LoggerName => out.push_str(record.logger()),
                Token::File => out.push_str(record.file()),
                Token::Line => {
                    let _ = write!(out, "{}", record.line());
                }
                Token::Level => out.push_str(record.level().to_str()),
                Token::Tab => out.push('\t'),
                Token::Message => out.push_str(record.message()),
                Token::Newline => out.push('\n'),
            }
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            tokens: vec![
                Token::Literal("[".into()),
                Token::Time("%y-%m-%d|%H:%M:%S".into()),
                Token::Literal("][".into()),
                Token::ThreadId,
                Token::Literal("][".into()),
                Token::LoggerName,
                Token::Literal("][".into()),
                Token::File,
                Token::Literal(":".into()),
                Token::Line,
                Token::Literal("][".into()),
                Token::Level,
                Token::Literal("]".into()),
                Token::Tab,
                Token::Message,
                Token::Newline,
            ],
        }
    }
}
