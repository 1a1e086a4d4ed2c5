//! Line-oriented property file loading.
//!
//! # Data Flow
//! ```text
//! physical line
//!     → length check on raw bytes (too long: warn, skip to next newline)
//!     → strip from first '#'   (`\#` is a literal '#')
//!     → trim                   (empty: skip)
//!     → split at first '='     (no '=' or empty side: warn, skip)
//!     → interpreted? substitute $(name), warn on duplicate key
//!     → put into the map, value copied into the map's arena
//! ```
//!
//! # Design Decisions
//! - A bad line never aborts the load; only I/O and allocation failures do
//! - Duplicate keys always overwrite with a warning; there is no strict mode
//! - Non UTF-8 bytes are replaced rather than rejected

pub mod substitution;

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::config::schema::PropmapConfig;
use crate::error::{PropertyError, Result};
use crate::map::PropertyMap;
use crate::observability::metrics;
use substitution::{ProcessEnv, VariableSource};

/// How values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Treatment {
    /// Store values exactly as written.
    Raw,
    /// Expand `$(name)` tokens and report duplicate keys.
    #[default]
    Interpreted,
}

/// What happened to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Accepted,
    Blank,
    Malformed,
    TooLong,
}

impl LineOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineOutcome::Accepted => "accepted",
            LineOutcome::Blank => "blank",
            LineOutcome::Malformed => "malformed",
            LineOutcome::TooLong => "too_long",
        }
    }
}

/// Per-outcome line counts for one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub accepted: usize,
    pub blank: usize,
    pub malformed: usize,
    pub too_long: usize,
    /// Last-modified time of the source file, when loaded from disk.
    pub modified: Option<SystemTime>,
}

impl LoadReport {
    fn record(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Accepted => self.accepted += 1,
            LineOutcome::Blank => self.blank += 1,
            LineOutcome::Malformed => self.malformed += 1,
            LineOutcome::TooLong => self.too_long += 1,
        }
    }

    pub fn lines(&self) -> usize {
        self.accepted + self.blank + self.malformed + self.too_long
    }

    pub fn rejected(&self) -> usize {
        self.malformed + self.too_long
    }
}

/// Cut `line` at the first unescaped `#`.
fn strip_comment(line: &str) -> Cow<'_, str> {
    if !line.contains("\\#") {
        return Cow::Borrowed(match line.find('#') {
            Some(i) => &line[..i],
            None => line,
        });
    }

    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

impl PropertyMap {
    /// Parse one `key=value` line into the map.
    pub fn read_property(&mut self, line: &str, treatment: Treatment) -> Result<LineOutcome> {
        self.read_property_with(line, treatment, &ProcessEnv)
    }

    /// Parse one `key=value` line, resolving variables against `env`.
    ///
    /// Rejected lines are logged and reported as an outcome; only an
    /// allocation failure is an error.
    pub fn read_property_with(
        &mut self,
        line: &str,
        treatment: Treatment,
        env: &dyn VariableSource,
    ) -> Result<LineOutcome> {
        let max = self.limits().max_line_length;
        let outcome = if line.len() > max {
            too_long(line.len(), max)
        } else {
            self.parse_line(line, treatment, env)?
        };
        metrics::record_line(outcome.as_str());
        Ok(outcome)
    }

    fn parse_line(
        &mut self,
        line: &str,
        treatment: Treatment,
        env: &dyn VariableSource,
    ) -> Result<LineOutcome> {
        let stripped = strip_comment(line);
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            return Ok(LineOutcome::Blank);
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            tracing::warn!(line = trimmed, "Missing '=' in property line, ignoring entry");
            return Ok(LineOutcome::Malformed);
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            tracing::warn!(line = trimmed, "Empty key or value in property line, ignoring entry");
            return Ok(LineOutcome::Malformed);
        }

        let value = match treatment {
            Treatment::Raw => Cow::Borrowed(value),
            Treatment::Interpreted => {
                let expanded = self.replace_variables_with(value, env);
                if let Some(old) = self.get_str(key) {
                    tracing::warn!(
                        key,
                        old,
                        new = %expanded,
                        "Duplicate key detected - previous value will be overwritten"
                    );
                }
                Cow::Owned(expanded)
            }
        };

        tracing::debug!(key, value = %value, "Adding property to map");
        self.put_str(key, &value)?;
        Ok(LineOutcome::Accepted)
    }

    /// Load every line of `reader`.
    pub fn read_properties_from<R: BufRead>(
        &mut self,
        reader: R,
        treatment: Treatment,
    ) -> Result<LoadReport> {
        self.load_lines(reader, treatment, &ProcessEnv, Path::new("<stream>"))
    }

    /// Load a properties file, recording its last-modified time.
    pub fn read_properties(&mut self, path: &Path, treatment: Treatment) -> Result<LoadReport> {
        self.read_properties_with(path, treatment, &ProcessEnv)
    }

    /// Load a properties file, resolving variables against `env`.
    pub fn read_properties_with(
        &mut self,
        path: &Path,
        treatment: Treatment,
        env: &dyn VariableSource,
    ) -> Result<LoadReport> {
        let io_err = |source: io::Error| PropertyError::Io {
            path: path.to_path_buf(),
            source,
        };
        let metadata = fs::metadata(path).map_err(io_err)?;
        let file = File::open(path).map_err(io_err)?;

        let mut report = self.load_lines(BufReader::new(file), treatment, env, path)?;
        report.modified = metadata.modified().ok();

        tracing::info!(
            path = %path.display(),
            accepted = report.accepted,
            rejected = report.rejected(),
            entries = self.len(),
            "Properties loaded"
        );
        Ok(report)
    }

    fn load_lines<R: BufRead>(
        &mut self,
        mut reader: R,
        treatment: Treatment,
        env: &dyn VariableSource,
        origin: &Path,
    ) -> Result<LoadReport> {
        let max = self.limits().max_line_length;
        let mut report = LoadReport::default();
        let mut buf = Vec::new();
        loop {
            let raw = read_line_capped(&mut reader, &mut buf, max).map_err(|source| {
                PropertyError::Io {
                    path: PathBuf::from(origin),
                    source,
                }
            })?;
            let outcome = match raw {
                RawLine::Eof => break,
                RawLine::TooLong(length) => too_long(length, max),
                RawLine::Line(length) => {
                    let text = String::from_utf8_lossy(&buf[..length]);
                    self.parse_line(&text, treatment, env)?
                }
            };
            metrics::record_line(outcome.as_str());
            report.record(outcome);
        }
        metrics::record_entries(self.len());
        Ok(report)
    }
}

/// A physical line as read from the source.
enum RawLine {
    Eof,
    /// Content length, excluding the line terminator.
    Line(usize),
    /// Bytes seen before giving up on the line.
    TooLong(usize),
}

fn too_long(length: usize, max: usize) -> LineOutcome {
    tracing::warn!(length, max, "Line too long, ignoring entry");
    LineOutcome::TooLong
}

/// Read one physical line into `buf`, buffering at most `max` content bytes
/// plus a CRLF terminator. Longer lines are skipped up to the next newline.
fn read_line_capped<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> io::Result<RawLine> {
    buf.clear();
    let cap = max.saturating_add(2);
    let n = (&mut *reader).take(cap as u64).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(RawLine::Eof);
    }
    if n == cap && buf.last() != Some(&b'\n') {
        return Ok(RawLine::TooLong(n + skip_line(reader)?));
    }

    let mut length = buf.len();
    if buf[..length].ends_with(b"\n") {
        length -= 1;
    }
    if buf[..length].ends_with(b"\r") {
        length -= 1;
    }
    if length > max {
        return Ok(RawLine::TooLong(length));
    }
    Ok(RawLine::Line(length))
}

/// Discard input through the next newline, returning the bytes skipped.
fn skip_line<R: BufRead>(reader: &mut R) -> io::Result<usize> {
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(skipped + i + 1);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

/// Open a map per `config`, load `path` into it and resolve references.
///
/// Reference failures are logged; the map keeps every entry that did
/// resolve.
pub fn load_properties(path: &Path, config: &PropmapConfig) -> Result<(PropertyMap, LoadReport)> {
    let mut map = PropertyMap::from_config(&config.map);
    let report = map.read_properties(path, config.map.treatment)?;

    if config.resolve.enabled {
        let resolve = &config.resolve;
        if let Err(e) = map.resolve_references(&resolve.prefix, resolve.wildcard, 0) {
            tracing::error!(path = %path.display(), error = %e, "Reference resolution incomplete");
        }
    }
    Ok((map, report))
}

/// Whether `path` changed after `since`.
pub fn is_stale(path: &Path, since: SystemTime) -> io::Result<bool> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(modified > since)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::map::Limits;
    use std::collections::HashMap;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("a=b # note"), "a=b ");
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("color=\\#fff # hex"), "color=#fff ");
        assert_eq!(strip_comment("plain"), "plain");
    }

    #[test]
    fn test_line_outcomes() {
        let mut map = PropertyMap::new();
        let env = no_env();
        let t = Treatment::Interpreted;

        let mut read = |line: &str| map.read_property_with(line, t, &env).unwrap();
        assert_eq!(read("  key = value  "), LineOutcome::Accepted);
        assert_eq!(read("   "), LineOutcome::Blank);
        assert_eq!(read("# comment"), LineOutcome::Blank);
        assert_eq!(read("novalue"), LineOutcome::Malformed);
        assert_eq!(read("=value"), LineOutcome::Malformed);
        assert_eq!(read("key=  # empty"), LineOutcome::Malformed);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get_str("key"), Some("value"));
    }

    #[test]
    fn test_split_at_first_equals() {
        let mut map = PropertyMap::new();
        map.read_property_with("url = a=b=c", Treatment::Raw, &no_env()).unwrap();
        assert_eq!(map.get_str("url"), Some("a=b=c"));
    }

    #[test]
    fn test_line_too_long() {
        let limits = Limits {
            max_line_length: 16,
            ..Limits::default()
        };
        let mut map = PropertyMap::with_arena(Arena::default(), limits);
        let outcome = map
            .read_property_with("key=0123456789abcdef", Treatment::Raw, &no_env())
            .unwrap();
        assert_eq!(outcome, LineOutcome::TooLong);
        assert!(map.is_empty());

        let line = format!("k={}", "v".repeat(8190));
        let mut map = PropertyMap::new();
        let outcome = map.read_property_with(&line, Treatment::Raw, &no_env()).unwrap();
        assert_eq!(outcome, LineOutcome::Accepted);
        let line = format!("k={}", "v".repeat(8191));
        let outcome = map.read_property_with(&line, Treatment::Raw, &no_env()).unwrap();
        assert_eq!(outcome, LineOutcome::TooLong);
    }

    #[test]
    fn test_raw_keeps_tokens() {
        let mut map = PropertyMap::new();
        map.put_str("host", "example.com").unwrap();
        map.read_property_with("url=http://$(host)/", Treatment::Raw, &no_env()).unwrap();
        assert_eq!(map.get_str("url"), Some("http://$(host)/"));
    }

    #[test]
    fn test_interpreted_substitutes_and_overwrites() {
        let mut map = PropertyMap::new();
        let env = no_env();
        map.read_property_with("host=example.com", Treatment::Interpreted, &env).unwrap();
        map.read_property_with("url=http://$(host)/", Treatment::Interpreted, &env).unwrap();
        map.read_property_with("url=https://$(host)/", Treatment::Interpreted, &env).unwrap();

        assert_eq!(map.get_str("url"), Some("https://example.com/"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_reader_load_report() {
        let text = "\
# workers
worker.list=lb,status
worker.lb.type=lb

broken line
worker.lb.balance_workers = a, b  # inline comment
";
        let mut map = PropertyMap::new();
        let report = map
            .read_properties_from(text.as_bytes(), Treatment::Interpreted)
            .unwrap();

        assert_eq!(report.accepted, 3);
        assert_eq!(report.blank, 2);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.lines(), 6);
        assert!(report.modified.is_none());
        assert_eq!(map.get_str("worker.lb.balance_workers"), Some("a, b"));
    }

    #[test]
    fn test_crlf_and_invalid_utf8() {
        let bytes: &[u8] = b"a=1\r\nb=\xff2\r\n";
        let mut map = PropertyMap::new();
        let report = map.read_properties_from(bytes, Treatment::Raw).unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(map.get_str("a"), Some("1"));
        assert_eq!(map.get_str("b"), Some("\u{fffd}2"));

        // Length is measured on the raw bytes, before replacement chars.
        let mut line = b"k=".to_vec();
        line.extend(std::iter::repeat(0xff).take(3000));
        line.push(b'\n');
        let mut map = PropertyMap::new();
        let report = map.read_properties_from(&line[..], Treatment::Raw).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.too_long, 0);
        assert_eq!(map.get_str("k").map(|v| v.chars().count()), Some(3000));
    }

    #[test]
    fn test_long_line_skipped_without_buffering() {
        let limits = Limits {
            max_line_length: 8,
            ..Limits::default()
        };
        let text = format!("a=1\nlong={}\nb=12345\r\nc=1234567\n{}", "x".repeat(100), "d=9");
        let reader = BufReader::with_capacity(4, text.as_bytes());

        let mut map = PropertyMap::with_arena(Arena::default(), limits);
        let report = map.read_properties_from(reader, Treatment::Raw).unwrap();

        assert_eq!(report.accepted, 3);
        assert_eq!(report.too_long, 2);
        assert_eq!(map.get_str("a"), Some("1"));
        assert_eq!(map.get_str("b"), Some("12345"));
        assert_eq!(map.get_str("c"), None);
        assert_eq!(map.get_str("d"), Some("9"));
        assert_eq!(map.get_str("long"), None);
    }

    #[test]
    fn test_unterminated_long_line_at_eof() {
        let limits = Limits {
            max_line_length: 4,
            ..Limits::default()
        };
        let mut map = PropertyMap::with_arena(Arena::default(), limits);
        let report = map
            .read_properties_from("a=1\nk=123456789".as_bytes(), Treatment::Raw)
            .unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.too_long, 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut map = PropertyMap::new();
        let err = map
            .read_properties(Path::new("/nonexistent/propmap/workers.properties"), Treatment::Raw)
            .unwrap_err();
        assert!(matches!(err, PropertyError::Io { .. }));
    }
}
