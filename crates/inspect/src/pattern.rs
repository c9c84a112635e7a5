//! Pattern — recognizers for timing markers and error lines.
//!
//! Application consoles print lifecycle lines such as
//! `... started in 1.778s. Listening on: http://0.0.0.0:8080`. Depending on
//! whether the process was attached to a colour-capable terminal, the number
//! may instead be wrapped in an xterm-256 colour sequence:
//!
//! ```text
//! started in \x1b[38;5;188m1.228\x1b[39ms.
//! stopped in \x1b[38;5;188m0.024\x1b[39ms\x1b[39m\x1b[38;5;203m\x1b[39m
//! ```
//!
//! Each event therefore carries an ordered list of variants. The ANSI variant
//! is always tried first; the plain variant only runs when it did not match.

use grep_matcher::{Captures, Matcher};
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

use crate::error::{InspectError, InspectResult};

/// Raw pattern sources.
pub struct Patterns;

impl Patterns {
    // Leading `.*` is greedy: with several markers on a line the last wins.
    pub const STARTED_PLAIN: &'static str = r".* started in ([0-9.]+)s";
    pub const STARTED_ANSI: &'static str = r".* started in .*188m([0-9.]+)";
    pub const STOPPED_PLAIN: &'static str = r".* stopped in ([0-9.]+)s";
    pub const STOPPED_ANSI: &'static str = r".* stopped in .*188m([0-9.]+)";

    /// Prefilter handed to the searcher so only candidate lines reach the sink.
    pub const TIMING_MARKER: &'static str = r" (?:started|stopped) in ";

    /// Compiled case-insensitive.
    pub const ERROR: &'static str = "ERROR";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started,
    Stopped,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Started => "started",
            Event::Stopped => "stopped",
        }
    }
}

/// Recognition variant, listed in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Ansi,
    Plain,
}

impl Variant {
    pub const PRIORITY: [Variant; 2] = [Variant::Ansi, Variant::Plain];
}

/// One compiled `(event, variant)` pattern with a single capture group
/// holding the duration text.
pub struct Recognizer {
    event: Event,
    variant: Variant,
    matcher: RegexMatcher,
}

impl Recognizer {
    pub fn new(event: Event, variant: Variant) -> InspectResult<Self> {
        let pattern = match (event, variant) {
            (Event::Started, Variant::Ansi) => Patterns::STARTED_ANSI,
            (Event::Started, Variant::Plain) => Patterns::STARTED_PLAIN,
            (Event::Stopped, Variant::Ansi) => Patterns::STOPPED_ANSI,
            (Event::Stopped, Variant::Plain) => Patterns::STOPPED_PLAIN,
        };
        Ok(Self {
            event,
            variant,
            matcher: build(pattern, true)?,
        })
    }

    pub fn event(&self) -> Event {
        self.event
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Return the captured duration text if the line matches.
    pub fn capture<'a>(&self, line: &'a [u8]) -> Option<&'a [u8]> {
        let mut caps = self.matcher.new_captures().ok()?;
        if !self.matcher.captures(line, &mut caps).unwrap_or(false) {
            return None;
        }
        let m = caps.get(1)?;
        Some(&line[m.start()..m.end()])
    }
}

/// The four timing recognizers plus the searcher prefilter.
pub struct TimingPatterns {
    started: Vec<Recognizer>,
    stopped: Vec<Recognizer>,
    marker: RegexMatcher,
}

impl TimingPatterns {
    pub fn compile() -> InspectResult<Self> {
        let variants = |event| {
            Variant::PRIORITY
                .iter()
                .map(|v| Recognizer::new(event, *v))
                .collect::<InspectResult<Vec<_>>>()
        };
        Ok(Self {
            started: variants(Event::Started)?,
            stopped: variants(Event::Stopped)?,
            marker: build(Patterns::TIMING_MARKER, true)?,
        })
    }

    pub fn marker(&self) -> &RegexMatcher {
        &self.marker
    }

    /// Try the variants for `event` in priority order; first match wins.
    pub fn recognize<'a>(&self, event: Event, line: &'a [u8]) -> Option<(Variant, &'a [u8])> {
        let recognizers = match event {
            Event::Started => &self.started,
            Event::Stopped => &self.stopped,
        };
        recognizers
            .iter()
            .find_map(|r| r.capture(line).map(|text| (r.variant(), text)))
    }
}

/// Case-insensitive `ERROR` anywhere in the line.
pub fn error_matcher() -> InspectResult<RegexMatcher> {
    build(Patterns::ERROR, false)
}

#[inline]
pub fn is_error_line(matcher: &RegexMatcher, line: &[u8]) -> bool {
    matcher.is_match(line).unwrap_or(false)
}

fn build(pattern: &str, case_sensitive: bool) -> InspectResult<RegexMatcher> {
    RegexMatcherBuilder::new()
        .case_insensitive(!case_sensitive)
        .multi_line(false)
        .line_terminator(Some(b'\n'))
        .build(pattern)
        .map_err(|e| InspectError::InvalidPattern(e.to_string()))
}
