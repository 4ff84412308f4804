//! Event name patterns used by subscriptions.
//!
//! A pattern is `*` (everything), a glob containing `*`, `?` or `[...]`, or
//! an exact event name.

use regex::Regex;
use tracing::warn;

#[derive(Debug, Clone)]
enum Matcher {
    Any,
    Exact,
    Glob(Regex),
}

#[derive(Debug, Clone)]
pub struct EventPattern {
    raw: String,
    matcher: Matcher,
}

impl EventPattern {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let matcher = if pattern == "*" {
            Matcher::Any
        } else if pattern.contains(['*', '?', '[']) {
            match Regex::new(&glob_to_regex(pattern)) {
                Ok(regex) => Matcher::Glob(regex),
                Err(e) => {
                    warn!(pattern = pattern, error = %e, "Invalid glob, matching literally");
                    Matcher::Exact
                }
            }
        } else {
            Matcher::Exact
        };

        Self {
            raw: pattern.to_string(),
            matcher,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn matches(&self, event: &str) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::Exact => self.raw == event,
            Matcher::Glob(regex) => regex.is_match(event),
        }
    }
}

impl PartialEq for EventPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for EventPattern {}

/// Translate a shell-style glob into an anchored regular expression.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    class.push(next);
                }
                if closed && !class.is_empty() {
                    out.push('[');
                    let body = class.strip_prefix('!').map_or_else(
                        || class.replace('\\', "\\\\"),
                        |rest| format!("^{}", rest.replace('\\', "\\\\")),
                    );
                    out.push_str(&body);
                    out.push(']');
                } else {
                    out.push_str(&regex::escape("["));
                    out.push_str(&regex::escape(&class));
                    if closed {
                        out.push_str(&regex::escape("]"));
                    }
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}
