//! Shell-glob matching of torrent file names.

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

/// A compiled file-name pattern.
///
/// `*` matches any run of characters including `/`, `?` matches exactly one
/// character and `[...]` is a character class (`[!...]` negates). Matching
/// is applied to the whole relative name, so `*.mkv` matches at any depth.
/// Braces are ordinary characters: `Movie {2019}.mkv` matches only itself.
///
/// A pattern that does not compile matches nothing.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    matcher: Option<GlobMatcher>,
}

impl PatternMatcher {
    pub fn new(pattern: &str, case_sensitive: bool) -> Self {
        let escaped = escape_braces(pattern);
        let matcher = GlobBuilder::new(&escaped)
            .literal_separator(false)
            .case_insensitive(!case_sensitive)
            .backslash_escape(true)
            .build()
            .map(|glob| glob.compile_matcher());

        match matcher {
            Ok(matcher) => Self {
                matcher: Some(matcher),
            },
            Err(e) => {
                debug!(pattern, error = %e, "Pattern does not compile, matching nothing");
                Self { matcher: None }
            }
        }
    }

    /// Whether the pattern compiled.
    pub fn is_valid(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn is_match(&self, relative_name: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|m| m.is_match(relative_name))
    }
}

/// Escapes `{` and `}` outside character classes so they match literally.
fn escape_braces(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
                // A leading `!` and then a leading `]` belong to the class.
                if chars.peek() == Some(&'!') {
                    out.push('!');
                    chars.next();
                }
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '{' | '}' if !in_class => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// One-off match of `relative_name` against `pattern`.
pub fn matches(relative_name: &str, pattern: &str, case_sensitive: bool) -> bool {
    PatternMatcher::new(pattern, case_sensitive).is_match(relative_name)
}
