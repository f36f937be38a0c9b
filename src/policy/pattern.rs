//! Ant-style path patterns
//!
//! `**` matches zero or more whole segments, `*` inside a segment matches
//! any run of characters, `?` matches a single character. Empty segments are
//! dropped from both patterns and paths before matching.

use std::fmt;

use super::PolicyError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Exact segment text
    Literal(String),
    /// Segment containing `*` or `?`
    Glob(String),
    /// A lone `*`: any single segment
    AnySegment,
    /// `**`: any number of segments, including none
    AnyDepth,
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "**" => Ok(Segment::AnyDepth),
            "*" => Ok(Segment::AnySegment),
            s if s.contains("**") => Err(format!("'**' must be a whole segment, found '{s}'")),
            s if s.contains('*') || s.contains('?') => Ok(Segment::Glob(s.to_string())),
            s => Ok(Segment::Literal(s.to_string())),
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == segment,
            Segment::Glob(glob) => glob_match(glob.as_bytes(), segment.as_bytes()),
            Segment::AnySegment | Segment::AnyDepth => true,
        }
    }

    /// Whether every segment this one accepts is also accepted by `self`.
    /// `AnyDepth` is handled by the caller.
    fn covers(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::AnySegment, _) => true,
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Glob(a), Segment::Literal(b)) => glob_match(a.as_bytes(), b.as_bytes()),
            (Segment::Glob(a), Segment::Glob(b)) => a == b,
            _ => false,
        }
    }
}

/// A compiled path pattern such as `/rooms/**` or `/user/change-password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. Patterns must be absolute.
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        if !raw.starts_with('/') {
            return Err(PolicyError::InvalidPattern {
                pattern: raw.to_string(),
                reason: "pattern must start with '/'".to_string(),
            });
        }

        let segments = split_path(raw)
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| PolicyError::InvalidPattern {
                pattern: raw.to_string(),
                reason,
            })?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True for `/**`, which matches every path
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::AnyDepth])
    }

    /// Test a request path against the pattern
    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &path)
    }

    /// Whether every path matched by `other` is also matched by `self`.
    ///
    /// Conservative: a `false` answer may hide an overlap expressible only
    /// through glob algebra, but a `true` answer is always correct.
    pub fn covers(&self, other: &PathPattern) -> bool {
        covers_segments(&self.segments, &other.segments)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment.matches(head) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn covers_segments(a: &[Segment], b: &[Segment]) -> bool {
    match (a.split_first(), b.split_first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some((Segment::AnyDepth, a_rest)), _) => {
            covers_segments(a_rest, b)
                || matches!(b.split_first(), Some((_, b_rest)) if covers_segments(a, b_rest))
        }
        (Some(_), None) => false,
        (Some(_), Some((Segment::AnyDepth, _))) => false,
        (Some((sa, a_rest)), Some((sb, b_rest))) => sa.covers(sb) && covers_segments(a_rest, b_rest),
    }
}

/// Single-segment wildcard match supporting `*` and `?`.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
