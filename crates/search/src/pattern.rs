// Path: crates/search/src/pattern.rs
//! Case-insensitive name patterns.

/// How well a name matched, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum NameMatch {
    Partial,
    Prefix,
    Exact,
}

impl NameMatch {
    pub(crate) fn score(self) -> f32 {
        match self {
            Self::Partial => 1.0,
            Self::Prefix => 2.0,
            Self::Exact => 3.0,
        }
    }
}

/// A compiled name pattern. `*` matches any run of characters, `?` exactly
/// one; a pattern with neither is a substring match.
#[derive(Debug, Clone)]
pub(crate) struct NamePattern {
    raw: String,
    glob: Option<Vec<char>>,
}

impl NamePattern {
    /// `None` for a blank pattern, which filters nothing.
    pub(crate) fn parse(pattern: &str) -> Option<Self> {
        let raw = pattern.trim().to_lowercase();
        if raw.is_empty() {
            return None;
        }
        let glob = raw
            .contains(|c: char| matches!(c, '*' | '?'))
            .then(|| raw.chars().collect::<Vec<_>>());
        Some(Self { raw, glob })
    }

    pub(crate) fn matches(&self, name: &str) -> Option<NameMatch> {
        let name = name.to_lowercase();
        if name == self.raw {
            return Some(NameMatch::Exact);
        }
        let hit = match &self.glob {
            Some(glob) => wildcard_match(glob, &name.chars().collect::<Vec<_>>()),
            None => name.contains(&self.raw),
        };
        if !hit {
            return None;
        }
        let literal_prefix: String = self
            .raw
            .chars()
            .take_while(|c| !matches!(c, '*' | '?'))
            .collect();
        if !literal_prefix.is_empty() && name.starts_with(&literal_prefix) {
            Some(NameMatch::Prefix)
        } else {
            Some(NameMatch::Partial)
        }
    }
}

/// Greedy wildcard matching with single-star backtracking.
fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || text.get(t) == Some(&c) => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern
        .get(p..)
        .map_or(true, |rest| rest.iter().all(|&c| c == '*'))
}
