//! Key patterns for targeted invalidation.

/// Matches cache keys for `delete_matching`.
///
/// A pattern containing `*` or `?` is a glob anchored at both ends (`*` is
/// any run of characters, `?` exactly one). Any other pattern matches keys
/// that contain it as a substring. The empty pattern matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    Substring(String),
    Glob(Vec<char>),
    Nothing,
}

impl KeyPattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern.is_empty() {
            KeyPattern::Nothing
        } else if pattern.contains(['*', '?']) {
            KeyPattern::Glob(pattern.chars().collect())
        } else {
            KeyPattern::Substring(pattern.to_string())
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Nothing => false,
            KeyPattern::Substring(needle) => key.contains(needle.as_str()),
            KeyPattern::Glob(glob) => {
                let key: Vec<char> = key.chars().collect();
                glob_matches(glob, &key)
            }
        }
    }
}

// Iterative wildcard match with single-star backtracking.
fn glob_matches(glob: &[char], key: &[char]) -> bool {
    let (mut g, mut k) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while k < key.len() {
        if g < glob.len() && (glob[g] == '?' || glob[g] == key[k]) {
            g += 1;
            k += 1;
        } else if g < glob.len() && glob[g] == '*' {
            star = Some((g, k));
            g += 1;
        } else if let Some((star_g, star_k)) = star {
            g = star_g + 1;
            k = star_k + 1;
            star = Some((star_g, star_k + 1));
        } else {
            return false;
        }
    }

    glob[g..].iter().all(|c| *c == '*')
}
