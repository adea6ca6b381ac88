//! The route table: which path prefixes get forwarded.

use anyhow::Result;

/// Immutable set of forwarded path prefixes.
///
/// Matching is literal and case-sensitive: a path is forwarded when it
/// starts with one of the prefixes. Prefixes are pairwise disjoint by
/// construction, so no longest-prefix ordering is needed.
#[derive(Debug, Clone)]
pub struct RouteTable {
    prefixes: Vec<String>,
}

impl RouteTable {
    pub fn new(prefixes: Vec<String>) -> Result<Self> {
        for prefix in &prefixes {
            if !prefix.starts_with('/') || prefix.len() < 2 {
                anyhow::bail!("Invalid route prefix '{prefix}'");
            }
        }

        // Disjointness: no prefix may shadow another
        for (i, a) in prefixes.iter().enumerate() {
            for b in prefixes.iter().skip(i + 1) {
                if a.starts_with(b.as_str()) || b.starts_with(a.as_str()) {
                    anyhow::bail!("Overlapping route prefixes '{a}' and '{b}'");
                }
            }
        }

        Ok(Self { prefixes })
    }

    /// The matching prefix for `path`, if any.
    pub fn matches(&self, path: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
            .map(|s| s.as_str())
    }
}
