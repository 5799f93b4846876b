use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::{IntoAppError, bail};
use regex::Regex;
use std::collections::HashSet;

/// Largest number of candidates a single search may enrich.
pub const MAX_CANDIDATES: usize = 1000;

/// A parsed search query: comma-separated phrases that must all match.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    phrases: Vec<String>,
    word_patterns: Vec<Regex>,
}

impl SearchQuery {
    /// Split `raw` on commas into lowercase phrases.
    ///
    /// Surrounding whitespace is trimmed and empty phrases are dropped.
    pub fn parse(raw: &str) -> Result<Self> {
        let phrases: Vec<String> = raw
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        if phrases.is_empty() {
            bail!("the search query '{raw}' does not contain any search phrase");
        }

        let word_patterns = phrases
            .iter()
            .map(|p| Regex::new(&format!(r"\b{}\b", regex::escape(p))).into_app_err_with(|| format!("building a pattern for '{p}'")))
            .collect::<Result<_>>()?;

        Ok(Self { phrases, word_patterns })
    }

    /// Whether every phrase is a substring of the package name, ignoring case.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.phrases.iter().all(|p| name.contains(p.as_str()))
    }

    /// Whether every phrase occurs as a whole word in the summary, ignoring case.
    #[must_use]
    pub fn matches_summary(&self, summary: &str) -> bool {
        let summary = summary.to_lowercase();
        self.word_patterns.iter().all(|re| re.is_match(&summary))
    }

    /// All names matching the query, in index order.
    pub fn match_names<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        names.into_iter().filter(|n| self.matches_name(n)).cloned().collect()
    }
}

impl FromStr for SearchQuery {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for SearchQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.phrases.join(","))
    }
}

/// Merge name and summary matches, dropping duplicates and keeping name matches first.
///
/// Fails when the merged set is larger than [`MAX_CANDIDATES`].
pub fn union_candidates(name_matches: Vec<String>, summary_matches: Vec<String>) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let candidates: Vec<String> = name_matches
        .into_iter()
        .chain(summary_matches)
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect();

    if candidates.len() > MAX_CANDIDATES {
        bail!(
            "the query matches {} packages, more than the limit of {MAX_CANDIDATES}, please use a more specific query",
            candidates.len()
        );
    }

    Ok(candidates)
}
