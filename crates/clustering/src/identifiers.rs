//! Mapping oracle-supplied tokens back to canonical component ids
//!
//! Components are shown to the oracle by surrogate index. Oracles do not
//! always comply, so a token goes through an ordered chain of strategies and
//! the first one that yields a key wins:
//!
//! 1. exact key
//! 2. surrogate index
//! 3. short id or 2-4 segment dotted suffix
//! 4. 1-3 again after stripping a known noise prefix
//! 5. last dotted segment, scored on shared segments when ambiguous
//! 6. unique key ending with the token's last 2-4 segments
//!
//! Only ids of the current call are ever returned.

use crate::response::ProposedToken;
use modmap_core::fqdn;
use modmap_core::registry::ComponentRegistry;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display};
use tracing::{debug, trace, warn};

/// Dotted suffix lengths indexed by the short-name map and tried by suffix matching
const SUFFIX_LENGTHS: std::ops::RangeInclusive<usize> = 2..=4;

/// Maximum number of similar keys reported for an unresolved token
const MAX_SIMILAR_KEYS: usize = 5;

/// Strategy that resolved a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    ExactKey,
    SurrogateIndex,
    ShortName,
    PrefixStripped,
    FuzzyLastSegment,
    SuffixPath,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::ExactKey,
        Strategy::SurrogateIndex,
        Strategy::ShortName,
        Strategy::PrefixStripped,
        Strategy::FuzzyLastSegment,
        Strategy::SuffixPath,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::ExactKey => "exact_key",
            Strategy::SurrogateIndex => "surrogate_index",
            Strategy::ShortName => "short_name",
            Strategy::PrefixStripped => "prefix_stripped",
            Strategy::FuzzyLastSegment => "fuzzy_last_segment",
            Strategy::SuffixPath => "suffix_path",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context reported for a token no strategy could resolve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnresolvedDiagnostics {
    pub token: String,
    /// Fuzzy-match scores of same-named keys, best first
    pub candidate_scores: Vec<(String, f64)>,
    /// Keys whose last segment contains the token's last segment
    pub similar_keys: Vec<String>,
}

/// Outcome of resolving one token
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved { fqdn: String, strategy: Strategy },
    Unresolved(UnresolvedDiagnostics),
}

impl Resolution {
    pub fn fqdn(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { fqdn, .. } => Some(fqdn),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Per-call surrogate numbering: index `i` stands for the `i`-th id.
///
/// The order is the order of the ids given, first occurrence wins. Never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    ordered: Vec<String>,
    positions: HashMap<String, usize>,
}

impl IdentifierMap {
    pub fn new(ids: &[String]) -> Self {
        let mut map = Self::default();
        for id in ids {
            if !map.positions.contains_key(id) {
                map.positions.insert(id.clone(), map.ordered.len());
                map.ordered.push(id.clone());
            }
        }
        map
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Canonical id behind surrogate `index`
    pub fn fqdn(&self, index: usize) -> Option<&str> {
        self.ordered.get(index).map(String::as_str)
    }

    /// Surrogate index of a canonical id
    pub fn index_of(&self, fqdn: &str) -> Option<usize> {
        self.positions.get(fqdn).copied()
    }

    pub fn ids(&self) -> &[String] {
        &self.ordered
    }
}

fn exact_key<'k>(keys: &BTreeSet<&'k str>, token: &str) -> Option<&'k str> {
    keys.get(token).copied()
}

fn surrogate_index<'k>(map: &'k IdentifierMap, token: &str) -> Option<&'k str> {
    let index: usize = token.parse().ok()?;
    map.fqdn(index)
}

fn short_name<'k>(short_names: &HashMap<String, &'k str>, token: &str) -> Option<&'k str> {
    short_names.get(token).copied()
}

fn strip_noise_prefix<'t>(prefixes: &[String], token: &'t str) -> Option<&'t str> {
    prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| token.strip_prefix(prefix.as_str()))
        .filter(|rest| !rest.is_empty())
}

/// Shared-segment score: every token segment found in the candidate adds
/// `1 + 1 / (1 + |position delta|)`, using the candidate's first occurrence.
fn path_match_score(token: &str, candidate: &str) -> f64 {
    let candidate_segments = fqdn::dotted_segments(candidate);
    fqdn::dotted_segments(token)
        .iter()
        .enumerate()
        .filter_map(|(i, segment)| {
            candidate_segments
                .iter()
                .position(|c| c == segment)
                .map(|j| 1.0 + 1.0 / (1.0 + i.abs_diff(j) as f64))
        })
        .sum()
}

/// Outcome of last-segment matching
#[derive(Debug, Clone, PartialEq)]
enum FuzzyMatch<'k> {
    Found(&'k str),
    /// Several candidates and no strict winner; scores best first
    Ambiguous(Vec<(String, f64)>),
    NoMatch,
}

fn fuzzy_last_segment<'k>(keys: &BTreeSet<&'k str>, token: &str) -> FuzzyMatch<'k> {
    let last = fqdn::last_dotted_segment(token);
    let candidates: Vec<&'k str> = keys
        .iter()
        .copied()
        .filter(|key| fqdn::last_dotted_segment(key) == last)
        .collect();

    match candidates.as_slice() {
        [] => FuzzyMatch::NoMatch,
        [only] => FuzzyMatch::Found(*only),
        _ => {
            let mut scores: Vec<(&'k str, f64)> = candidates
                .iter()
                .map(|key| (*key, path_match_score(token, key)))
                .collect();
            scores.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            if scores[0].1 > scores[1].1 {
                FuzzyMatch::Found(scores[0].0)
            } else {
                FuzzyMatch::Ambiguous(
                    scores
                        .into_iter()
                        .map(|(key, score)| (key.to_string(), score))
                        .collect(),
                )
            }
        }
    }
}

fn suffix_path<'k>(keys: &BTreeSet<&'k str>, token: &str) -> Option<&'k str> {
    for n in SUFFIX_LENGTHS {
        let suffix = fqdn::dotted_suffix(token, n)?;
        let dotted = format!(".{suffix}");
        let mut matches = keys
            .iter()
            .copied()
            .filter(|key| *key == suffix || key.ends_with(&dotted));
        if let (Some(found), None) = (matches.next(), matches.next()) {
            return Some(found);
        }
    }
    None
}

/// Resolver over the ids of one clustering call.
///
/// Every strategy, exact keys included, matches only ids listed in this call.
/// A registry id that was not offered to the oracle stays unresolved, so a
/// level can never pull in components from outside its own leaf set. The
/// registry is consulted for short ids alone.
pub struct IdentifierResolver<'a> {
    map: &'a IdentifierMap,
    keys: BTreeSet<&'a str>,
    short_names: HashMap<String, &'a str>,
    noise_prefixes: &'a [String],
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(
        map: &'a IdentifierMap,
        registry: &'a ComponentRegistry,
        noise_prefixes: &'a [String],
    ) -> Self {
        let keys: BTreeSet<&'a str> = map.ids().iter().map(String::as_str).collect();

        let mut short_names: HashMap<String, &'a str> = HashMap::new();
        let mut collisions = 0usize;
        for id in map.ids() {
            let short_id = registry.get(id).map(|c| c.short_id.clone());
            let suffixes = SUFFIX_LENGTHS.filter_map(|n| fqdn::dotted_suffix(id, n));
            for alias in short_id.into_iter().chain(suffixes) {
                match short_names.get(&alias) {
                    Some(existing) if *existing != id.as_str() => {
                        collisions += 1;
                        debug!(alias = %alias, kept = %existing, dropped = %id, "Short name collision");
                    }
                    Some(_) => {}
                    None => {
                        short_names.insert(alias, id.as_str());
                    }
                }
            }
        }
        if collisions > 0 {
            debug!(collisions, "Short name map built with collisions, first writer kept");
        }

        Self {
            map,
            keys,
            short_names,
            noise_prefixes,
        }
    }

    /// Strategies 1-3
    fn direct(&self, token: &str) -> Option<(&'a str, Strategy)> {
        if let Some(fqdn) = exact_key(&self.keys, token) {
            return Some((fqdn, Strategy::ExactKey));
        }
        if let Some(fqdn) = surrogate_index(self.map, token) {
            return Some((fqdn, Strategy::SurrogateIndex));
        }
        short_name(&self.short_names, token).map(|fqdn| (fqdn, Strategy::ShortName))
    }

    fn diagnostics(&self, token: &str, candidate_scores: Vec<(String, f64)>) -> UnresolvedDiagnostics {
        let needle = fqdn::last_dotted_segment(token).to_lowercase();
        let similar_keys = if needle.is_empty() {
            Vec::new()
        } else {
            self.keys
                .iter()
                .filter(|key| fqdn::last_dotted_segment(key).to_lowercase().contains(&needle))
                .take(MAX_SIMILAR_KEYS)
                .map(|key| key.to_string())
                .collect()
        };
        UnresolvedDiagnostics {
            token: token.to_string(),
            candidate_scores,
            similar_keys,
        }
    }

    fn resolve_text(&self, raw: &str) -> Resolution {
        let token = raw.trim();
        if token.is_empty() {
            return Resolution::Unresolved(self.diagnostics(token, Vec::new()));
        }

        if let Some((fqdn, strategy)) = self.direct(token) {
            return resolved(token, fqdn, strategy);
        }

        let stripped = strip_noise_prefix(self.noise_prefixes, token);
        if let Some((fqdn, _)) = stripped.and_then(|rest| self.direct(rest)) {
            return resolved(token, fqdn, Strategy::PrefixStripped);
        }

        let subject = stripped.unwrap_or(token);
        let candidate_scores = match fuzzy_last_segment(&self.keys, subject) {
            FuzzyMatch::Found(fqdn) => return resolved(token, fqdn, Strategy::FuzzyLastSegment),
            FuzzyMatch::Ambiguous(scores) => scores,
            FuzzyMatch::NoMatch => Vec::new(),
        };

        if let Some(fqdn) = suffix_path(&self.keys, subject) {
            return resolved(token, fqdn, Strategy::SuffixPath);
        }

        Resolution::Unresolved(self.diagnostics(token, candidate_scores))
    }

    /// Resolve one token. Never fails; unresolved tokens carry diagnostics.
    pub fn resolve(&self, token: &ProposedToken) -> Resolution {
        let resolution = match token {
            ProposedToken::Index(index) => match usize::try_from(*index)
                .ok()
                .and_then(|i| self.map.fqdn(i))
            {
                Some(fqdn) => resolved(&index.to_string(), fqdn, Strategy::SurrogateIndex),
                None => Resolution::Unresolved(self.diagnostics(&index.to_string(), Vec::new())),
            },
            ProposedToken::Text(text) => self.resolve_text(text),
            ProposedToken::Other(raw) => Resolution::Unresolved(self.diagnostics(raw, Vec::new())),
        };

        if let Resolution::Unresolved(diagnostics) = &resolution {
            warn!(
                token = %diagnostics.token,
                valid_range = %format!("0-{}", self.map.len().saturating_sub(1)),
                candidate_scores = ?diagnostics.candidate_scores,
                similar_keys = ?diagnostics.similar_keys,
                "Could not resolve oracle token"
            );
        }
        resolution
    }
}

fn resolved(token: &str, fqdn: &str, strategy: Strategy) -> Resolution {
    trace!(token = %token, fqdn = %fqdn, strategy = %strategy, "Resolved oracle token");
    Resolution::Resolved {
        fqdn: fqdn.to_string(),
        strategy,
    }
}
