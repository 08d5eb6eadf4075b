use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One dataset's parse, resolve and write unit of work.
///
/// Variants are declared in execution order; the derived `Ord` is that
/// order, so a `BTreeMap<Phase, _>` iterates canonically.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Phase {
    Wiktionary,
    Ngsl,
    Cmu,
    WordNet,
    Tatoeba,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Wiktionary,
        Phase::Ngsl,
        Phase::Cmu,
        Phase::WordNet,
        Phase::Tatoeba,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Wiktionary => "wiktionary",
            Phase::Ngsl => "ngsl",
            Phase::Cmu => "cmu",
            Phase::WordNet => "wordnet",
            Phase::Tatoeba => "tatoeba",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown phase {0:?} (expected one of wiktionary, ngsl, cmu, wordnet, tatoeba)")]
pub struct UnknownPhase(pub String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownPhase(name.to_string()))
    }
}

/// Phases to execute, in canonical order. An empty filter selects all.
pub fn select_phases(filter: &[Phase]) -> Vec<Phase> {
    if filter.is_empty() {
        return Phase::ALL.to_vec();
    }
    Phase::ALL
        .into_iter()
        .filter(|p| filter.contains(p))
        .collect()
}

/// Parse a list of phase names, ignoring blanks.
pub fn parse_phase_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<Phase>, UnknownPhase> {
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|n| !n.trim().is_empty())
        .map(str::parse)
        .collect()
}
