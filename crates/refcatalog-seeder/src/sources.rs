use chrono::{DateTime, Utc};
use refcatalog_types::{RefDataSource, SourceCategory, SourceSlug};

/// Dataset version stamped on registry and coverage rows.
pub const DATASET_VERSION: &str = "v1";

fn describe(slug: SourceSlug) -> (&'static str, &'static str, SourceCategory) {
    match slug {
        SourceSlug::FreeDict => (
            "Free Dictionary API",
            "FreeDictionary API definitions",
            SourceCategory::Definitions,
        ),
        SourceSlug::Translate => (
            "Google Translate",
            "Google Translate translations",
            SourceCategory::Translations,
        ),
        SourceSlug::Wiktionary => (
            "Wiktionary (Kaikki)",
            "Kaikki JSONL dump of English Wiktionary",
            SourceCategory::Definitions,
        ),
        SourceSlug::Ngsl => (
            "New General Service List",
            "NGSL frequency-ranked core vocabulary",
            SourceCategory::Metadata,
        ),
        SourceSlug::Nawl => (
            "New Academic Word List",
            "NAWL academic vocabulary list",
            SourceCategory::Metadata,
        ),
        SourceSlug::Cmu => (
            "CMU Pronouncing Dictionary",
            "ARPAbet-to-IPA pronunciation data",
            SourceCategory::Pronunciations,
        ),
        SourceSlug::WordNet => (
            "Open English WordNet",
            "Synonym, antonym, derivation and hypernym relations",
            SourceCategory::Relations,
        ),
        SourceSlug::Tatoeba => ("Tatoeba", "EN-RU sentence pairs", SourceCategory::Examples),
    }
}

/// Registry rows for every source the catalog knows about.
pub fn known_data_sources(now: DateTime<Utc>) -> Vec<RefDataSource> {
    SourceSlug::ALL
        .into_iter()
        .map(|slug| {
            let (name, description, source_type) = describe(slug);
            RefDataSource {
                slug,
                name: name.to_string(),
                description: description.to_string(),
                source_type,
                is_active: true,
                dataset_version: DATASET_VERSION.to_string(),
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}
