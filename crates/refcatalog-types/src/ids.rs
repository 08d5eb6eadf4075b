//! Deterministic row identifiers.
//!
//! Every id is a UUIDv5: entries hash their normalized text under a fixed
//! namespace, children hash their natural key under the parent's id. The
//! same input always yields the same id, so conflict-safe inserts keyed
//! on id turn a repeated run into a no-op.

use uuid::Uuid;

use crate::{Region, RelationType, SourceSlug};

/// Namespace for catalog entry ids.
pub const ENTRY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d7a_93b4_5e08_a1c6_4b2f_0d9e_7c35);

pub fn entry_id(text_normalized: &str) -> Uuid {
    Uuid::new_v5(&ENTRY_NAMESPACE, text_normalized.as_bytes())
}

fn child(parent: Uuid, kind: &str, source: SourceSlug, key: &str) -> Uuid {
    let name = format!("{kind}:{source}:{key}");
    Uuid::new_v5(&parent, name.as_bytes())
}

pub fn sense_id(entry_id: Uuid, source: SourceSlug, position: u32) -> Uuid {
    child(entry_id, "sense", source, &position.to_string())
}

pub fn translation_id(sense_id: Uuid, source: SourceSlug, position: u32) -> Uuid {
    child(sense_id, "translation", source, &position.to_string())
}

pub fn example_id(sense_id: Uuid, source: SourceSlug, position: u32) -> Uuid {
    child(sense_id, "example", source, &position.to_string())
}

/// Pronunciations have no position; they are keyed on what they say.
pub fn pronunciation_id(
    entry_id: Uuid,
    source: SourceSlug,
    transcription: &str,
    region: Option<Region>,
) -> Uuid {
    let region = region.map(Region::as_str).unwrap_or("");
    child(entry_id, "pronunciation", source, &format!("{transcription}|{region}"))
}

pub fn relation_id(
    source_entry_id: Uuid,
    target_entry_id: Uuid,
    relation_type: RelationType,
    source: SourceSlug,
) -> Uuid {
    child(
        source_entry_id,
        "relation",
        source,
        &format!("{target_entry_id}|{relation_type}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_across_calls() {
        assert_eq!(entry_id("house"), entry_id("house"));
        assert_ne!(entry_id("house"), entry_id("houses"));
        assert_eq!(entry_id("house").get_version_num(), 5);
    }

    #[test]
    fn children_depend_on_parent_source_and_key() {
        let a = entry_id("a");
        let b = entry_id("b");
        assert_eq!(sense_id(a, SourceSlug::Wiktionary, 0), sense_id(a, SourceSlug::Wiktionary, 0));
        assert_ne!(sense_id(a, SourceSlug::Wiktionary, 0), sense_id(b, SourceSlug::Wiktionary, 0));
        assert_ne!(sense_id(a, SourceSlug::Wiktionary, 0), sense_id(a, SourceSlug::Wiktionary, 1));
        assert_ne!(
            example_id(a, SourceSlug::Wiktionary, 0),
            example_id(a, SourceSlug::Tatoeba, 0)
        );
        assert_ne!(translation_id(a, SourceSlug::Wiktionary, 0), example_id(a, SourceSlug::Wiktionary, 0));
    }

    #[test]
    fn pronunciation_keyed_on_region() {
        let e = entry_id("tomato");
        assert_ne!(
            pronunciation_id(e, SourceSlug::Wiktionary, "/təˈmeɪtoʊ/", Some(Region::US)),
            pronunciation_id(e, SourceSlug::Wiktionary, "/təˈmeɪtoʊ/", None)
        );
    }

    #[test]
    fn relation_id_keeps_direction() {
        let dog = entry_id("dog");
        let animal = entry_id("animal");
        assert_ne!(
            relation_id(dog, animal, RelationType::Hypernym, SourceSlug::WordNet),
            relation_id(animal, dog, RelationType::Hypernym, SourceSlug::WordNet)
        );
    }
}
