use chrono::Utc;
use refcatalog_store::{BulkRepository, MemoryCatalog, StoreError};
use refcatalog_types::{
    CoverageStatus, RefDataSource, RefEntry, RefEntrySourceCoverage, RefPronunciation,
    RefWordRelation, Region, RelationType, SourceCategory, SourceSlug, ids,
};
use tempfile::tempdir;

fn source(slug: SourceSlug, version: &str) -> RefDataSource {
    RefDataSource {
        slug,
        name: slug.to_string(),
        description: String::new(),
        source_type: SourceCategory::Relations,
        is_active: true,
        dataset_version: version.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn snapshot_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");

    let store = MemoryCatalog::open(&path).unwrap();
    assert_eq!(store.counts().entries, 0);

    let big = RefEntry::new("big", Utc::now());
    let large = RefEntry::new("large", Utc::now());
    store.insert_entries(&[big.clone(), large.clone()]).await.unwrap();
    store
        .insert_relations(&[RefWordRelation {
            id: ids::relation_id(big.id, large.id, RelationType::Synonym, SourceSlug::WordNet),
            source_entry_id: big.id,
            target_entry_id: large.id,
            relation_type: RelationType::Synonym,
            source_slug: SourceSlug::WordNet,
            created_at: Utc::now(),
        }])
        .await
        .unwrap();
    store
        .insert_pronunciations(&[RefPronunciation {
            id: ids::pronunciation_id(big.id, SourceSlug::Cmu, "/bɪɡ/", Some(Region::US)),
            ref_entry_id: big.id,
            transcription: Some("/bɪɡ/".into()),
            audio_url: None,
            region: Some(Region::US),
            source_slug: SourceSlug::Cmu,
        }])
        .await
        .unwrap();
    store.upsert_data_sources(&[source(SourceSlug::WordNet, "v1")]).await.unwrap();
    store.persist().unwrap();

    let reopened = MemoryCatalog::open(&path).unwrap();
    assert_eq!(reopened.counts(), store.counts());
    let ids = reopened
        .entry_ids_by_normalized_texts(&["big".to_string(), "huge".to_string()])
        .await
        .unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids["big"], big.id);

    // The relation key index is rebuilt, so a re-insert is still a no-op.
    let again = reopened.relations();
    assert_eq!(reopened.insert_relations(&again).await.unwrap(), 0);

    let ipas = reopened
        .pronunciation_transcriptions_by_entry_ids(&[big.id, large.id])
        .await
        .unwrap();
    assert!(ipas[&big.id].contains("/bɪɡ/"));
    assert!(!ipas.contains_key(&large.id));
}

#[tokio::test]
async fn corrupt_snapshot_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, b"{not json").unwrap();
    let err = MemoryCatalog::open(&path).err().expect("corrupt snapshot must fail");
    assert!(matches!(err, StoreError::SnapshotFormat { .. }));
}

#[tokio::test]
async fn coverage_upserts_on_entry_and_source() {
    let store = MemoryCatalog::new();
    let e = RefEntry::new("cat", Utc::now());
    store.insert_entries(std::slice::from_ref(&e)).await.unwrap();

    let row = |status| RefEntrySourceCoverage {
        ref_entry_id: e.id,
        source_slug: SourceSlug::Tatoeba,
        status,
        dataset_version: "v1".into(),
        fetched_at: Utc::now(),
    };
    assert_eq!(store.insert_coverage(&[row(CoverageStatus::NoData)]).await.unwrap(), 1);
    assert_eq!(store.insert_coverage(&[row(CoverageStatus::Fetched)]).await.unwrap(), 1);

    let coverage = store.coverage();
    assert_eq!(coverage.len(), 1);
    assert_eq!(coverage[0].status, CoverageStatus::Fetched);
}

#[tokio::test]
async fn registry_upsert_keeps_created_at() {
    let store = MemoryCatalog::new();
    let first = source(SourceSlug::Ngsl, "v1");
    store.upsert_data_sources(std::slice::from_ref(&first)).await.unwrap();
    store.upsert_data_sources(&[source(SourceSlug::Ngsl, "v2")]).await.unwrap();

    let sources = store.data_sources();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].dataset_version, "v2");
    assert_eq!(sources[0].created_at, first.created_at);
}
