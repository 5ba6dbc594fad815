//! Upsert atomicity and full-text index consistency.

use anyhow::Result;
use lacquer::help::{Cancellation, HelpError, HelpStore, Predicate, Section};

fn by_topic(store: &HelpStore, topic: &str) -> Result<Vec<String>> {
    let sections = store.find(&Predicate::has_topic(topic), &Cancellation::none())?;
    Ok(sections.into_iter().map(|section| section.slug).collect())
}

#[test]
fn reupsert_replaces_associations_and_keeps_one_index_row() -> Result<()> {
    let store = HelpStore::in_memory()?;
    let cancel = Cancellation::none();

    let mut section = Section::new("s", "Section")
        .with_topics(["a", "b"])
        .with_content("searchable body");
    store.upsert(&mut section, &cancel)?;
    let mut section = Section::new("s", "Section")
        .with_topics(["b", "c"])
        .with_content("searchable body");
    store.upsert(&mut section, &cancel)?;

    assert!(by_topic(&store, "a")?.is_empty());
    assert_eq!(by_topic(&store, "b")?, ["s"]);
    assert_eq!(by_topic(&store, "c")?, ["s"]);

    let matches = store.find(&Predicate::text_search("searchable body"), &cancel)?;
    assert_eq!(
        matches.iter().map(|section| &section.slug).collect::<Vec<_>>(),
        [&"s".to_owned()]
    );
    Ok(())
}

#[test]
fn failed_upsert_leaves_the_store_unchanged() -> Result<()> {
    let store = HelpStore::in_memory()?;
    let cancel = Cancellation::none();
    let mut original = Section::new("keep", "Original").with_topics(["x"]);
    store.upsert(&mut original, &cancel)?;

    // Empty title fails validation before any statement runs.
    let mut invalid = Section::new("keep", "");
    assert!(matches!(
        store.upsert(&mut invalid, &cancel),
        Err(HelpError::InvalidSection { .. })
    ));

    // A fired token aborts mid-protocol and rolls back.
    let cancelled = Cancellation::new();
    cancelled.cancel();
    let mut update = Section::new("keep", "Replacement").with_topics(["y"]);
    assert!(matches!(
        store.upsert(&mut update, &cancelled),
        Err(HelpError::Cancelled)
    ));

    let section = store.get("keep", &cancel)?;
    assert_eq!(section.title, "Original");
    assert_eq!(section.topics, ["x"]);
    assert_eq!(by_topic(&store, "y")?.len(), 0);
    Ok(())
}

#[test]
fn index_row_tracks_the_current_text() -> Result<()> {
    let store = HelpStore::in_memory()?;
    let cancel = Cancellation::none();

    let mut section = Section::new("doc", "Doc").with_content("the old wording");
    store.upsert(&mut section, &cancel)?;
    let mut section = Section::new("doc", "Doc").with_content("a new phrasing");
    store.upsert(&mut section, &cancel)?;

    let old = store.find(&Predicate::text_search("old wording"), &cancel)?;
    assert!(old.is_empty());
    let new = store.find(&Predicate::text_search("new phrasing"), &cancel)?;
    assert_eq!(new.len(), 1);

    store.delete("doc", &cancel)?;
    let gone = store.find(&Predicate::text_search("new phrasing"), &cancel)?;
    assert!(gone.is_empty());
    Ok(())
}
