/// Created-items resolver tests
///
/// Discovering what an opaque host operation (import, duplicate, template)
/// produced.
/// Run with: cargo test --test created_items_tests
use hostmirror::{EntityKind, InMemoryHost, ListingStrategy, MirrorError, MirrorSession, SessionConfig};

#[test]
fn test_created_set_is_host_minus_mirror() -> anyhow::Result<()> {
    let memory = InMemoryHost::new();
    memory.insert(EntityKind::Pattern, "A", None);
    memory.insert(EntityKind::Pattern, "B", None);
    let mut session = MirrorSession::open(memory.clone())?;

    memory.insert(EntityKind::Pattern, "C", None);
    memory.insert(EntityKind::Pattern, "D", None);

    let created = session.resolve_created(&[EntityKind::Pattern])?;

    assert_eq!(created.names(), vec!["C", "D"]);
    assert_eq!(
        session.collection(EntityKind::Pattern).names(),
        vec!["A", "B", "C", "D"]
    );
    for entity in created.iter() {
        assert!(session.registry().contains(entity));
    }
    Ok(())
}

#[test]
fn test_import_creates_several_kinds() -> anyhow::Result<()> {
    let memory = InMemoryHost::new();
    let mut session = MirrorSession::open(memory.clone())?;

    session.execute(&[
        "CREATE MODEL 'Bracket'".to_string(),
        "CREATE BOUNDARY 'Bracket_outline' silhouette".to_string(),
        "CREATE PATTERN 'Bracket_edges'".to_string(),
        "CREATE WORKPLANE 'Bracket_datum'".to_string(),
    ])?;

    let created = session.resolve_created(&[
        EntityKind::Model,
        EntityKind::Boundary,
        EntityKind::Pattern,
        EntityKind::Workplane,
        EntityKind::Model,
    ])?;

    assert_eq!(created.len(), 4);
    assert_eq!(created.of_kind(EntityKind::Boundary).count(), 1);
    assert_eq!(
        created.names(),
        vec!["Bracket", "Bracket_outline", "Bracket_edges", "Bracket_datum"]
    );
    assert_eq!(session.registry().total_len(), 4);
    Ok(())
}

#[test]
fn test_nothing_created() -> anyhow::Result<()> {
    let memory = InMemoryHost::new();
    memory.insert(EntityKind::Level, "L1", None);
    let mut session = MirrorSession::open(memory)?;

    assert!(session.resolve_created(&[EntityKind::Level])?.is_empty());

    let err = session.resolve_single_created(EntityKind::Level).unwrap_err();
    assert!(matches!(err, MirrorError::CreationNotFound { kind: EntityKind::Level }));
    assert_eq!(session.collection(EntityKind::Level).len(), 1);
    Ok(())
}

#[test]
fn test_single_created_entity() -> anyhow::Result<()> {
    let memory = InMemoryHost::new();
    memory.insert(EntityKind::Toolpath, "Rough", Some("raster"));
    let mut session = MirrorSession::open(memory.clone())?;

    session.execute(&["CREATE TOOLPATH 'Rough_1' raster".to_string()])?;
    let copy = session.resolve_single_created(EntityKind::Toolpath)?;

    assert_eq!(copy.name(), "Rough_1");
    assert_eq!(Some(copy.id()), memory.id_of(EntityKind::Toolpath, "Rough_1"));
    assert_eq!(session.collection(EntityKind::Toolpath).len(), 2);
    Ok(())
}

#[test]
fn test_ambiguous_creation_still_mirrors_everything() -> anyhow::Result<()> {
    let memory = InMemoryHost::new();
    let mut session = MirrorSession::open_with_config(
        memory.clone(),
        SessionConfig::new().listing(ListingStrategy::Bulk),
    )?;
    memory.insert(EntityKind::FeatureSet, "Holes", None);
    memory.insert(EntityKind::FeatureSet, "Pockets", None);

    let err = session.resolve_single_created(EntityKind::FeatureSet).unwrap_err();

    match err {
        MirrorError::AmbiguousCreationResult { kind, names } => {
            assert_eq!(kind, EntityKind::FeatureSet);
            assert_eq!(names, vec!["Holes", "Pockets"]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(
        session.collection(EntityKind::FeatureSet).names(),
        vec!["Holes", "Pockets"]
    );
    Ok(())
}

#[test]
fn test_resolver_matches_names_case_insensitively() -> anyhow::Result<()> {
    let memory = InMemoryHost::new();
    memory.insert(EntityKind::Group, "Fixtures", None);
    let mut session = MirrorSession::open(memory.clone())?;

    memory.rename(EntityKind::Group, "Fixtures", "FIXTURES");

    assert!(session.resolve_created(&[EntityKind::Group])?.is_empty());
    Ok(())
}
