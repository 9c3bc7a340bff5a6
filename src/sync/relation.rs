use crate::core::{Entity, EntityRef, MirrorError, Result};
use crate::host::{command, Host};
use crate::storage::Registry;

/// Ordered members of a composite entity (an NC program's toolpaths, a
/// setup's toolpaths), exactly in the order the host reports them.
///
/// Members are looked up by id in the registry-wide collection of the member
/// kind. An id the mirror does not know is a `DanglingMember` error rather
/// than a silent gap.
pub fn resolve_members(host: &Host, registry: &Registry, owner: &Entity) -> Result<Vec<EntityRef>> {
    let kind = owner.kind();
    let member_kind = kind.member_kind().ok_or(MirrorError::NoRelation(kind))?;
    let owner_name = owner.name();
    let ids = host.query_ids(&command::members(kind, &owner_name))?;
    let members = registry.collection(member_kind);

    ids.into_iter()
        .map(|id| {
            members
                .by_id(id)
                .cloned()
                .ok_or_else(|| MirrorError::DanglingMember {
                    kind,
                    owner: owner_name.clone(),
                    member: id.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntityId, EntityKind};
    use crate::host::InMemoryHost;
    use crate::storage::EntityFactory;
    use crate::sync::{ListingStrategy, Synchronizer};
    use std::sync::Arc;

    fn setup() -> (InMemoryHost, Host, Registry, Vec<EntityId>) {
        let memory = InMemoryHost::new();
        let ids: Vec<_> = ["Rough", "Semi", "Finish"]
            .iter()
            .map(|name| memory.insert(EntityKind::Toolpath, name, Some("raster")))
            .collect();
        memory.insert(EntityKind::NcProgram, "Main", None);

        let host = Host::new(memory.clone());
        let factory = EntityFactory::new(host.clone());
        let mut registry = Registry::new(host.clone(), false);
        Synchronizer::new(&factory, ListingStrategy::Bulk)
            .initialise(&mut registry, &EntityKind::ALL)
            .unwrap();
        (memory, host, registry, ids)
    }

    #[test]
    fn test_members_follow_host_order() {
        let (memory, host, registry, ids) = setup();
        memory.set_members(EntityKind::NcProgram, "Main", vec![ids[2], ids[0], ids[1]]);

        let program = registry.by_name(EntityKind::NcProgram, "Main").unwrap();
        let members = resolve_members(&host, &registry, program).unwrap();

        let names: Vec<_> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Finish", "Rough", "Semi"]);
        let toolpaths = registry.collection(EntityKind::Toolpath);
        assert!(Arc::ptr_eq(&members[0], toolpaths.get(2).unwrap()));
    }

    #[test]
    fn test_dangling_member_is_reported() {
        let (memory, host, registry, ids) = setup();
        memory.set_members(EntityKind::NcProgram, "Main", vec![ids[0], EntityId::new(999)]);

        let program = registry.by_name(EntityKind::NcProgram, "Main").unwrap();
        let err = resolve_members(&host, &registry, program).unwrap_err();

        match err {
            MirrorError::DanglingMember { kind, owner, member } => {
                assert_eq!(kind, EntityKind::NcProgram);
                assert_eq!(owner, "Main");
                assert_eq!(member, "999");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_relation() {
        let (_memory, host, registry, _ids) = setup();
        let program = registry.by_name(EntityKind::NcProgram, "Main").unwrap();
        assert!(resolve_members(&host, &registry, program).unwrap().is_empty());
    }

    #[test]
    fn test_non_composite_kind() {
        let (_memory, host, registry, _ids) = setup();
        let toolpath = registry.by_name(EntityKind::Toolpath, "Rough").unwrap();
        assert!(matches!(
            resolve_members(&host, &registry, toolpath),
            Err(MirrorError::NoRelation(EntityKind::Toolpath))
        ));
    }
}
