//! Scriptable in-process host.
//!
//! `InMemoryHost` understands the vocabulary in [`command`](super::command)
//! plus `CREATE <KIND> ['<NAME>'] [SUBTYPE]`, keeps a log of everything it
//! was sent, and lets tests mutate "host-side" state behind the mirror's back.

use serde_json::{json, Value as Json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{HostResponse, QueryAdapter};
use crate::core::{EntityId, EntityKind, MirrorError, Result};

/// Shape used for name listings and bulk listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingShape {
    /// Newline-delimited quoted names; tab-separated bulk rows.
    #[default]
    Text,
    /// JSON documents.
    Document,
}

#[derive(Debug, Clone)]
struct StoredEntity {
    kind: EntityKind,
    id: EntityId,
    name: String,
    sub_type: Option<String>,
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    entities: Vec<StoredEntity>,
    active: HashMap<EntityKind, String>,
    members: HashMap<EntityId, Vec<EntityId>>,
    busy_polls: u32,
    scripted: HashMap<String, HostResponse>,
    executed: Vec<String>,
    queries: Vec<String>,
    shape: ListingShape,
    disconnected: bool,
}

impl HostState {
    fn find(&self, kind: EntityKind, name: &str) -> Option<&StoredEntity> {
        self.entities
            .iter()
            .find(|e| e.kind == kind && e.name.eq_ignore_ascii_case(name))
    }

    fn find_mut(&mut self, kind: EntityKind, name: &str) -> Option<&mut StoredEntity> {
        self.entities
            .iter_mut()
            .find(|e| e.kind == kind && e.name.eq_ignore_ascii_case(name))
    }

    fn insert(&mut self, kind: EntityKind, name: &str, sub_type: Option<&str>) -> EntityId {
        self.next_id += 1;
        let id = EntityId::new(self.next_id);
        self.entities.push(StoredEntity {
            kind,
            id,
            name: name.to_string(),
            sub_type: sub_type.map(str::to_string),
        });
        id
    }

    fn remove(&mut self, kind: EntityKind, name: &str) -> bool {
        let Some(pos) = self
            .entities
            .iter()
            .position(|e| e.kind == kind && e.name.eq_ignore_ascii_case(name))
        else {
            return false;
        };
        let removed = self.entities.remove(pos);
        if self
            .active
            .get(&kind)
            .is_some_and(|active| active.eq_ignore_ascii_case(name))
        {
            self.active.remove(&kind);
        }
        self.members.remove(&removed.id);
        true
    }

    fn rename(&mut self, kind: EntityKind, old: &str, new: &str) -> bool {
        let taken = self.entities.iter().any(|e| {
            e.kind == kind && e.name.eq_ignore_ascii_case(new) && !e.name.eq_ignore_ascii_case(old)
        });
        if taken {
            return false;
        }
        let Some(entity) = self.find_mut(kind, old) else {
            return false;
        };
        entity.name = new.to_string();
        if let Some(active) = self.active.get_mut(&kind) {
            if active.eq_ignore_ascii_case(old) {
                *active = new.to_string();
            }
        }
        true
    }

    fn next_name(&self, kind: EntityKind, prefix: Option<&str>) -> String {
        let prefix = prefix.unwrap_or_default();
        if !prefix.is_empty() && self.find(kind, prefix).is_none() {
            return prefix.to_string();
        }
        let separator = if prefix.is_empty() { "" } else { "_" };
        (1..)
            .map(|n| format!("{}{}{}", prefix, separator, n))
            .find(|candidate| self.find(kind, candidate).is_none())
            .unwrap_or_default()
    }

    fn names(&self, kind: EntityKind) -> Vec<String> {
        self.entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.name.clone())
            .collect()
    }

    fn apply(&mut self, command: &str) {
        let tokens = tokenize(command);
        let kind = tokens.get(1).and_then(|t| EntityKind::from_tag(t));
        match (tokens.first().map(String::as_str), kind) {
            (Some("DELETE"), Some(kind)) => {
                if let Some(name) = tokens.get(2) {
                    self.remove(kind, name);
                }
            }
            (Some("RENAME"), Some(kind)) => {
                if let (Some(old), Some(new)) = (tokens.get(2), tokens.get(3)) {
                    self.rename(kind, old, new);
                }
            }
            (Some("ACTIVATE"), Some(kind)) => {
                if let Some(name) = tokens.get(2) {
                    if let Some(entity) = self.find(kind, name) {
                        let name = entity.name.clone();
                        self.active.insert(kind, name);
                    }
                }
            }
            (Some("DEACTIVATE"), Some(kind)) => {
                self.active.remove(&kind);
            }
            (Some("CREATE"), Some(kind)) => {
                let name = match tokens.get(2) {
                    Some(name) => name.clone(),
                    None => self.next_name(kind, None),
                };
                if self.find(kind, &name).is_none() {
                    let sub_type = tokens.get(3).map(String::as_str);
                    self.insert(kind, &name, sub_type);
                }
            }
            _ => {}
        }
    }

    fn answer(&mut self, command: &str) -> HostResponse {
        if let Some(reply) = self.scripted.get(command) {
            return reply.clone();
        }

        let tokens = tokenize(command);
        let words: Vec<&str> = tokens.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["LIST", "ALL"] => self.bulk_listing(),
            ["LIST", tag] => match EntityKind::from_tag(tag) {
                Some(kind) => self.name_listing(kind),
                None => unknown(command),
            },
            ["PRINT", "BUSY"] => {
                let busy = self.busy_polls > 0;
                self.busy_polls = self.busy_polls.saturating_sub(1);
                HostResponse::Scalar(if busy { "1" } else { "0" }.to_string())
            }
            ["PRINT", "ACTIVE", tag] => match EntityKind::from_tag(tag) {
                Some(kind) => HostResponse::Scalar(
                    self.active.get(&kind).map(|name| format!("'{}'", name)).unwrap_or_default(),
                ),
                None => unknown(command),
            },
            ["PRINT", "NEXTNAME", tag, rest @ ..] => match EntityKind::from_tag(tag) {
                Some(kind) => HostResponse::Scalar(self.next_name(kind, rest.first().copied())),
                None => unknown(command),
            },
            ["PRINT", query, tag, name] => {
                let Some(kind) = EntityKind::from_tag(tag) else {
                    return unknown(command);
                };
                let entity = self.find(kind, name).cloned();
                match (*query, entity) {
                    ("EXISTS", entity) => {
                        HostResponse::Scalar(if entity.is_some() { "1" } else { "0" }.to_string())
                    }
                    ("ID", Some(entity)) => HostResponse::Scalar(entity.id.to_string()),
                    ("TYPE", Some(entity)) => {
                        HostResponse::Scalar(entity.sub_type.unwrap_or_default())
                    }
                    ("MEMBERS", Some(entity)) => HostResponse::Numbers(
                        self.members
                            .get(&entity.id)
                            .map(|ids| ids.iter().map(|id| id.raw() as f64).collect())
                            .unwrap_or_default(),
                    ),
                    (_, None) => HostResponse::Scalar(format!(
                        "Error: {} '{}' does not exist",
                        kind, name
                    )),
                    _ => unknown(command),
                }
            }
            _ => unknown(command),
        }
    }

    fn name_listing(&self, kind: EntityKind) -> HostResponse {
        let names = self.names(kind);
        match self.shape {
            ListingShape::Text => HostResponse::Scalar(
                names
                    .iter()
                    .map(|name| format!("'{}'", name))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ListingShape::Document => {
                HostResponse::Document(Json::Array(names.into_iter().map(|name| json!({ "name": name })).collect()))
            }
        }
    }

    fn bulk_listing(&self) -> HostResponse {
        match self.shape {
            ListingShape::Text => HostResponse::Scalar(
                self.entities
                    .iter()
                    .map(|e| {
                        format!(
                            "{}\t{}\t'{}'\t{}",
                            e.kind,
                            e.id,
                            e.name,
                            e.sub_type.as_deref().unwrap_or_default()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ListingShape::Document => HostResponse::Document(Json::Array(
                self.entities
                    .iter()
                    .map(|e| {
                        json!({
                            "type": e.kind.tag(),
                            "id": e.id.raw(),
                            "name": e.name,
                            "subtype": e.sub_type.clone().unwrap_or_default(),
                        })
                    })
                    .collect(),
            )),
        }
    }
}

/// In-memory stand-in for the host application.
///
/// Cloning shares state, so a test can keep one handle while the session
/// owns another.
#[derive(Clone, Default)]
pub struct InMemoryHost {
    state: Arc<Mutex<HostState>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing_shape(self, shape: ListingShape) -> Self {
        self.state().shape = shape;
        self
    }

    /// Creates an entity host-side and returns its id.
    pub fn insert(&self, kind: EntityKind, name: &str, sub_type: Option<&str>) -> EntityId {
        self.state().insert(kind, name, sub_type)
    }

    /// Deletes an entity host-side without going through the mirror.
    pub fn remove(&self, kind: EntityKind, name: &str) -> bool {
        self.state().remove(kind, name)
    }

    /// Renames an entity host-side without going through the mirror.
    pub fn rename(&self, kind: EntityKind, old: &str, new: &str) -> bool {
        self.state().rename(kind, old, new)
    }

    pub fn names(&self, kind: EntityKind) -> Vec<String> {
        self.state().names(kind)
    }

    pub fn id_of(&self, kind: EntityKind, name: &str) -> Option<EntityId> {
        self.state().find(kind, name).map(|e| e.id)
    }

    pub fn set_active(&self, kind: EntityKind, name: Option<&str>) {
        let mut state = self.state();
        match name {
            Some(name) => state.active.insert(kind, name.to_string()),
            None => state.active.remove(&kind),
        };
    }

    /// Sets the ordered member ids of a composite entity.
    pub fn set_members(&self, kind: EntityKind, owner: &str, members: Vec<EntityId>) -> bool {
        let mut state = self.state();
        let Some(owner_id) = state.find(kind, owner).map(|e| e.id) else {
            return false;
        };
        state.members.insert(owner_id, members);
        true
    }

    /// The next `polls` busy queries answer "busy".
    pub fn set_busy_for(&self, polls: u32) {
        self.state().busy_polls = polls;
    }

    /// Answers `command` with `reply` until [`clear_scripts`](Self::clear_scripts).
    pub fn script_reply(&self, command: &str, reply: HostResponse) {
        self.state().scripted.insert(command.to_string(), reply);
    }

    pub fn clear_scripts(&self) {
        self.state().scripted.clear();
    }

    /// Every command passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    /// Every query passed to `execute_query`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.state().queries.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.state();
        state.executed.clear();
        state.queries.clear();
    }

    /// Makes every following call fail as if the transport went away.
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QueryAdapter for InMemoryHost {
    fn execute(&mut self, commands: &[String]) -> Result<()> {
        let mut state = self.state();
        if state.disconnected {
            return Err(MirrorError::TransportUnavailable("host disconnected".into()));
        }
        for command in commands {
            state.executed.push(command.clone());
            state.apply(command);
        }
        Ok(())
    }

    fn execute_query(&mut self, command: &str) -> Result<HostResponse> {
        let mut state = self.state();
        if state.disconnected {
            return Err(MirrorError::TransportUnavailable("host disconnected".into()));
        }
        state.queries.push(command.to_string());
        Ok(state.answer(command))
    }
}

fn unknown(command: &str) -> HostResponse {
    HostResponse::Scalar(format!("Error: unknown command '{}'", command))
}

/// Splits on whitespace, keeping single-quoted runs together (quotes removed).
fn tokenize(command: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut had_quotes = false;

    for c in command.chars() {
        match c {
            '\'' => {
                quoted = !quoted;
                had_quotes = true;
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() || had_quotes {
                    tokens.push(std::mem::take(&mut current));
                }
                had_quotes = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || had_quotes {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::command;

    #[test]
    fn test_tokenize_keeps_quoted_names() {
        assert_eq!(
            tokenize("RENAME TOOL 'End Mill 6' 'EM6'"),
            vec!["RENAME", "TOOL", "End Mill 6", "EM6"]
        );
        assert_eq!(tokenize("PRINT NEXTNAME TOOLPATH ''"), vec!["PRINT", "NEXTNAME", "TOOLPATH", ""]);
    }

    #[test]
    fn test_delete_and_rename_commands() {
        let mut host = InMemoryHost::new();
        host.insert(EntityKind::Tool, "T1", Some("drill"));
        host.insert(EntityKind::Tool, "T2", Some("drill"));

        host.execute(&[
            command::rename(EntityKind::Tool, "T1", "T1b"),
            command::delete(EntityKind::Tool, "T2", true),
        ])
        .unwrap();

        assert_eq!(host.names(EntityKind::Tool), vec!["T1b"]);
        assert_eq!(host.executed().len(), 2);
    }

    #[test]
    fn test_next_name_skips_taken_names() {
        let mut host = InMemoryHost::new();
        host.insert(EntityKind::Toolpath, "1", Some("raster"));
        host.insert(EntityKind::Toolpath, "Rough", Some("raster"));

        let reply = host.execute_query(&command::next_name(EntityKind::Toolpath, None)).unwrap();
        assert_eq!(reply, HostResponse::Scalar("2".into()));

        let reply = host
            .execute_query(&command::next_name(EntityKind::Toolpath, Some("Rough")))
            .unwrap();
        assert_eq!(reply, HostResponse::Scalar("Rough_1".into()));
    }

    #[test]
    fn test_missing_entity_answers_with_error_text() {
        let mut host = InMemoryHost::new();
        let reply = host.execute_query(&command::entity_id(EntityKind::Tool, "nope")).unwrap();
        assert!(reply.error_text("ERROR").is_some());
    }

    #[test]
    fn test_busy_countdown() {
        let mut host = InMemoryHost::new();
        host.set_busy_for(2);
        let flags: Vec<_> = (0..3)
            .map(|_| host.execute_query(&command::busy()).unwrap())
            .collect();
        assert_eq!(
            flags,
            vec![
                HostResponse::Scalar("1".into()),
                HostResponse::Scalar("1".into()),
                HostResponse::Scalar("0".into())
            ]
        );
    }

    #[test]
    fn test_disconnect() {
        let mut host = InMemoryHost::new();
        host.disconnect();
        assert!(matches!(
            host.execute(&["X".to_string()]),
            Err(MirrorError::TransportUnavailable(_))
        ));
    }
}
