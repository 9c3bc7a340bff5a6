use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::MirrorError;

/// The closed set of entity kinds the host manages.
///
/// Each kind is its own namespace on the host: names are unique within a
/// kind, never across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Boundary,
    Pattern,
    FeatureSet,
    Toolpath,
    Tool,
    Workplane,
    Level,
    Model,
    StockModel,
    Group,
    NcProgram,
    Setup,
}

impl EntityKind {
    /// Every kind, in the order a session-wide pass visits them.
    pub const ALL: [EntityKind; 12] = [
        EntityKind::Boundary,
        EntityKind::Pattern,
        EntityKind::FeatureSet,
        EntityKind::Toolpath,
        EntityKind::Tool,
        EntityKind::Workplane,
        EntityKind::Level,
        EntityKind::Model,
        EntityKind::StockModel,
        EntityKind::Group,
        EntityKind::NcProgram,
        EntityKind::Setup,
    ];

    /// Host-side tag used in commands (`DELETE TOOL 'T1'`).
    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Boundary => "BOUNDARY",
            EntityKind::Pattern => "PATTERN",
            EntityKind::FeatureSet => "FEATURESET",
            EntityKind::Toolpath => "TOOLPATH",
            EntityKind::Tool => "TOOL",
            EntityKind::Workplane => "WORKPLANE",
            EntityKind::Level => "LEVEL",
            EntityKind::Model => "MODEL",
            EntityKind::StockModel => "STOCKMODEL",
            EntityKind::Group => "GROUP",
            EntityKind::NcProgram => "NCPROGRAM",
            EntityKind::Setup => "SETUP",
        }
    }

    /// Case-insensitive tag lookup.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }

    /// Whether the factory has to ask the host for a sub-type before it can
    /// build an entity of this kind.
    pub fn has_sub_type(self) -> bool {
        matches!(
            self,
            EntityKind::Tool | EntityKind::Boundary | EntityKind::Toolpath
        )
    }

    /// Kind of the members in this kind's ordered membership relation.
    pub fn member_kind(self) -> Option<EntityKind> {
        match self {
            EntityKind::NcProgram | EntityKind::Setup => Some(EntityKind::Toolpath),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityKind {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| MirrorError::UnsupportedKind(s.to_string()))
    }
}
