use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{EntityKind, MirrorError, Result};

/// Stable host-assigned identifier of an entity.
///
/// Names can be reused after a delete; ids cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Ids delivered inside a numeric array response.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
            Some(Self(value as u64))
        } else {
            None
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().trim_matches(|c| c == '\'' || c == '"');
        if let Ok(raw) = s.parse::<u64>() {
            return Ok(Self(raw));
        }
        s.parse::<f64>()
            .ok()
            .and_then(Self::from_f64)
            .ok_or_else(|| format!("'{}' is not an entity id", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    EndMill,
    BallNosed,
    TipRadiused,
    TaperedSpherical,
    TaperedTipped,
    Drill,
    TippedDisc,
    OffCentreTipRadiused,
    ThreadMill,
    Routing,
    Form,
    Barrel,
}

impl ToolType {
    /// Host spellings are lower-case with `_` separators (`ball_nosed`).
    pub fn from_host(value: &str) -> Option<Self> {
        let normalized = normalize_sub_type(value);
        let tool_type = match normalized.as_str() {
            "end_mill" => ToolType::EndMill,
            "ball_nosed" => ToolType::BallNosed,
            "tip_radiused" => ToolType::TipRadiused,
            "tapered_spherical" => ToolType::TaperedSpherical,
            "tapered_tipped" => ToolType::TaperedTipped,
            "drill" => ToolType::Drill,
            "tipped_disc" => ToolType::TippedDisc,
            "off_centre_tip_rad" | "off_centre_tip_radiused" => ToolType::OffCentreTipRadiused,
            "thread_mill" => ToolType::ThreadMill,
            "routing" => ToolType::Routing,
            "form" => ToolType::Form,
            "barrel" => ToolType::Barrel,
            _ => return None,
        };
        Some(tool_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    Block,
    Rest,
    Selected,
    Shallow,
    Silhouette,
    Collision,
    StockModelRest,
    ContactPoint,
    ContactConversion,
    Boolean,
    UserDefined,
    Sketch,
}

impl BoundaryType {
    pub fn from_host(value: &str) -> Option<Self> {
        let normalized = normalize_sub_type(value);
        let boundary_type = match normalized.as_str() {
            "block" => BoundaryType::Block,
            "rest" => BoundaryType::Rest,
            "selected" => BoundaryType::Selected,
            "shallow" => BoundaryType::Shallow,
            "silhouette" => BoundaryType::Silhouette,
            "collision" => BoundaryType::Collision,
            "stockmodel_rest" | "stock_model_rest" => BoundaryType::StockModelRest,
            "contact_point" => BoundaryType::ContactPoint,
            "contact_conversion" => BoundaryType::ContactConversion,
            "boolean" => BoundaryType::Boolean,
            "user" | "user_defined" => BoundaryType::UserDefined,
            "sketch" => BoundaryType::Sketch,
            _ => return None,
        };
        Some(boundary_type)
    }
}

/// Strategy name of a toolpath (`raster`, `constantz`, `drill`, ...).
///
/// The host adds strategies between versions, so this stays open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolpathStrategy(String);

impl ToolpathStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Kind-specific payload of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", content = "value", rename_all = "snake_case")]
pub enum EntityDetail {
    Tool(ToolType),
    Boundary(BoundaryType),
    Toolpath(ToolpathStrategy),
    Plain,
}

impl EntityDetail {
    /// Build the detail for `kind` from the host's sub-type string.
    pub fn from_sub_type(kind: EntityKind, sub_type: Option<&str>) -> Result<Self> {
        let unsupported = |value: &str| MirrorError::UnsupportedSubType {
            kind,
            sub_type: value.to_string(),
        };

        match kind {
            EntityKind::Tool => {
                let value = sub_type.unwrap_or_default();
                ToolType::from_host(value)
                    .map(EntityDetail::Tool)
                    .ok_or_else(|| unsupported(value))
            }
            EntityKind::Boundary => {
                let value = sub_type.unwrap_or_default();
                BoundaryType::from_host(value)
                    .map(EntityDetail::Boundary)
                    .ok_or_else(|| unsupported(value))
            }
            EntityKind::Toolpath => match sub_type {
                Some(value) if !value.trim().is_empty() => {
                    Ok(EntityDetail::Toolpath(ToolpathStrategy::new(value)))
                }
                _ => Err(unsupported(sub_type.unwrap_or_default())),
            },
            _ => Ok(EntityDetail::Plain),
        }
    }
}

/// One row of a host listing: what the host told us about an entity before
/// the factory turned it into an [`Entity`](super::Entity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub id: Option<EntityId>,
    pub name: String,
    pub sub_type: Option<String>,
}

impl EntityRecord {
    pub fn named(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: None,
            name: name.into(),
            sub_type: None,
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }
}

fn normalize_sub_type(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_parsing() {
        assert_eq!("42".parse::<EntityId>().unwrap(), EntityId::new(42));
        assert_eq!(" '7' ".parse::<EntityId>().unwrap(), EntityId::new(7));
        assert_eq!("3.0".parse::<EntityId>().unwrap(), EntityId::new(3));
        assert!("3.5".parse::<EntityId>().is_err());
        assert!("abc".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_tool_sub_types() {
        assert_eq!(ToolType::from_host("ball_nosed"), Some(ToolType::BallNosed));
        assert_eq!(ToolType::from_host("End Mill"), Some(ToolType::EndMill));
        assert_eq!(ToolType::from_host("laser"), None);
    }

    #[test]
    fn test_detail_requires_known_sub_type() {
        let detail = EntityDetail::from_sub_type(EntityKind::Boundary, Some("user")).unwrap();
        assert_eq!(detail, EntityDetail::Boundary(BoundaryType::UserDefined));

        let err = EntityDetail::from_sub_type(EntityKind::Tool, Some("laser")).unwrap_err();
        assert!(matches!(err, MirrorError::UnsupportedSubType { kind: EntityKind::Tool, .. }));

        assert!(EntityDetail::from_sub_type(EntityKind::Toolpath, None).is_err());
    }

    #[test]
    fn test_plain_kinds_ignore_sub_type() {
        let detail = EntityDetail::from_sub_type(EntityKind::Workplane, Some("anything")).unwrap();
        assert_eq!(detail, EntityDetail::Plain);
    }

    #[test]
    fn test_strategy_is_normalized() {
        assert_eq!(ToolpathStrategy::new(" Raster ").as_str(), "raster");
    }
}
