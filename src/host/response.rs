use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as Json;

use crate::core::{EntityId, MirrorError, Result};

lazy_static! {
    static ref QUOTED_NAME: Regex = Regex::new(r#"'([^']*)'|"([^"]*)""#).unwrap();
}

/// Raw reply to a host query.
#[derive(Debug, Clone, PartialEq)]
pub enum HostResponse {
    Scalar(String),
    Numbers(Vec<f64>),
    Document(Json),
}

/// One row of a bulk listing before its type tag is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRow {
    pub tag: String,
    pub id: EntityId,
    pub name: String,
    pub sub_type: Option<String>,
}

impl HostResponse {
    /// Text of a host-side failure, if this response carries one.
    ///
    /// Any scalar containing `sentinel` (case-insensitive) counts, as does a
    /// document string root, a string node of an array root, or an object
    /// root with an `error` key. `Numbers` carry no text and never match.
    /// Name fields inside object nodes are not screened.
    pub fn error_text(&self, sentinel: &str) -> Option<String> {
        let sentinel = sentinel.to_ascii_lowercase();
        let flagged = |text: &str| text.to_ascii_lowercase().contains(&sentinel);
        match self {
            HostResponse::Scalar(text) if flagged(text) => Some(text.trim().to_string()),
            HostResponse::Document(Json::String(text)) if flagged(text) => Some(text.clone()),
            HostResponse::Document(Json::Array(nodes)) => nodes
                .iter()
                .filter_map(Json::as_str)
                .find(|text| flagged(*text))
                .map(str::to_string),
            HostResponse::Document(Json::Object(map)) => map.get("error").map(|err| match err {
                Json::String(text) => text.clone(),
                other => other.to_string(),
            }),
            _ => None,
        }
    }

    pub fn into_scalar(self, command: &str) -> Result<String> {
        match self {
            HostResponse::Scalar(text) => Ok(text),
            HostResponse::Numbers(numbers) if numbers.len() == 1 => Ok(numbers[0].to_string()),
            HostResponse::Document(Json::String(text)) => Ok(text),
            other => Err(malformed(command, format!("expected a scalar, got {:?}", other))),
        }
    }

    /// A single name, unquoted. Empty text means "no name".
    pub fn into_optional_name(self, command: &str) -> Result<Option<String>> {
        let text = self.into_scalar(command)?;
        let name = unquote(text.trim());
        Ok(if name.is_empty() { None } else { Some(name.to_string()) })
    }

    /// Name listing: newline-delimited (optionally quoted) names, or a
    /// document array with one string or `{ "name": .. }` node per name.
    pub fn into_names(self, command: &str) -> Result<Vec<String>> {
        match self {
            HostResponse::Scalar(text) => Ok(parse_name_lines(&text)),
            HostResponse::Document(doc) => document_nodes(command, doc)?
                .into_iter()
                .map(|node| match node {
                    Json::String(name) => Ok(name),
                    Json::Object(map) => map
                        .get("name")
                        .and_then(Json::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| malformed(command, "listing node without a name")),
                    other => Err(malformed(command, format!("unexpected listing node {}", other))),
                })
                .collect(),
            HostResponse::Numbers(_) => Err(malformed(command, "expected a name listing, got numbers")),
        }
    }

    /// Ordered id list, as a numeric array, a delimited scalar or a document
    /// array of numbers or numeric strings.
    pub fn into_ids(self, command: &str) -> Result<Vec<EntityId>> {
        match self {
            HostResponse::Numbers(numbers) => numbers
                .into_iter()
                .map(|n| {
                    EntityId::from_f64(n)
                        .ok_or_else(|| malformed(command, format!("{} is not an entity id", n)))
                })
                .collect(),
            HostResponse::Scalar(text) => text
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| token.parse::<EntityId>().map_err(|e| malformed(command, e)))
                .collect(),
            HostResponse::Document(doc) => document_nodes(command, doc)?
                .into_iter()
                .map(|node| json_id(&node).ok_or_else(|| malformed(command, format!("{} is not an entity id", node))))
                .collect(),
        }
    }

    pub fn into_id(self, command: &str) -> Result<EntityId> {
        let mut ids = self.into_ids(command)?;
        if ids.len() != 1 {
            return Err(malformed(command, format!("expected one id, got {}", ids.len())));
        }
        Ok(ids.remove(0))
    }

    pub fn into_flag(self, command: &str) -> Result<bool> {
        match self {
            HostResponse::Numbers(numbers) if numbers.len() == 1 => Ok(numbers[0] != 0.0),
            HostResponse::Document(Json::Bool(flag)) => Ok(flag),
            HostResponse::Document(Json::Number(n)) => Ok(n.as_f64().unwrap_or(0.0) != 0.0),
            other => {
                let text = other.into_scalar(command)?;
                match text.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" => Ok(true),
                    "0" | "false" | "no" | "" => Ok(false),
                    value => Err(malformed(command, format!("'{}' is not a flag", value))),
                }
            }
        }
    }

    /// Bulk listing of every entity: a document array of
    /// `{ "type", "id", "name", "subtype"? }` objects, or tab-separated
    /// `TYPE\tID\tNAME[\tSUBTYPE]` lines.
    pub fn into_bulk_rows(self, command: &str) -> Result<Vec<BulkRow>> {
        match self {
            HostResponse::Scalar(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| parse_bulk_line(command, line))
                .collect(),
            HostResponse::Document(doc) => document_nodes(command, doc)?
                .into_iter()
                .map(|node| parse_bulk_node(command, node))
                .collect(),
            HostResponse::Numbers(_) => Err(malformed(command, "expected a bulk listing, got numbers")),
        }
    }
}

fn parse_name_lines(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let before = names.len();
        for caps in QUOTED_NAME.captures_iter(line) {
            if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                names.push(name.as_str().to_string());
            }
        }
        if names.len() == before {
            names.push(line.to_string());
        }
    }
    names
}

fn parse_bulk_line(command: &str, line: &str) -> Result<BulkRow> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(malformed(command, format!("bulk row '{}' has {} fields", line, fields.len())));
    }
    let id = fields[1].parse::<EntityId>().map_err(|e| malformed(command, e))?;
    let sub_type = fields
        .get(3)
        .map(|s| unquote(s))
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(BulkRow {
        tag: fields[0].to_string(),
        id,
        name: unquote(fields[2]).to_string(),
        sub_type,
    })
}

fn parse_bulk_node(command: &str, node: Json) -> Result<BulkRow> {
    let field = |key: &str| node.get(key).and_then(Json::as_str).map(str::to_string);
    let tag = field("type").ok_or_else(|| malformed(command, format!("bulk node without type: {}", node)))?;
    let name = field("name").ok_or_else(|| malformed(command, format!("bulk node without name: {}", node)))?;
    let id = node
        .get("id")
        .and_then(json_id)
        .ok_or_else(|| malformed(command, format!("bulk node without id: {}", node)))?;
    let sub_type = field("subtype").filter(|s| !s.is_empty());
    Ok(BulkRow { tag, id, name, sub_type })
}

fn document_nodes(command: &str, doc: Json) -> Result<Vec<Json>> {
    match doc {
        Json::Array(nodes) => Ok(nodes),
        Json::Object(mut map) => match map.remove("items") {
            Some(Json::Array(nodes)) => Ok(nodes),
            _ => Err(malformed(command, "document has no 'items' array")),
        },
        Json::Null => Ok(Vec::new()),
        other => Err(malformed(command, format!("expected an array document, got {}", other))),
    }
}

fn json_id(node: &Json) -> Option<EntityId> {
    match node {
        Json::Number(n) => n
            .as_u64()
            .map(EntityId::new)
            .or_else(|| n.as_f64().and_then(EntityId::from_f64)),
        Json::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn malformed(command: &str, detail: impl Into<String>) -> MirrorError {
    MirrorError::MalformedResponse {
        command: command.to_string(),
        detail: detail.into(),
    }
}
