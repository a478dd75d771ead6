//! Shared response and query models
//!
//! JSON:API document/resource envelopes plus the sort and pagination helpers
//! every listing endpoint uses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

pub mod geometry;

/// Largest page any listing endpoint returns
pub const MAX_PAGE_SIZE: i64 = 1000;

/// JSON:API links object
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
}

impl Links {
    pub fn new(self_link: impl Into<String>) -> Self {
        Self {
            self_link: self_link.into(),
        }
    }
}

/// Top-level JSON:API document
#[derive(Debug, Serialize)]
pub struct Document<T> {
    pub data: T,
    pub links: Links,
}

impl<T> Document<T> {
    pub fn new(data: T, self_link: impl Into<String>) -> Self {
        Self {
            data,
            links: Links::new(self_link),
        }
    }
}

/// Resource linkage: `{"type": "bikes", "id": "7"}`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    pub data: RelationshipData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl Relationship {
    /// To-one relationship
    pub fn to_one(kind: &'static str, id: impl ToString) -> Self {
        Self {
            data: RelationshipData::One(ResourceIdentifier {
                kind,
                id: id.to_string(),
            }),
            links: None,
        }
    }

    /// To-many relationship
    pub fn to_many<I: ToString>(kind: &'static str, ids: impl IntoIterator<Item = I>) -> Self {
        Self {
            data: RelationshipData::Many(
                ids.into_iter()
                    .map(|id| ResourceIdentifier {
                        kind,
                        id: id.to_string(),
                    })
                    .collect(),
            ),
            links: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links = Some(Links::new(link));
        self
    }
}

/// JSON:API resource object
#[derive(Debug, Serialize)]
pub struct Resource<A> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<&'static str, Relationship>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl<A> Resource<A> {
    pub fn new(kind: &'static str, id: impl ToString, attributes: A) -> Self {
        Self {
            id: id.to_string(),
            kind,
            attributes,
            relationships: None,
            links: None,
        }
    }

    pub fn with_relationship(mut self, name: &'static str, relationship: Relationship) -> Self {
        self.relationships
            .get_or_insert_with(BTreeMap::new)
            .insert(name, relationship);
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links = Some(Links::new(link));
        self
    }
}

/// Sort direction for listing endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Append ` AND column > gt AND column < lt` for whichever bounds are set
pub fn push_time_range(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    gt: Option<DateTime<Utc>>,
    lt: Option<DateTime<Utc>>,
) {
    if let Some(gt) = gt {
        builder.push(format!(" AND {} > ", column));
        builder.push_bind(gt);
    }
    if let Some(lt) = lt {
        builder.push(format!(" AND {} < ", column));
        builder.push_bind(lt);
    }
}

/// Escape `%` and `_` for a case-insensitive substring `ILIKE` pattern
pub fn ilike_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Append `ORDER BY`, `LIMIT` and `OFFSET`.
///
/// `column` must come from a closed set of sort keys, never from user input.
pub fn push_order_and_page(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    direction: SortDirection,
    limit: Option<i64>,
    offset: Option<i64>,
    default_limit: i64,
) {
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);

    builder.push(" ORDER BY ");
    builder.push(column);
    builder.push(" ");
    builder.push(direction.as_sql());
    // Stable order across pages
    builder.push(", id ");
    builder.push(direction.as_sql());
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);
}
