//! Fetch query descriptor
//!
//! A [`Query`] selects fields, filters with `where` conditions, orders and
//! pages records of one collection. It serializes to the store's JSON query
//! shape:
//!
//! ```json
//! {
//!   "fields": [{"field": {"Name": "title_c"}}],
//!   "where": [{"FieldName": "status_c", "Operator": "EqualTo", "Values": ["Done"]}],
//!   "orderBy": [{"fieldName": "created_at_c", "sorttype": "DESC"}],
//!   "pagingInfo": {"limit": 20, "offset": 0}
//! }
//! ```

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Comparison operator of a `where` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    /// Case-insensitive substring match
    Contains,
    /// Case-sensitive whole-value match
    ExactMatch,
    GreaterThan,
    LessThan,
}

/// One `where` condition; matches when the field satisfies the operator
/// against any of `values`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "FieldName")]
    pub field: String,

    #[serde(rename = "Operator")]
    pub operator: Operator,

    #[serde(rename = "Values")]
    pub values: Vec<JsonValue>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<JsonValue>) -> Self {
        Condition {
            field: field.into(),
            operator,
            values: vec![value.into()],
        }
    }

    pub fn equal_to(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Condition::new(field, Operator::EqualTo, value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Condition::new(field, Operator::Contains, value)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Ascending,

    #[serde(rename = "DESC")]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field: String,

    #[serde(rename = "sorttype")]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub limit: u32,
    pub offset: u32,
}

/// Fetch query for one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<String>,

    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,

    #[serde(rename = "pagingInfo", skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
}

impl Query {
    /// Query selecting the given fields, with no filter, order or paging
    pub fn select(fields: &[&str]) -> Self {
        Query {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging = Some(Paging { limit, offset });
        self
    }

    /// Fills in the field selection when the caller left it empty
    pub fn with_default_fields(mut self, fields: &[&str]) -> Self {
        if self.fields.is_empty() {
            self.fields = fields.iter().map(|f| f.to_string()).collect();
        }
        self
    }
}

fn serialize_fields<S>(fields: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    struct FieldName<'a> {
        #[serde(rename = "Name")]
        name: &'a str,
    }

    #[derive(Serialize)]
    struct FieldRef<'a> {
        field: FieldName<'a>,
    }

    let mut seq = serializer.serialize_seq(Some(fields.len()))?;
    for name in fields {
        seq.serialize_element(&FieldRef {
            field: FieldName { name },
        })?;
    }
    seq.end()
}
