//! Company resource model
//!
//! Shared documents (policies, templates, brand assets, guides, forms)
//! uploaded by HR and administrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{lookup, Entity, RecordId};

/// Resource category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    #[default]
    Policies,
    Templates,
    Branding,
    Guides,
    Forms,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 5] = [
        ResourceCategory::Policies,
        ResourceCategory::Templates,
        ResourceCategory::Branding,
        ResourceCategory::Guides,
        ResourceCategory::Forms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Policies => "Policies",
            ResourceCategory::Templates => "Templates",
            ResourceCategory::Branding => "Branding",
            ResourceCategory::Guides => "Guides",
            ResourceCategory::Forms => "Forms",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded company resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyResource {
    #[serde(rename = "Id")]
    pub id: RecordId,

    #[serde(rename = "title_c", default)]
    pub title: String,

    #[serde(rename = "description_c", default)]
    pub description: Option<String>,

    #[serde(rename = "category_c", default)]
    pub category: ResourceCategory,

    /// File type label, e.g. `PDF` or `DOCX`
    #[serde(rename = "file_type_c", default)]
    pub file_type: Option<String>,

    /// File size in bytes
    #[serde(rename = "file_size_c", default)]
    pub file_size: u64,

    #[serde(rename = "file_url_c", default)]
    pub file_url: Option<String>,

    #[serde(rename = "uploaded_by_c", default, with = "lookup")]
    pub uploaded_by: Option<RecordId>,

    #[serde(rename = "created_at_c", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for CompanyResource {
    const COLLECTION: &'static str = "company_resource_c";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "title_c",
        "description_c",
        "category_c",
        "file_type_c",
        "file_size_c",
        "file_url_c",
        "uploaded_by_c",
        "created_at_c",
    ];

    fn id(&self) -> RecordId {
        self.id
    }
}

impl CompanyResource {
    /// Case-insensitive match on title or description
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// Input for uploading a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateResource {
    #[serde(rename = "title_c")]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[serde(rename = "description_c", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "category_c")]
    pub category: ResourceCategory,

    #[serde(rename = "file_type_c")]
    pub file_type: String,

    #[serde(rename = "file_size_c")]
    pub file_size: u64,

    #[serde(rename = "file_url_c", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,

    #[serde(
        rename = "uploaded_by_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub uploaded_by: Option<RecordId>,

    #[serde(rename = "created_at_c")]
    pub created_at: DateTime<Utc>,
}

impl CreateResource {
    pub fn new(title: impl Into<String>, category: ResourceCategory) -> Self {
        CreateResource {
            title: title.into(),
            description: None,
            category,
            file_type: "PDF".to_string(),
            file_size: 0,
            file_url: None,
            uploaded_by: None,
            created_at: Utc::now(),
        }
    }
}
