//! Spreadsheet import reconciliation
//!
//! An import turns an uploaded CSV/XLSX file into project or task records:
//!
//! ```text
//! file ──▶ remote parse function ──▶ rows {rowNumber, valid, data, errors}
//!                                          │
//!                      valid rows ─────────┤ invalid rows are counted only
//!                          │
//!                   map to create payload ──▶ unmappable rows fail locally
//!                          │
//!                  one bulk create call ──▶ per-record outcomes
//!                          │
//!                   ImportSummary {success, created, failed, invalidRows, details}
//! ```
//!
//! There are no retries. A file without a single valid row never reaches
//! the bulk create call.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use validator::Validate;

use synergy_shared::auth::authorization::{require_project_management, require_role, TASK_MANAGER_ROLES};
use synergy_shared::auth::Session;
use synergy_shared::models::project::members;
use synergy_shared::models::{
    CreateProject, CreateTask, Entity, ProjectStatus, RecordId, TaskPriority, TaskStatus,
};
use synergy_shared::store::{HttpRecordStore, StoreError, StoreResult};

use crate::error::{ServiceError, ServiceResult};
use crate::repository::BatchOutcome;
use crate::services::{ProjectService, TaskService};

/// What an import file contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Project,
    Task,
}

impl ImportKind {
    /// Remote function that parses files of this kind
    pub fn parse_function(&self) -> &'static str {
        match self {
            ImportKind::Project => "parse_project_import",
            ImportKind::Task => "parse_task_import",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Project => "project",
            ImportKind::Task => "task",
        }
    }
}

/// An uploaded file
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub file_name: String,
    pub content: Bytes,
}

impl ImportFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        ImportFile {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "import".to_string());
        Ok(ImportFile::new(file_name, content))
    }

    fn mime_type(&self) -> &'static str {
        let lower = self.file_name.to_lowercase();
        if lower.ends_with(".xlsx") {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        } else if lower.ends_with(".xls") {
            "application/vnd.ms-excel"
        } else {
            "text/csv"
        }
    }
}

/// One row as reported by the parse function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    #[serde(rename = "rowNumber")]
    pub row_number: usize,

    pub valid: bool,

    #[serde(default)]
    pub data: Map<String, JsonValue>,

    #[serde(default)]
    pub errors: Vec<String>,
}

/// Parse function result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    #[serde(default)]
    pub results: Vec<ParsedRow>,

    #[serde(rename = "validRows", default)]
    pub valid_rows: usize,

    #[serde(rename = "invalidRows", default)]
    pub invalid_rows: usize,
}

/// Parses import files into rows
#[async_trait]
pub trait ImportParser: Send + Sync {
    async fn parse(&self, kind: ImportKind, file: &ImportFile) -> StoreResult<ParseReport>;
}

#[async_trait]
impl ImportParser for HttpRecordStore {
    async fn parse(&self, kind: ImportKind, file: &ImportFile) -> StoreResult<ParseReport> {
        let part = reqwest::multipart::Part::bytes(file.content.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(file.mime_type())
            .map_err(|e| StoreError::Config(format!("Invalid upload type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        self.invoke_function(kind.parse_function(), form).await
    }
}

/// Per-row result in an import summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RowOutcome {
    Created { id: RecordId },
    Failed { message: String },
    Invalid { errors: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDetail {
    #[serde(rename = "rowNumber")]
    pub row_number: usize,

    #[serde(flatten)]
    pub outcome: RowOutcome,
}

/// Outcome of one import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    /// True when at least one record was created
    pub success: bool,
    pub created: usize,

    /// Valid rows that were not created
    pub failed: usize,

    /// Rows the parser flagged as invalid
    #[serde(rename = "invalidRows")]
    pub invalid_rows: usize,

    pub details: Vec<ImportDetail>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Runs imports against the project and task collections
pub struct Importer {
    parser: Arc<dyn ImportParser>,
    projects: ProjectService,
    tasks: TaskService,
}

impl Importer {
    pub fn new(parser: Arc<dyn ImportParser>, projects: ProjectService, tasks: TaskService) -> Self {
        Importer {
            parser,
            projects,
            tasks,
        }
    }

    /// Parses `file` remotely and creates the valid rows in one batch
    pub async fn run(
        &self,
        session: &Session,
        kind: ImportKind,
        file: &ImportFile,
    ) -> ServiceResult<ImportSummary> {
        authorize(session, kind)?;

        tracing::info!(kind = kind.as_str(), file = %file.file_name, bytes = file.content.len(), "Parsing import file");
        let report = self.parser.parse(kind, file).await.map_err(|e| {
            tracing::error!(kind = kind.as_str(), error = %e, "Import parse failed");
            ServiceError::Store(e)
        })?;

        self.reconcile(session, kind, report).await
    }

    /// Maps the parsed rows and submits them as one bulk create
    pub async fn reconcile(
        &self,
        session: &Session,
        kind: ImportKind,
        report: ParseReport,
    ) -> ServiceResult<ImportSummary> {
        authorize(session, kind)?;

        let mut summary = ImportSummary {
            invalid_rows: report
                .invalid_rows
                .max(report.results.iter().filter(|r| !r.valid).count()),
            ..Default::default()
        };

        let mut valid = Vec::new();
        for row in report.results {
            if row.valid {
                valid.push(row);
            } else {
                summary.details.push(ImportDetail {
                    row_number: row.row_number,
                    outcome: RowOutcome::Invalid { errors: row.errors },
                });
            }
        }

        if valid.is_empty() {
            summary.message = Some("No valid rows to import".to_string());
            tracing::warn!(kind = kind.as_str(), invalid_rows = summary.invalid_rows, "Import has no valid rows");
            return Ok(summary);
        }

        let creator = session.user_id();
        let (row_numbers, ids) = match kind {
            ImportKind::Project => {
                let (rows, payloads) = map_rows(valid, &mut summary, |data| project_payload(data, creator));
                let batch = self.projects.repository().create_many(&payloads).await?;
                (rows, created_ids(batch))
            }
            ImportKind::Task => {
                let (rows, payloads) = map_rows(valid, &mut summary, |data| task_payload(data, creator));
                let batch = self.tasks.repository().create_many(&payloads).await?;
                (rows, created_ids(batch))
            }
        };

        if row_numbers.is_empty() {
            summary.message = Some("No rows could be mapped to records".to_string());
        } else {
            let (ids, failures) = ids;
            let failed_at: HashMap<usize, String> = failures.into_iter().collect();
            let mut created = ids.into_iter();

            for (index, row_number) in row_numbers.into_iter().enumerate() {
                let outcome = match failed_at.get(&index) {
                    Some(message) => RowOutcome::Failed {
                        message: message.clone(),
                    },
                    None => match created.next() {
                        Some(id) => RowOutcome::Created { id },
                        None => RowOutcome::Failed {
                            message: "Record rejected by store".to_string(),
                        },
                    },
                };
                summary.details.push(ImportDetail { row_number, outcome });
            }
        }

        summary.details.sort_by_key(|d| d.row_number);
        summary.created = summary
            .details
            .iter()
            .filter(|d| matches!(d.outcome, RowOutcome::Created { .. }))
            .count();
        summary.failed = summary
            .details
            .iter()
            .filter(|d| matches!(d.outcome, RowOutcome::Failed { .. }))
            .count();
        summary.success = summary.created > 0;

        if summary.failed > 0 {
            tracing::warn!(
                kind = kind.as_str(),
                created = summary.created,
                failed = summary.failed,
                invalid_rows = summary.invalid_rows,
                "Import partially failed"
            );
        } else {
            tracing::info!(kind = kind.as_str(), created = summary.created, invalid_rows = summary.invalid_rows, "Import complete");
        }

        Ok(summary)
    }
}

fn authorize(session: &Session, kind: ImportKind) -> ServiceResult<()> {
    match kind {
        ImportKind::Project => require_project_management(session)?,
        ImportKind::Task => require_role(session, TASK_MANAGER_ROLES)?,
    }
    Ok(())
}

/// Splits valid rows into payloads and local mapping failures
///
/// Returns the row numbers aligned with the payloads.
fn map_rows<P, F>(rows: Vec<ParsedRow>, summary: &mut ImportSummary, map: F) -> (Vec<usize>, Vec<P>)
where
    F: Fn(&RowData) -> Result<P, String>,
{
    let mut row_numbers = Vec::new();
    let mut payloads = Vec::new();

    for row in rows {
        match map(&RowData::new(&row.data)) {
            Ok(payload) => {
                row_numbers.push(row.row_number);
                payloads.push(payload);
            }
            Err(message) => {
                tracing::debug!(row = row.row_number, %message, "Import row not mappable");
                summary.details.push(ImportDetail {
                    row_number: row.row_number,
                    outcome: RowOutcome::Failed { message },
                });
            }
        }
    }

    (row_numbers, payloads)
}

type CreatedIds = (Vec<RecordId>, Vec<(usize, String)>);

fn created_ids<E: Entity>(batch: BatchOutcome<E>) -> CreatedIds {
    let ids = batch.created.iter().map(|e| e.id()).collect();
    let failures = batch.failed.into_iter().map(|f| (f.index, f.message)).collect();
    (ids, failures)
}

/// Parsed row fields keyed by normalized column name
///
/// Column names are matched case-insensitively, with spaces as underscores
/// and an optional `_c` suffix: `Start Date`, `start_date` and
/// `start_date_c` are the same column.
struct RowData<'a> {
    fields: HashMap<String, &'a JsonValue>,
}

impl<'a> RowData<'a> {
    fn new(data: &'a Map<String, JsonValue>) -> Self {
        let fields = data
            .iter()
            .map(|(key, value)| (normalize_key(key), value))
            .collect();
        RowData { fields }
    }

    fn get(&self, name: &str) -> Option<&'a JsonValue> {
        self.fields.get(name).copied().filter(|v| !is_empty(v))
    }

    fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| match v {
            JsonValue::String(s) => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    fn required_text(&self, name: &str) -> Result<String, String> {
        self.text(name).ok_or_else(|| format!("{} is required", name))
    }

    fn id(&self, name: &str) -> Result<Option<RecordId>, String> {
        self.get(name).map(|v| coerce_id(name, v)).transpose()
    }

    fn label<T>(&self, name: &str, parse: fn(&str) -> Option<T>) -> Result<Option<T>, String> {
        self.text(name)
            .map(|label| parse(&label).ok_or_else(|| format!("Unknown {} '{}'", name, label)))
            .transpose()
    }
}

fn normalize_key(key: &str) -> String {
    let key = key.trim().to_lowercase().replace([' ', '-'], "_");
    key.strip_suffix("_c").map(str::to_string).unwrap_or(key)
}

fn is_empty(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Integer id from a number or a numeric string
fn coerce_id(name: &str, value: &JsonValue) -> Result<RecordId, String> {
    let id = match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse::<RecordId>().ok(),
        _ => None,
    };
    id.ok_or_else(|| format!("{} must be a whole number", name))
}

fn member_ids(value: &JsonValue) -> Result<Vec<RecordId>, String> {
    match value {
        JsonValue::String(s) => members::split(s).map_err(|bad| format!("invalid member id: {}", bad)),
        JsonValue::Number(_) => coerce_id("members", value).map(|id| vec![id]),
        JsonValue::Array(items) => items.iter().map(|v| coerce_id("members", v)).collect(),
        _ => Err("members must be a comma-separated list of ids".to_string()),
    }
}

fn validation_message(errors: validator::ValidationErrors) -> String {
    match ServiceError::from(errors) {
        ServiceError::Validation(message) => message,
        other => other.to_string(),
    }
}

fn project_payload(row: &RowData, creator: Option<RecordId>) -> Result<CreateProject, String> {
    let mut payload = CreateProject::new(row.required_text("name")?);
    payload.description = row.text("description");
    payload.status = row
        .label("status", ProjectStatus::from_label)?
        .unwrap_or_default();
    payload.start_date = row.text("start_date");
    payload.end_date = row.text("end_date");

    if let Some(progress) = row.id("progress")? {
        payload.progress =
            i32::try_from(progress).map_err(|_| "progress is out of range".to_string())?;
    }
    if let Some(value) = row.get("members") {
        let mut ids = member_ids(value)?;
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(*id));
        payload.members = ids;
    }
    payload.created_by = creator;

    payload.validate().map_err(validation_message)?;
    Ok(payload)
}

fn task_payload(row: &RowData, creator: Option<RecordId>) -> Result<CreateTask, String> {
    let project_id = row
        .id("project_id")?
        .ok_or_else(|| "project_id is required".to_string())?;

    let mut payload = CreateTask::new(row.required_text("title")?, project_id);
    payload.description = row.text("description");
    payload.priority = row
        .label("priority", TaskPriority::from_label)?
        .unwrap_or_default();
    payload.status = row.label("status", TaskStatus::from_label)?.unwrap_or_default();
    payload.due_date = row.text("due_date");
    payload.assignee_id = row.id("assignee_id")?;
    payload.created_by = creator;

    payload.validate().map_err(validation_message)?;
    Ok(payload)
}
