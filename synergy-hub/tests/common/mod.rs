/// Common test utilities for integration tests
///
/// Builds a hub over an in-memory record store:
/// - services sharing one store
/// - sessions for each role
/// - seed helpers for projects and tasks
/// - a canned import parser
/// - a local HTTP record store serving one collection
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use synergy_hub::import::{ImportFile, ImportKind, ImportParser, Importer, ParseReport, ParsedRow};
use synergy_hub::services::Services;
use synergy_shared::auth::{CurrentUser, Session};
use synergy_shared::models::{RecordId, Role};
use synergy_shared::store::{HttpRecordStore, MemoryStore, StoreConfig, StoreResult};

/// Test context containing the store and the services over it
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub services: Services,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(store.clone());
        TestContext { store, services }
    }

    pub fn seed_project(&self, name: &str, status: &str, members: &str) -> RecordId {
        self.store.seed(
            "project_c",
            json!({"name_c": name, "status_c": status, "members_c": members, "progress_c": 0}),
        )
    }

    pub fn seed_task(&self, title: &str, project_id: RecordId, assignee: Option<RecordId>, creator: Option<RecordId>) -> RecordId {
        self.store.seed(
            "task_c",
            json!({
                "title_c": title,
                "description_c": "Seeded task",
                "priority_c": "High",
                "status_c": "To Do",
                "due_date_c": "2024-09-30",
                "project_id_c": project_id,
                "assignee_id_c": assignee,
                "created_by_c": creator,
                "created_at_c": "2024-09-01T10:00:00Z",
                "updated_at_c": "2024-09-01T10:00:00Z"
            }),
        )
    }

    /// Importer whose parser returns `report` for any file
    pub fn importer(&self, report: ParseReport) -> (Importer, Arc<CannedParser>) {
        let parser = Arc::new(CannedParser::new(report));
        let importer = Importer::new(
            parser.clone(),
            self.services.projects.clone(),
            self.services.tasks.clone(),
        );
        (importer, parser)
    }
}

/// A session signed in as `id` with `role`
pub fn session(id: RecordId, role: Role) -> Session {
    Session::signed_in(CurrentUser::new(id, format!("User {}", id), role))
}

pub fn valid_row(row_number: usize, data: JsonValue) -> ParsedRow {
    ParsedRow {
        row_number,
        valid: true,
        data: data.as_object().cloned().unwrap_or_default(),
        errors: Vec::new(),
    }
}

pub fn invalid_row(row_number: usize, error: &str) -> ParsedRow {
    ParsedRow {
        row_number,
        valid: false,
        data: Default::default(),
        errors: vec![error.to_string()],
    }
}

pub fn csv(name: &str) -> ImportFile {
    ImportFile::new(name, "name,status\n")
}

/// Parser returning a fixed report and counting calls
pub struct CannedParser {
    report: ParseReport,
    calls: AtomicUsize,
}

impl CannedParser {
    pub fn new(report: ParseReport) -> Self {
        CannedParser {
            report,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImportParser for CannedParser {
    async fn parse(&self, _kind: ImportKind, _file: &ImportFile) -> StoreResult<ParseReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.report.clone())
    }
}

/// Starts an HTTP store on a local port answering fetches with `records`
///
/// Responses honour `pagingInfo` and never report a total. Returns the
/// client and a counter of served requests.
pub async fn serve_records(records: Vec<JsonValue>) -> (HttpRecordStore, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = Arc::new(AtomicUsize::new(0));

    let counter = served.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            let body = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                raw.extend_from_slice(&chunk[..n]);
                if let Some(body) = request_body(&raw) {
                    break body;
                }
                if n == 0 {
                    break JsonValue::Null;
                }
            };

            let limit = body["pagingInfo"]["limit"].as_u64().unwrap_or(records.len() as u64) as usize;
            let offset = body["pagingInfo"]["offset"].as_u64().unwrap_or(0) as usize;
            let page: Vec<&JsonValue> = records.iter().skip(offset).take(limit).collect();
            let payload = json!({"success": true, "data": page}).to_string();

            counter.fetch_add(1, Ordering::SeqCst);
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                payload.len(),
                payload
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    let store = HttpRecordStore::new(StoreConfig {
        base_url: format!("http://{}", addr),
        project_id: "test".to_string(),
        public_key: "pk_test".to_string(),
        request_timeout_secs: Some(5),
    })
    .unwrap();
    (store, served)
}

/// The JSON body once the whole request has arrived
fn request_body(raw: &[u8]) -> Option<JsonValue> {
    let header_end = raw.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let head = String::from_utf8_lossy(&raw[..header_end]);
    let length: usize = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0);

    if raw.len() < header_end + length {
        return None;
    }
    Some(serde_json::from_slice(&raw[header_end..header_end + length]).unwrap_or(JsonValue::Null))
}
