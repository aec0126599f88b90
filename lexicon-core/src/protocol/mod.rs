use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::events::{CoreEvent, EventSink};
use crate::model::credential::Credential;
use crate::model::entry::VocabKind;
use crate::model::filter::GenerationFilter;
use crate::model::run::{items_requested, BatchCount};
use crate::services::generation::HttpGenerationClient;
use crate::services::session::Session;
use crate::services::vocabulary_store::{JsonFileStore, VocabularyStore};

mod command;
mod server;

use command::Command;
pub use server::serve;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn get_str<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

/// Request id of a raw line, if it parses at all.
pub fn request_id(input: &str) -> Value {
    serde_json::from_str::<Value>(input)
        .map(|req| get_id(&req))
        .unwrap_or(Value::Null)
}

pub fn internal_error(id: Value) -> String {
    err(id, "internal core error")
}

pub fn event_line(event: &CoreEvent) -> String {
    json!({
        "id": Value::Null,
        "status": "event",
        "payload": event
    })
    .to_string()
}

fn credential_from(payload: &Value) -> Credential {
    Credential::new(get_str(payload, "api_key"))
}

fn batch_count_from(payload: &Value) -> BatchCount {
    match payload.get("batch_count") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(BatchCount::normalize)
            .unwrap_or_default(),
        Some(Value::String(s)) => BatchCount::from_input(s),
        _ => BatchCount::default(),
    }
}

/// Host-facing side of the core: one JSON request per line in, one JSON
/// response per request out.
pub struct Bridge {
    session: Session,
    items_per_batch: u32,
}

impl Bridge {
    pub async fn start(config: &CoreConfig, sink: Arc<dyn EventSink>) -> Result<Self, CoreError> {
        let store: Arc<dyn VocabularyStore> = Arc::new(JsonFileStore::open(config.store_path.clone()).await?);
        let client = HttpGenerationClient::new(config.generation.clone(), store.clone())?;

        Ok(Self::new(
            Session::new(store, Arc::new(client), sink),
            config.generation.items_per_batch,
        ))
    }

    pub fn new(session: Session, items_per_batch: u32) -> Self {
        Self {
            session,
            items_per_batch,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn handle(&self, input: &str) -> String {
        let req: Value = match serde_json::from_str(input) {
            Ok(v) => v,
            Err(_) => {
                return json!({
                    "status": "error",
                    "message": "invalid json"
                })
                .to_string();
            }
        };

        let id = get_id(&req);
        let cmd = Command::from(get_cmd(&req));
        let payload = get_payload(&req);

        debug!("[bridge] {cmd:?}");

        match cmd {
            Command::Ping => ok(id, json!({ "message": "lexicon-core alive" })),

            Command::Readiness => {
                let credential = credential_from(payload);
                let readiness = match self.session.readiness(&credential).await {
                    Ok(r) => r,
                    Err(e) => return err(id, e.to_string()),
                };
                ok(
                    id,
                    json!({
                        "db_ready": readiness.db_ready,
                        "ai_ready": readiness.ai_ready,
                        "initializing": readiness.initializing,
                        "db_disabled_reason": readiness.db_disabled_reason(),
                        "ai_disabled_reason": readiness.ai_disabled_reason(),
                    }),
                )
            }

            Command::SetInitializing => {
                let Some(initializing) = payload.get("initializing").and_then(|v| v.as_bool()) else {
                    return err(id, "payload.initializing must be a boolean");
                };
                self.session.set_initializing(initializing);
                ok(id, json!({ "initializing": initializing }))
            }

            Command::VocabularyCount => match self.session.count().await {
                Ok(count) => ok(id, json!({ "count": count })),
                Err(e) => err(id, e.to_string()),
            },

            Command::VocabularyList => match self.session.list().await {
                Ok(entries) => ok(id, json!({ "entries": entries })),
                Err(e) => err(id, e.to_string()),
            },

            Command::VocabularyImport => {
                let Some(kind) = VocabKind::parse(get_str(payload, "kind")) else {
                    return err(id, "payload.kind must be \"word\" or \"idiom\"");
                };

                let path = get_str(payload, "path");
                let result = if !path.is_empty() {
                    self.session.import_file(&PathBuf::from(path), kind).await
                } else if let Some(text) = payload.get("text").and_then(|v| v.as_str()) {
                    self.session.import_text(text, kind).await
                } else {
                    return err(id, "payload.path or payload.text is required");
                };

                match result {
                    Ok(report) => ok(
                        id,
                        json!({
                            "kind": report.kind,
                            "added": report.added,
                            "total": report.total,
                            "duplicates": report.duplicates(),
                            "summary": report.summary(),
                        }),
                    ),
                    Err(e) => err(id, format!("Failed to import {kind} JSON: {e}")),
                }
            }

            Command::CollectStart => {
                let filter: GenerationFilter = if payload.is_null() {
                    GenerationFilter::default()
                } else {
                    match serde_json::from_value(payload.clone()) {
                        Ok(f) => f,
                        Err(e) => return err(id, format!("invalid generation filter: {e}")),
                    }
                };
                let batch_count = batch_count_from(payload);
                let credential = credential_from(payload);

                match self.session.collect(&filter, batch_count, &credential).await {
                    Ok(run) if run.failed() => json!({
                        "id": id,
                        "status": "error",
                        "message": run.status_message,
                        "payload": { "run": run }
                    })
                    .to_string(),
                    Ok(run) => ok(id, json!({ "run": run })),
                    Err(e) => err(id, e.to_string()),
                }
            }

            Command::CollectStatus => ok(id, json!({ "run": self.session.collection_snapshot() })),

            Command::CollectItemsRequested => ok(
                id,
                json!({ "items": items_requested(batch_count_from(payload), self.items_per_batch) }),
            ),

            Command::Unknown => err(id, "unknown command"),
        }
    }
}
