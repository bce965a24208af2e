//! Subcommand implementations.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use builder_autosave::{AutosaveCoordinator, DocumentStore, FileDocumentStore, HttpDocumentStore};
use builder_core::{
    Action, DocumentMetadata, DocumentSnapshot, EditorEvent, EditorSession, ElementId,
    NotificationLevel,
};
use builder_renderer::ExportEngine;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{CliConfig, Command, ExportFormat, StoreTarget};

/// Run one subcommand.
///
/// # Errors
///
/// Returns an error if an input cannot be read or parsed, an action is
/// rejected, or the document store fails.
pub async fn run(config: &CliConfig, command: Command) -> Result<()> {
    match command {
        Command::Export {
            snapshot,
            format,
            output,
        } => {
            let snapshot = read_snapshot(&snapshot).await?;
            let rendered = export(&snapshot, format)?;
            write_output(output.as_deref(), &rendered).await
        }
        Command::Edit {
            snapshot,
            new,
            actions,
            output,
            autosave_id,
        } => {
            let start = match (snapshot, new) {
                (Some(path), _) => read_snapshot(&path).await?,
                (None, Some(title)) => DocumentSnapshot::empty(DocumentMetadata::titled(title)),
                (None, None) => bail!("either a snapshot or --new TITLE is required"),
            };
            let script = read_script(&actions).await?;

            let coordinator = match autosave_id {
                Some(id) => Some(AutosaveCoordinator::spawn(
                    open_store(config)?,
                    id,
                    config.autosave.clone(),
                )),
                None => None,
            };
            let edited = edit(&start, script, coordinator.as_ref());
            if let Some(coordinator) = coordinator {
                match coordinator.shutdown().await {
                    Ok(Some(receipt)) => info!("Autosaved {}", receipt.document_id),
                    Ok(None) => debug!("Nothing left to autosave"),
                    Err(e) => warn!("Final autosave failed: {e}"),
                }
            }

            let session = edited?;
            write_output(output.as_deref(), &session.snapshot().to_json()?).await
        }
        Command::Push {
            snapshot,
            document_id,
        } => {
            let snapshot = read_snapshot(&snapshot).await?;
            let store = open_store(config)?;
            let receipt = store
                .save(&document_id, &snapshot)
                .await
                .with_context(|| format!("pushing document {document_id}"))?;
            info!(
                "Pushed {} ({} elements) at {}",
                receipt.document_id,
                snapshot.elements.len(),
                receipt.saved_at
            );
            Ok(())
        }
        Command::Pull {
            document_id,
            output,
        } => {
            let store = open_store(config)?;
            let snapshot = store
                .load(&document_id)
                .await
                .with_context(|| format!("pulling document {document_id}"))?;
            write_output(output.as_deref(), &snapshot.to_json()?).await
        }
    }
}

/// Render a snapshot in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn export(snapshot: &DocumentSnapshot, format: ExportFormat) -> Result<String> {
    let engine = ExportEngine::with_defaults();
    let elements = &snapshot.elements;
    let rendered = match format {
        ExportFormat::Html => engine.export_to_html(elements),
        ExportFormat::Document => engine.generate_complete_document(elements, &snapshot.metadata),
        ExportFormat::Json => {
            engine.export_to_json_string(elements, &snapshot.metadata, Utc::now())?
        }
        ExportFormat::Summary => serde_json::to_string_pretty(&engine.summarize(elements))?,
    };
    Ok(rendered)
}

/// Replay an action script against a snapshot.
///
/// Each entry is an [`Action`] in its JSON form. An `id` (or entry of `ids`)
/// written as `"$N"` refers to the N-th element created during the replay,
/// counting from zero. Notifications are printed to stderr; content changes
/// mark the autosave coordinator dirty.
///
/// # Errors
///
/// Returns an error for a malformed action, a dangling `$N` reference or an
/// action the session rejects.
pub fn edit(
    snapshot: &DocumentSnapshot,
    script: Vec<Value>,
    autosave: Option<&AutosaveCoordinator>,
) -> Result<EditorSession> {
    let mut session = EditorSession::from_snapshot(snapshot);
    let mut seen: HashSet<ElementId> = session.store().elements().map(|e| e.id).collect();
    let mut created: Vec<ElementId> = Vec::new();

    for (step, mut raw) in script.into_iter().enumerate() {
        resolve_references(&mut raw, &created).with_context(|| format!("action {step}"))?;
        let action: Action = serde_json::from_value(raw)
            .with_context(|| format!("action {step} is not a valid action"))?;
        debug!("Replaying action {step}: {action:?}");

        let outcome = session.dispatch(action);
        let events = session.take_events();
        report(&events);
        outcome.with_context(|| format!("action {step} was rejected"))?;

        for element in session.store().elements() {
            if seen.insert(element.id) {
                created.push(element.id);
            }
        }
        if let Some(coordinator) = autosave {
            coordinator.track(&session, &events);
        }
    }

    info!(
        "Replayed script: {} elements, {} undo steps",
        session.store().len(),
        session.history_state().undo_len
    );
    Ok(session)
}

fn report(events: &[EditorEvent]) {
    for event in events {
        if let EditorEvent::Notification { level, message } = event {
            let label = match level {
                NotificationLevel::Info => "info",
                NotificationLevel::Success => "ok",
                NotificationLevel::Warning => "warning",
                NotificationLevel::Error => "error",
            };
            eprintln!("[{label}] {message}");
        }
    }
}

fn resolve_references(action: &mut Value, created: &[ElementId]) -> Result<()> {
    let Some(fields) = action.as_object_mut() else {
        return Ok(());
    };
    if let Some(id) = fields.get_mut("id") {
        resolve_reference(id, created)?;
    }
    if let Some(Value::Array(ids)) = fields.get_mut("ids") {
        for id in ids {
            resolve_reference(id, created)?;
        }
    }
    Ok(())
}

fn resolve_reference(value: &mut Value, created: &[ElementId]) -> Result<()> {
    let Some(reference) = value.as_str().and_then(|s| s.strip_prefix('$')) else {
        return Ok(());
    };
    let index: usize = reference
        .parse()
        .with_context(|| format!("invalid element reference ${reference}"))?;
    let id = created
        .get(index)
        .with_context(|| format!("${index} refers to an element that was never created"))?;
    *value = Value::String(id.to_string());
    Ok(())
}

/// Open the configured document store.
///
/// # Errors
///
/// Returns an error if the API URL is invalid.
pub fn open_store(config: &CliConfig) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreTarget::Http { url, token } => {
            let mut store = HttpDocumentStore::new(url)
                .with_context(|| format!("configuring document API at {url}"))?;
            if let Some(token) = token {
                store = store.with_token(token.clone());
            }
            debug!("Using document API at {url}");
            Arc::new(store)
        }
        StoreTarget::Directory(dir) => {
            debug!("Using document directory {}", dir.display());
            Arc::new(FileDocumentStore::new(dir.clone()))
        }
    };
    Ok(store)
}

/// Read a snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a snapshot.
pub async fn read_snapshot(path: &Path) -> Result<DocumentSnapshot> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    DocumentSnapshot::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

async fn read_script(path: &Path) -> Result<Vec<Value>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("{} must hold a JSON array of actions", path.display()))
}

async fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, contents)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_references() {
        let a = ElementId::new();
        let b = ElementId::new();
        let mut action = json!({ "action": "align", "ids": ["$1", "$0"], "alignment": "left" });
        resolve_references(&mut action, &[a, b]).expect("resolves");
        assert_eq!(action["ids"], json!([b.to_string(), a.to_string()]));
    }

    #[test]
    fn test_literal_ids_pass_through() {
        let id = ElementId::new().to_string();
        let mut action = json!({ "action": "delete", "id": id });
        resolve_references(&mut action, &[]).expect("resolves");
        assert_eq!(action["id"], json!(id));
    }

    #[test]
    fn test_dangling_reference() {
        let mut action = json!({ "action": "delete", "id": "$3" });
        assert!(resolve_references(&mut action, &[ElementId::new()]).is_err());
        let mut action = json!({ "action": "delete", "id": "$x" });
        assert!(resolve_references(&mut action, &[]).is_err());
    }
}
