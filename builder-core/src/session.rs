//! Editor session: one document's store, history and panel behind a single
//! action dispatcher.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    Alignment, BuilderResult, Command, DesignPanel, DocumentMetadata,
    DocumentSnapshot, EditorEvent, ElementId, ElementStore, ElementType, History, HistoryState,
    LayerDirection, Position, PropertyValue, Size,
};

/// A user intent. Every mutation of a session goes through one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Add a new element.
    Create {
        /// Element type name, e.g. `"text"`.
        #[serde(rename = "elementType")]
        element_type: String,
        /// Where to place it.
        #[serde(default)]
        position: Position,
    },
    /// Remove an element.
    Delete {
        /// Target element.
        id: ElementId,
    },
    /// Copy an element.
    Duplicate {
        /// Source element.
        id: ElementId,
    },
    /// Move an element.
    Move {
        /// Target element.
        id: ElementId,
        /// New position.
        position: Position,
    },
    /// Resize an element.
    Resize {
        /// Target element.
        id: ElementId,
        /// New size.
        size: Size,
    },
    /// Live property edit with no history entry.
    PreviewProperty {
        /// Target element.
        id: ElementId,
        /// Property key.
        key: String,
        /// New value.
        value: PropertyValue,
    },
    /// Committed property edit (one undo step).
    SetProperty {
        /// Target element.
        id: ElementId,
        /// Property key.
        key: String,
        /// New value.
        value: PropertyValue,
    },
    /// Several committed property edits as one undo step.
    SetProperties {
        /// Target element.
        id: ElementId,
        /// New values by key.
        values: BTreeMap<String, PropertyValue>,
    },
    /// Raise an element above all others.
    BringToFront {
        /// Target element.
        id: ElementId,
    },
    /// Lower an element below all others.
    SendToBack {
        /// Target element.
        id: ElementId,
    },
    /// Align several elements.
    Align {
        /// Elements to align.
        ids: Vec<ElementId>,
        /// How to align them.
        alignment: Alignment,
    },
    /// Select an element.
    Select {
        /// Element to select.
        id: ElementId,
    },
    /// Clear the selection.
    Deselect,
    /// Undo the last change.
    Undo,
    /// Redo the last undone change.
    Redo,
    /// Remove every element (undoable).
    Clear,
    /// Replace the document metadata.
    SetMetadata {
        /// New metadata.
        metadata: DocumentMetadata,
    },
}

/// An independent editing session for one document.
#[derive(Debug, Default)]
pub struct EditorSession {
    store: ElementStore,
    history: History,
    panel: DesignPanel,
    metadata: DocumentMetadata,
    events: Vec<EditorEvent>,
}

impl EditorSession {
    /// Create a session for an empty document.
    #[must_use]
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Create a session rehydrated from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        let mut session = Self::default();
        session.load(snapshot);
        session.events.clear();
        session
    }

    /// The element store (read-only; mutate through [`EditorSession::dispatch`]).
    #[must_use]
    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// The design panel.
    #[must_use]
    pub fn panel(&self) -> &DesignPanel {
        &self.panel
    }

    /// Document metadata.
    #[must_use]
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Undo/redo availability.
    #[must_use]
    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    /// Drain pending outbound events.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deep copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot::new(self.metadata.clone(), self.store.to_vec(), Utc::now())
    }

    /// Replace the document with `snapshot`, clearing history and selection.
    pub fn load(&mut self, snapshot: &DocumentSnapshot) {
        self.store.load(&snapshot.elements);
        self.metadata = snapshot.metadata.clone();
        self.history.clear();
        self.panel.reset();
        tracing::debug!("Loaded {} elements", self.store.len());
        self.events.push(EditorEvent::ElementsChanged);
        self.events.push(EditorEvent::SelectionChanged(None));
        self.events.push(EditorEvent::HistoryChanged(self.history.state()));
    }

    /// Apply a user action.
    ///
    /// Actions addressing missing elements are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown element type (an error notification is
    /// also queued) and for property edits with an unknown key or a value of
    /// the wrong shape.
    pub fn dispatch(&mut self, action: Action) -> BuilderResult<()> {
        match action {
            Action::Create {
                element_type,
                position,
            } => {
                self.create(&element_type, position)?;
            }
            Action::Delete { id } => {
                self.delete(id);
            }
            Action::Duplicate { id } => {
                self.duplicate(id);
            }
            Action::Move { id, position } => {
                self.move_to(id, position);
            }
            Action::Resize { id, size } => {
                self.resize(id, size);
            }
            Action::PreviewProperty { id, key, value } => {
                self.preview_property(id, &key, value)?;
            }
            Action::SetProperty { id, key, value } => {
                self.set_property(id, &key, value)?;
            }
            Action::SetProperties { id, values } => {
                self.set_properties(id, values)?;
            }
            Action::BringToFront { id } => {
                self.layer(id, LayerDirection::Front);
            }
            Action::SendToBack { id } => {
                self.layer(id, LayerDirection::Back);
            }
            Action::Align { ids, alignment } => {
                self.align(&ids, alignment);
            }
            Action::Select { id } => {
                self.select(Some(id));
            }
            Action::Deselect => {
                self.select(None);
            }
            Action::Undo => {
                self.undo();
            }
            Action::Redo => {
                self.redo();
            }
            Action::Clear => {
                self.clear();
            }
            Action::SetMetadata { metadata } => {
                self.metadata = metadata;
                self.events.push(EditorEvent::ElementsChanged);
            }
        }
        Ok(())
    }

    /// Create an element from a type name.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvalidType`] if the name is not a supported
    /// type; an error notification is queued as well.
    pub fn create(&mut self, element_type: &str, position: Position) -> BuilderResult<ElementId> {
        let element_type: ElementType = match element_type.parse() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Rejected element creation: {e}");
                self.events.push(EditorEvent::error(e.to_string()));
                return Err(e);
            }
        };
        let element = self.store.prepare(element_type, position);
        let id = element.id;
        self.run(Command::create(element));
        self.events
            .push(EditorEvent::success(format!("{element_type} element added")));
        Ok(id)
    }

    /// Delete an element. Returns `false` if it does not exist.
    pub fn delete(&mut self, id: ElementId) -> bool {
        let was_selected = self.store.selected_id() == Some(id);
        let Some(command) = Command::delete(&self.store, id) else {
            return false;
        };
        if !self.run(command) {
            return false;
        }
        if was_selected {
            self.selection_changed();
        }
        self.events.push(EditorEvent::success("Element deleted"));
        true
    }

    /// Duplicate an element, returning the copy's ID.
    pub fn duplicate(&mut self, id: ElementId) -> Option<ElementId> {
        let copy = self.store.prepare_duplicate(id)?;
        let copy_id = copy.id;
        if !self.run(Command::create(copy)) {
            return None;
        }
        self.events.push(EditorEvent::success("Element duplicated"));
        Some(copy_id)
    }

    /// Move an element as one undo step.
    pub fn move_to(&mut self, id: ElementId, position: Position) -> bool {
        Command::move_to(&self.store, id, position).is_some_and(|command| self.run(command))
    }

    /// Record a move that was already applied live (e.g. by a drag), using
    /// `before` as the undo target.
    pub fn commit_move(&mut self, id: ElementId, before: Position, after: Position) -> bool {
        if self.store.update_position(id, after.top, after.left).is_none() {
            return false;
        }
        let command = Command::Move {
            id,
            before,
            after: Position::new(after.top, after.left),
        };
        self.history.record(command);
        self.content_changed();
        true
    }

    /// Move an element without recording history.
    pub fn move_live(&mut self, id: ElementId, position: Position) -> bool {
        let moved = self
            .store
            .update_position(id, position.top, position.left)
            .is_some();
        if moved {
            self.events.push(EditorEvent::ElementsChanged);
        }
        moved
    }

    /// Resize an element as one undo step.
    pub fn resize(&mut self, id: ElementId, size: Size) -> bool {
        Command::resize(&self.store, id, size).is_some_and(|command| self.run(command))
    }

    /// Live property edit with no history entry.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown key or a value of the wrong shape.
    pub fn preview_property(
        &mut self,
        id: ElementId,
        key: &str,
        value: PropertyValue,
    ) -> BuilderResult<bool> {
        let previewed = self.panel.preview(&mut self.store, id, key, value)?;
        if previewed {
            self.events.push(EditorEvent::ElementsChanged);
        }
        Ok(previewed)
    }

    /// Committed property edit as one undo step.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown key or a value of the wrong shape.
    pub fn set_property(
        &mut self,
        id: ElementId,
        key: &str,
        value: PropertyValue,
    ) -> BuilderResult<bool> {
        match self.panel.commit(&self.store, id, key, value)? {
            Some(command) => Ok(self.run(command)),
            None => Ok(false),
        }
    }

    /// Several committed property edits as one undo step.
    ///
    /// Nothing is applied unless every entry is valid.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown key or a value of the wrong shape.
    pub fn set_properties(
        &mut self,
        id: ElementId,
        values: BTreeMap<String, PropertyValue>,
    ) -> BuilderResult<bool> {
        let Some(element) = self.store.get(id) else {
            return Ok(false);
        };
        let mut scratch = element.properties.clone();
        for (key, value) in &values {
            scratch.set(key, value.clone())?;
        }

        let mut commands = Vec::with_capacity(values.len());
        for (key, value) in values {
            if let Some(command) = self.panel.commit(&self.store, id, &key, value)? {
                commands.push(command);
            }
        }
        if commands.is_empty() {
            return Ok(false);
        }
        Ok(self.run(Command::Batch { commands }))
    }

    /// Bring to front or send to back as one undo step.
    pub fn layer(&mut self, id: ElementId, direction: LayerDirection) -> bool {
        let Some(command) = Command::layer(&self.store, id, direction) else {
            return false;
        };
        if !self.run(command) {
            return false;
        }
        let message = match direction {
            LayerDirection::Front => "Brought to front",
            LayerDirection::Back => "Sent to back",
        };
        self.events.push(EditorEvent::info(message));
        true
    }

    /// Align several elements as one undo step.
    pub fn align(&mut self, ids: &[ElementId], alignment: Alignment) -> bool {
        Command::align(&self.store, ids, alignment).is_some_and(|command| self.run(command))
    }

    /// Select an element, or clear the selection with `None`.
    ///
    /// Selecting a missing element leaves the selection unchanged.
    pub fn select(&mut self, id: Option<ElementId>) -> bool {
        let before = self.store.selected_id();
        match id {
            Some(id) => {
                if self.store.select(id).is_none() {
                    return false;
                }
            }
            None => self.store.deselect(),
        }
        if self.store.selected_id() != before {
            self.selection_changed();
        }
        true
    }

    /// Undo the last change.
    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.store);
        self.after_history_step(undone);
        undone
    }

    /// Redo the last undone change.
    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.store);
        self.after_history_step(redone);
        redone
    }

    /// Remove every element as one undo step.
    pub fn clear(&mut self) -> bool {
        let had_selection = self.store.selected_id().is_some();
        let cleared = Command::clear(&self.store).is_some_and(|command| self.run(command));
        if cleared && had_selection {
            self.selection_changed();
        }
        cleared
    }

    fn run(&mut self, command: Command) -> bool {
        if !self.history.execute(command, &mut self.store) {
            return false;
        }
        self.content_changed();
        true
    }

    fn after_history_step(&mut self, stepped: bool) {
        self.panel.discard_previews();
        let selection_lost = self.panel.target().is_some() && self.store.selected().is_none();
        if stepped {
            self.content_changed();
        } else {
            // A pruned command still changes what undo/redo offer.
            self.events
                .push(EditorEvent::HistoryChanged(self.history.state()));
        }
        if selection_lost {
            self.selection_changed();
        }
    }

    fn content_changed(&mut self) {
        if self.panel.target().is_some() {
            self.panel.reflect(self.store.selected());
        }
        self.events.push(EditorEvent::ElementsChanged);
        self.events
            .push(EditorEvent::HistoryChanged(self.history.state()));
    }

    fn selection_changed(&mut self) {
        self.panel.reflect(self.store.selected());
        self.events
            .push(EditorEvent::SelectionChanged(self.store.selected_id()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuilderError, NotificationLevel};

    #[test]
    fn test_invalid_type_notifies_and_errors() {
        let mut session = EditorSession::default();
        let result = session.dispatch(Action::Create {
            element_type: "carousel".to_string(),
            position: Position::default(),
        });

        assert!(matches!(result, Err(BuilderError::InvalidType(ref t)) if t == "carousel"));
        assert!(session.store().is_empty());
        let events = session.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            EditorEvent::Notification { level: NotificationLevel::Error, .. }
        )));
    }

    #[test]
    fn test_create_emits_events() {
        let mut session = EditorSession::default();
        session
            .create("text", Position::default())
            .expect("valid type");

        let events = session.take_events();
        assert!(events.contains(&EditorEvent::ElementsChanged));
        assert!(events.contains(&EditorEvent::success("text element added")));
        assert!(session.history_state().can_undo);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_select_reflects_panel() {
        let mut session = EditorSession::default();
        let id = session.create("heading", Position::default()).expect("valid");
        session.take_events();

        session.dispatch(Action::Select { id }).expect("select");
        assert_eq!(session.panel().target(), Some(id));
        assert_eq!(session.panel().control("fontFamily"), Some(&"serif".into()));
        assert_eq!(session.take_events(), vec![EditorEvent::SelectionChanged(Some(id))]);

        session.dispatch(Action::Deselect).expect("deselect");
        assert!(session.panel().target().is_none());
    }

    #[test]
    fn test_preview_does_not_touch_history() {
        let mut session = EditorSession::default();
        let id = session.create("text", Position::default()).expect("valid");
        let before = session.history_state();

        session
            .preview_property(id, "fontSize", 20.0.into())
            .expect("valid");
        assert_eq!(session.history_state(), before);

        session.set_property(id, "fontSize", 24.0.into()).expect("valid");
        assert_eq!(session.history_state().undo_len, before.undo_len + 1);

        session.undo();
        let size = session.store().get(id).and_then(|e| e.properties.get("fontSize"));
        assert_eq!(size, Some(PropertyValue::Number(16.0)));
    }

    #[test]
    fn test_undo_discards_uncommitted_preview() {
        let mut session = EditorSession::default();
        let id = session.create("text", Position::default()).expect("valid");
        session.create("image", Position::default()).expect("valid");
        session.select(Some(id));

        session
            .preview_property(id, "fontColor", "#111111".into())
            .expect("valid");
        assert!(session.undo());
        assert!(!session.panel().has_pending_preview(id, "fontColor"));

        session.set_property(id, "fontColor", "#333333".into()).expect("valid");
        session.undo();
        let color = session.store().get(id).and_then(|e| e.properties.get("fontColor"));
        assert_eq!(color, Some("#111111".into()));
    }

    #[test]
    fn test_set_properties_single_step() {
        let mut session = EditorSession::default();
        let id = session.create("button", Position::default()).expect("valid");
        let values = BTreeMap::from([
            ("text".to_string(), "Buy".into()),
            ("link".to_string(), "https://example.com".into()),
        ]);
        session.set_properties(id, values).expect("valid");
        assert_eq!(session.history_state().undo_len, 2);

        session.undo();
        let element = session.store().get(id).expect("exists");
        assert_eq!(element.properties.get("text"), Some("Click me".into()));
        assert_eq!(element.properties.get("link"), Some("".into()));
    }

    #[test]
    fn test_layering_is_undoable() {
        let mut session = EditorSession::default();
        let a = session.create("text", Position::default()).expect("valid");
        let b = session.create("text", Position::default()).expect("valid");

        session.dispatch(Action::SendToBack { id: b }).expect("layer");
        let order: Vec<_> = session.store().sorted_by_z_index().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![b, a]);

        session.undo();
        let order: Vec<_> = session.store().sorted_by_z_index().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_undo_create_of_selected_clears_selection() {
        let mut session = EditorSession::default();
        let id = session.create("image", Position::default()).expect("valid");
        session.select(Some(id));
        session.take_events();

        session.undo();
        assert!(session.store().selected().is_none());
        assert!(session
            .take_events()
            .contains(&EditorEvent::SelectionChanged(None)));
    }

    #[test]
    fn test_action_wire_format() {
        let json = r#"[
            {"action": "create", "elementType": "text", "position": {"top": 10, "left": 20}},
            {"action": "undo"},
            {"action": "set_metadata", "metadata": {"title": "Post"}}
        ]"#;
        let actions: Vec<Action> = serde_json::from_str(json).expect("parse");
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[1], Action::Undo);

        let mut session = EditorSession::default();
        for action in actions {
            session.dispatch(action).expect("dispatch");
        }
        assert!(session.store().is_empty());
        assert_eq!(session.metadata().title, "Post");
    }
}
