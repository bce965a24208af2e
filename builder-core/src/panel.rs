//! Design panel: editable controls mirroring the selected element.
//!
//! Controls are refreshed from the store whenever the selection changes.
//! Edits come in two tiers: live previews write straight to the store with no
//! history entry, and a commit turns the edit into one undoable command whose
//! before-value is what the property held before the first preview.

use std::collections::{BTreeMap, HashMap};

use crate::{BuilderResult, Command, Element, ElementId, ElementStore, PropertyValue};

/// Property keys the panel exposes as controls, where the element has them.
pub const PANEL_KEYS: &[&str] = &[
    "fontColor",
    "textColor",
    "backgroundColor",
    "color",
    "fontSize",
    "fontWeight",
    "fontFamily",
    "textAlign",
];

/// Controls for the currently selected element.
#[derive(Debug, Clone, Default)]
pub struct DesignPanel {
    /// Element the controls describe.
    target: Option<ElementId>,
    /// Control values keyed by property key.
    controls: BTreeMap<String, PropertyValue>,
    /// Value each previewed property held before its first uncommitted preview.
    originals: HashMap<(ElementId, String), PropertyValue>,
}

impl DesignPanel {
    /// Create an empty panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Element the panel currently reflects.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    /// All control values.
    #[must_use]
    pub fn controls(&self) -> &BTreeMap<String, PropertyValue> {
        &self.controls
    }

    /// Value of a single control.
    #[must_use]
    pub fn control(&self, key: &str) -> Option<&PropertyValue> {
        self.controls.get(key)
    }

    /// Load control values from `element` (store to controls only).
    ///
    /// Moving to a different target abandons every uncommitted preview.
    pub fn reflect(&mut self, element: Option<&Element>) {
        let target = element.map(|e| e.id);
        if target != self.target {
            self.discard_previews();
        }
        self.controls.clear();
        self.target = target;
        let Some(element) = element else {
            return;
        };
        for key in PANEL_KEYS {
            if let Some(value) = element.properties.get(key) {
                self.controls.insert((*key).to_string(), value);
            }
        }
    }

    /// Apply a live edit straight to the store without recording history.
    ///
    /// Returns `Ok(false)` if the element does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not in the element's schema or the value
    /// has the wrong shape.
    pub fn preview(
        &mut self,
        store: &mut ElementStore,
        id: ElementId,
        key: &str,
        value: PropertyValue,
    ) -> BuilderResult<bool> {
        let Some(current) = store.get(id).and_then(|e| e.properties.get(key)) else {
            // Let the store produce the precise error for a bad key.
            return store
                .update_property(id, key, value)
                .map(|updated| updated.is_some());
        };
        if store.update_property(id, key, value.clone())?.is_none() {
            return Ok(false);
        }
        self.originals.entry((id, key.to_string())).or_insert(current);
        if self.target == Some(id) && self.controls.contains_key(key) {
            self.controls.insert(key.to_string(), value);
        }
        Ok(true)
    }

    /// Turn a committed edit into an update-property command.
    ///
    /// The command's before-value is the value from before any pending
    /// preview of the same property. Returns `Ok(None)` if the element does
    /// not exist. The command is not executed.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not in the element's schema or the value
    /// has the wrong shape.
    pub fn commit(
        &mut self,
        store: &ElementStore,
        id: ElementId,
        key: &str,
        value: PropertyValue,
    ) -> BuilderResult<Option<Command>> {
        let Some(element) = store.get(id) else {
            return Ok(None);
        };
        let mut scratch = element.properties.clone();
        let current = scratch.set(key, value.clone())?;
        let before = self
            .originals
            .remove(&(id, key.to_string()))
            .unwrap_or(current);
        Ok(Some(Command::UpdateProperty {
            id,
            key: key.to_string(),
            before,
            after: value,
        }))
    }

    /// Whether `key` on `id` has a preview that has not been committed.
    #[must_use]
    pub fn has_pending_preview(&self, id: ElementId, key: &str) -> bool {
        self.originals.contains_key(&(id, key.to_string()))
    }

    /// Forget pending previews; their live values stay in the store and count
    /// as the current value for the next commit.
    pub fn discard_previews(&mut self) {
        if !self.originals.is_empty() {
            tracing::debug!("Discarding {} uncommitted previews", self.originals.len());
            self.originals.clear();
        }
    }

    /// Forget targets, controls and pending previews.
    pub fn reset(&mut self) {
        self.target = None;
        self.controls.clear();
        self.originals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementType, Position};

    #[test]
    fn test_reflect_only_panel_keys_present() {
        let mut store = ElementStore::new();
        let id = store.create(ElementType::Button, Position::default()).id;
        let mut panel = DesignPanel::new();
        panel.reflect(store.get(id));

        assert_eq!(panel.target(), Some(id));
        assert_eq!(panel.control("backgroundColor"), Some(&"#6605c7".into()));
        assert_eq!(panel.control("fontSize"), Some(&PropertyValue::Number(14.0)));
        assert!(panel.control("fontFamily").is_none());

        panel.reflect(None);
        assert!(panel.controls().is_empty());
    }

    #[test]
    fn test_preview_then_commit_uses_original() {
        let mut store = ElementStore::new();
        let id = store.create(ElementType::Text, Position::default()).id;
        let mut panel = DesignPanel::new();
        panel.reflect(store.get(id));

        assert!(panel.preview(&mut store, id, "fontColor", "#111111".into()).expect("valid"));
        assert!(panel.preview(&mut store, id, "fontColor", "#222222".into()).expect("valid"));
        assert_eq!(panel.control("fontColor"), Some(&"#222222".into()));

        let cmd = panel
            .commit(&store, id, "fontColor", "#333333".into())
            .expect("valid")
            .expect("exists");
        match cmd {
            Command::UpdateProperty { before, after, .. } => {
                assert_eq!(before, "#000000".into());
                assert_eq!(after, "#333333".into());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!panel.has_pending_preview(id, "fontColor"));
    }

    #[test]
    fn test_abandoned_preview_is_dropped_on_reselect() {
        let mut store = ElementStore::new();
        let first = store.create(ElementType::Text, Position::default()).id;
        let second = store.create(ElementType::Text, Position::default()).id;
        let mut panel = DesignPanel::new();
        panel.reflect(store.get(first));

        panel.preview(&mut store, first, "fontColor", "#111111".into()).expect("valid");
        panel.reflect(store.get(second));
        assert!(!panel.has_pending_preview(first, "fontColor"));

        panel.reflect(store.get(first));
        let cmd = panel
            .commit(&store, first, "fontColor", "#333333".into())
            .expect("valid")
            .expect("exists");
        match cmd {
            Command::UpdateProperty { before, .. } => assert_eq!(before, "#111111".into()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_reflecting_same_target_keeps_previews() {
        let mut store = ElementStore::new();
        let id = store.create(ElementType::Text, Position::default()).id;
        let mut panel = DesignPanel::new();
        panel.reflect(store.get(id));

        panel.preview(&mut store, id, "fontSize", 30.0.into()).expect("valid");
        panel.reflect(store.get(id));
        assert!(panel.has_pending_preview(id, "fontSize"));
        assert_eq!(panel.control("fontSize"), Some(&PropertyValue::Number(30.0)));
    }

    #[test]
    fn test_commit_rejects_bad_value() {
        let mut store = ElementStore::new();
        let id = store.create(ElementType::Text, Position::default()).id;
        let mut panel = DesignPanel::new();

        assert!(panel.commit(&store, id, "fontSize", "huge".into()).is_err());
        assert!(panel.commit(&store, id, "level", "h1".into()).is_err());
        assert!(panel
            .commit(&store, ElementId::new(), "fontSize", 3.0.into())
            .expect("missing is not an error")
            .is_none());
    }
}
