//! Reversible editing commands.
//!
//! Each command captures the state it needs to undo itself at construction
//! time, then applies or reverts against an [`ElementStore`].

use serde::{Deserialize, Serialize};

use crate::{
    Alignment, Element, ElementId, ElementStore, Position, PropertyValue, Size,
};

/// Which way a layering command moves an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerDirection {
    /// Above every other element.
    Front,
    /// Below every other element.
    Back,
}

/// A reversible mutation of the element store.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert an element.
    Create {
        /// The element to insert.
        element: Element,
    },
    /// Remove an element.
    Delete {
        /// The element as it was before deletion.
        element: Element,
        /// Its insertion index, so revert puts it back in place.
        index: usize,
    },
    /// Change one property.
    UpdateProperty {
        /// Target element.
        id: ElementId,
        /// Property key.
        key: String,
        /// Value before the change.
        before: PropertyValue,
        /// Value after the change.
        after: PropertyValue,
    },
    /// Change an element's position.
    Move {
        /// Target element.
        id: ElementId,
        /// Position before the move.
        before: Position,
        /// Position after the move.
        after: Position,
    },
    /// Change an element's size.
    Resize {
        /// Target element.
        id: ElementId,
        /// Size before the resize.
        before: Size,
        /// Size after the resize.
        after: Size,
    },
    /// Bring an element to the front or send it to the back.
    Layer {
        /// Target element.
        id: ElementId,
        /// Direction of the move.
        direction: LayerDirection,
        /// Z-index of every element before the change.
        before: Vec<(ElementId, i32)>,
    },
    /// Align several elements.
    Align {
        /// Elements that were aligned.
        ids: Vec<ElementId>,
        /// The alignment applied.
        alignment: Alignment,
        /// Positions before the alignment.
        before: Vec<(ElementId, Position)>,
    },
    /// Several commands undone and redone as one step.
    Batch {
        /// Commands in application order.
        commands: Vec<Command>,
    },
}

impl Command {
    /// Command that inserts `element`.
    #[must_use]
    pub fn create(element: Element) -> Self {
        Self::Create { element }
    }

    /// Command that deletes `id`, or `None` if it does not exist.
    #[must_use]
    pub fn delete(store: &ElementStore, id: ElementId) -> Option<Self> {
        let element = store.get(id)?.clone();
        let index = store.elements().position(|e| e.id == id).unwrap_or(0);
        Some(Self::Delete { element, index })
    }

    /// Command that sets `key` to `after`, or `None` if the element or key
    /// does not exist.
    #[must_use]
    pub fn update_property(
        store: &ElementStore,
        id: ElementId,
        key: impl Into<String>,
        after: PropertyValue,
    ) -> Option<Self> {
        let key = key.into();
        let before = store.get(id)?.properties.get(&key)?;
        Some(Self::UpdateProperty {
            id,
            key,
            before,
            after,
        })
    }

    /// Command that moves `id` to `after`, or `None` if it does not exist.
    #[must_use]
    pub fn move_to(store: &ElementStore, id: ElementId, after: Position) -> Option<Self> {
        let before = store.get(id)?.position;
        Some(Self::Move {
            id,
            before,
            after: Position::new(after.top, after.left),
        })
    }

    /// Command that resizes `id` to `after`, or `None` if it does not exist.
    #[must_use]
    pub fn resize(store: &ElementStore, id: ElementId, after: Size) -> Option<Self> {
        let before = store.get(id)?.size;
        Some(Self::Resize {
            id,
            before,
            after: Size::clamped(after.width, after.height),
        })
    }

    /// Command that layers `id`, or `None` if it does not exist.
    #[must_use]
    pub fn layer(store: &ElementStore, id: ElementId, direction: LayerDirection) -> Option<Self> {
        if !store.contains(id) {
            return None;
        }
        Some(Self::Layer {
            id,
            direction,
            before: store.z_order(),
        })
    }

    /// Command that aligns `ids`, or `None` if none of them exist.
    #[must_use]
    pub fn align(store: &ElementStore, ids: &[ElementId], alignment: Alignment) -> Option<Self> {
        let before: Vec<(ElementId, Position)> = ids
            .iter()
            .filter_map(|&id| store.get(id).map(|e| (id, e.position)))
            .collect();
        if before.is_empty() {
            return None;
        }
        Some(Self::Align {
            ids: before.iter().map(|(id, _)| *id).collect(),
            alignment,
            before,
        })
    }

    /// Command that deletes every element, last-inserted first, so revert
    /// restores the original insertion order. `None` for an empty store.
    #[must_use]
    pub fn clear(store: &ElementStore) -> Option<Self> {
        let ids: Vec<ElementId> = store.elements().map(|e| e.id).collect();
        let commands: Vec<Self> = ids
            .iter()
            .rev()
            .enumerate()
            .filter_map(|(offset, &id)| {
                let element = store.get(id)?.clone();
                Some(Self::Delete {
                    element,
                    index: ids.len() - 1 - offset,
                })
            })
            .collect();
        if commands.is_empty() {
            return None;
        }
        Some(Self::Batch { commands })
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::UpdateProperty { .. } => "update_property",
            Self::Move { .. } => "move",
            Self::Resize { .. } => "resize",
            Self::Layer { .. } => "layer",
            Self::Align { .. } => "align",
            Self::Batch { .. } => "batch",
        }
    }

    /// Element the command is primarily about.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Self::Create { element } | Self::Delete { element, .. } => Some(element.id),
            Self::UpdateProperty { id, .. }
            | Self::Move { id, .. }
            | Self::Resize { id, .. }
            | Self::Layer { id, .. } => Some(*id),
            Self::Align { ids, .. } => ids.first().copied(),
            Self::Batch { commands } => commands.iter().find_map(Self::target),
        }
    }

    /// Apply the command. Returns `false` if its target no longer exists.
    pub fn apply(&self, store: &mut ElementStore) -> bool {
        match self {
            Self::Create { element } => store.insert(element.clone()),
            Self::Delete { element, .. } => store.remove(element.id).is_some(),
            Self::UpdateProperty { id, key, after, .. } => set_property(store, *id, key, after),
            Self::Move { id, after, .. } => store.update_position(*id, after.top, after.left).is_some(),
            Self::Resize { id, after, .. } => store.update_size(*id, after.width, after.height).is_some(),
            Self::Layer { id, direction, .. } => match direction {
                LayerDirection::Front => store.bring_to_front(*id).is_some(),
                LayerDirection::Back => store.send_to_back(*id).is_some(),
            },
            Self::Align { ids, alignment, .. } => !store.align(ids, *alignment).is_empty(),
            Self::Batch { commands } => commands
                .iter()
                .fold(false, |applied, command| command.apply(store) | applied),
        }
    }

    /// Revert the command. Returns `false` if its target no longer exists.
    pub fn revert(&self, store: &mut ElementStore) -> bool {
        match self {
            Self::Create { element } => store.remove(element.id).is_some(),
            Self::Delete { element, index } => store.insert_at(*index, element.clone()),
            Self::UpdateProperty { id, key, before, .. } => set_property(store, *id, key, before),
            Self::Move { id, before, .. } => store.update_position(*id, before.top, before.left).is_some(),
            Self::Resize { id, before, .. } => store.update_size(*id, before.width, before.height).is_some(),
            Self::Layer { id, before, .. } => {
                if !store.contains(*id) {
                    return false;
                }
                store.restore_z_order(before);
                true
            }
            Self::Align { before, .. } => {
                let mut restored = false;
                for (id, position) in before {
                    restored |= store.update_position(*id, position.top, position.left).is_some();
                }
                restored
            }
            Self::Batch { commands } => commands
                .iter()
                .rev()
                .fold(false, |reverted, command| command.revert(store) | reverted),
        }
    }
}

fn set_property(store: &mut ElementStore, id: ElementId, key: &str, value: &PropertyValue) -> bool {
    match store.update_property(id, key, value.clone()) {
        Ok(updated) => updated.is_some(),
        Err(e) => {
            tracing::warn!("Failed to replay property {key} on {id}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dimension, ElementType};

    fn store_with(element_type: ElementType) -> (ElementStore, ElementId) {
        let mut store = ElementStore::new();
        let id = store.create(element_type, Position::new(10.0, 10.0)).id;
        (store, id)
    }

    #[test]
    fn test_create_apply_revert() {
        let mut store = ElementStore::new();
        let element = store.prepare(ElementType::Text, Position::default());
        let id = element.id;
        let cmd = Command::create(element);

        assert!(cmd.apply(&mut store));
        assert!(store.contains(id));
        assert!(cmd.revert(&mut store));
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_revert_restores_index() {
        let mut store = ElementStore::new();
        let ids: Vec<_> = (0..3)
            .map(|_| store.create(ElementType::Text, Position::default()).id)
            .collect();

        let cmd = Command::delete(&store, ids[0]).expect("exists");
        assert!(cmd.apply(&mut store));
        assert!(cmd.revert(&mut store));

        let order: Vec<_> = store.elements().map(|e| e.id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_update_property_captures_before() {
        let (mut store, id) = store_with(ElementType::Text);
        let cmd = Command::update_property(&store, id, "fontColor", "#ff0000".into()).expect("valid");

        assert!(cmd.apply(&mut store));
        assert!(cmd.revert(&mut store));
        assert_eq!(
            store.get(id).and_then(|e| e.properties.get("fontColor")),
            Some("#000000".into())
        );
    }

    #[test]
    fn test_update_property_unknown_key() {
        let (store, id) = store_with(ElementType::Divider);
        assert!(Command::update_property(&store, id, "content", "x".into()).is_none());
    }

    #[test]
    fn test_resize_revert() {
        let (mut store, id) = store_with(ElementType::Image);
        let cmd = Command::resize(
            &store,
            id,
            Size {
                width: Dimension::Px(120.0),
                height: Dimension::Px(80.0),
            },
        )
        .expect("exists");

        cmd.apply(&mut store);
        assert_eq!(store.get(id).map(|e| e.size.width), Some(Dimension::Px(120.0)));
        cmd.revert(&mut store);
        assert_eq!(store.get(id).map(|e| e.size), Some(ElementType::Image.default_size()));
    }

    #[test]
    fn test_layer_revert_restores_all_z() {
        let mut store = ElementStore::new();
        let a = store.create(ElementType::Text, Position::default()).id;
        let b = store.create(ElementType::Text, Position::default()).id;
        store.send_to_back(a);
        let before = store.z_order();

        let cmd = Command::layer(&store, b, LayerDirection::Back).expect("exists");
        cmd.apply(&mut store);
        assert_ne!(store.z_order(), before);
        cmd.revert(&mut store);
        assert_eq!(store.z_order(), before);
    }

    #[test]
    fn test_phantom_target() {
        let (mut store, id) = store_with(ElementType::Button);
        let cmd = Command::move_to(&store, id, Position::new(100.0, 100.0)).expect("exists");
        store.delete(id);

        assert!(!cmd.apply(&mut store));
        assert!(!cmd.revert(&mut store));
    }

    #[test]
    fn test_clear_batch_restores_order() {
        let mut store = ElementStore::new();
        let ids: Vec<_> = (0..3)
            .map(|_| store.create(ElementType::Text, Position::default()).id)
            .collect();

        let cmd = Command::clear(&store).expect("not empty");
        assert!(cmd.apply(&mut store));
        assert!(store.is_empty());
        assert!(cmd.revert(&mut store));

        let order: Vec<_> = store.elements().map(|e| e.id).collect();
        assert_eq!(order, ids);
        assert!(Command::clear(&ElementStore::new()).is_none());
    }

    #[test]
    fn test_align_revert() {
        let mut store = ElementStore::new();
        let a = store.create(ElementType::Text, Position::new(0.0, 10.0)).id;
        let b = store.create(ElementType::Text, Position::new(40.0, 90.0)).id;

        let cmd = Command::align(&store, &[a, b, ElementId::new()], Alignment::Left).expect("some exist");
        assert!(cmd.apply(&mut store));
        assert_eq!(store.get(b).map(|e| e.position.left), Some(10.0));
        assert!(cmd.revert(&mut store));
        assert_eq!(store.get(b).map(|e| e.position), Some(Position::new(40.0, 90.0)));
    }
}
