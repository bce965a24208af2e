//! Element store - the single source of truth for a document's elements.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    BuilderResult, Dimension, Element, ElementId, ElementType, Position, PropertyValue, Size,
};

/// Offset applied to a duplicated element so the copy is visible.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// How [`ElementStore::align`] lines up a set of elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left edges to the leftmost edge.
    Left,
    /// Left edges to the mean left edge.
    Center,
    /// Right edges to the rightmost right edge.
    Right,
    /// Top edges to the topmost edge.
    Top,
    /// Top edges to the mean top edge.
    Middle,
    /// Bottom edges to the lowest bottom edge.
    Bottom,
}

/// Round a coordinate to the nearest multiple of `grid`.
#[must_use]
pub fn snap_to_grid(value: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

/// In-memory collection of elements plus the current selection.
///
/// Elements are indexed by ID and also kept in insertion order; insertion
/// order breaks ties when sorting by z-index.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    /// All elements, indexed by ID.
    elements: HashMap<ElementId, Element>,
    /// Element IDs in insertion order.
    order: Vec<ElementId>,
    /// Currently selected element, if any.
    selected: Option<ElementId>,
}

impl ElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Check whether an element exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Highest z-index in the store, or 0 when empty.
    #[must_use]
    pub fn max_z_index(&self) -> i32 {
        self.elements.values().map(|e| e.z_index).max().unwrap_or(0)
    }

    /// Lowest z-index in the store, or 0 when empty.
    #[must_use]
    pub fn min_z_index(&self) -> i32 {
        self.elements.values().map(|e| e.z_index).min().unwrap_or(0)
    }

    fn next_z_index(&self) -> i32 {
        if self.is_empty() {
            0
        } else {
            self.max_z_index() + 1
        }
    }

    /// Build a new element of `element_type` without inserting it.
    ///
    /// The element gets a fresh ID, the type's default properties and size,
    /// and a z-index one above the current maximum (0 in an empty store).
    #[must_use]
    pub fn prepare(&self, element_type: ElementType, position: Position) -> Element {
        Element::new(element_type, position, self.next_z_index())
    }

    /// Create an element of `element_type` at `position` and append it.
    pub fn create(&mut self, element_type: ElementType, position: Position) -> &Element {
        let element = self.prepare(element_type, position);
        let id = element.id;
        self.insert(element);
        tracing::debug!("Created {element_type} element {id}");
        &self.elements[&id]
    }

    /// Append an element. Returns `false` if its ID is already present.
    pub fn insert(&mut self, element: Element) -> bool {
        let index = self.order.len();
        self.insert_at(index, element)
    }

    /// Insert an element at a position in insertion order.
    ///
    /// `index` is clamped to the current length. Returns `false` if the ID is
    /// already present.
    pub fn insert_at(&mut self, index: usize, element: Element) -> bool {
        if self.elements.contains_key(&element.id) {
            return false;
        }
        let index = index.min(self.order.len());
        self.order.insert(index, element.id);
        self.elements.insert(element.id, element);
        true
    }

    /// Remove an element, returning its insertion index and value.
    ///
    /// Clears the selection if the removed element was selected.
    pub fn remove(&mut self, id: ElementId) -> Option<(usize, Element)> {
        let element = self.elements.remove(&id)?;
        let index = self.order.iter().position(|&eid| eid == id).unwrap_or(0);
        self.order.retain(|&eid| eid != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some((index, element))
    }

    /// Delete an element. Returns `None` if it does not exist.
    pub fn delete(&mut self, id: ElementId) -> Option<Element> {
        let (_, element) = self.remove(id)?;
        tracing::debug!("Deleted element {id}");
        Some(element)
    }

    /// Move an element, clamping negative coordinates to zero.
    pub fn update_position(&mut self, id: ElementId, top: f64, left: f64) -> Option<&Element> {
        let element = self.elements.get_mut(&id)?;
        element.position = Position::new(top, left);
        Some(element)
    }

    /// Resize an element, enforcing the minimum width and height.
    pub fn update_size(
        &mut self,
        id: ElementId,
        width: Dimension,
        height: Dimension,
    ) -> Option<&Element> {
        let element = self.elements.get_mut(&id)?;
        element.size = Size::clamped(width, height);
        Some(element)
    }

    /// Set a single property.
    ///
    /// Returns `Ok(None)` if the element does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not in the element's schema or the value
    /// has the wrong shape.
    pub fn update_property(
        &mut self,
        id: ElementId,
        key: &str,
        value: PropertyValue,
    ) -> BuilderResult<Option<&Element>> {
        let Some(element) = self.elements.get_mut(&id) else {
            return Ok(None);
        };
        element.properties.set(key, value)?;
        Ok(Some(element))
    }

    /// Set several properties at once.
    ///
    /// All values are validated before any is applied, so a bad entry leaves
    /// the element untouched. Returns `Ok(None)` if the element does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any key is not in the element's schema or any value
    /// has the wrong shape.
    pub fn update_properties<I>(&mut self, id: ElementId, values: I) -> BuilderResult<Option<&Element>>
    where
        I: IntoIterator<Item = (String, PropertyValue)>,
    {
        let Some(element) = self.elements.get_mut(&id) else {
            return Ok(None);
        };
        let mut properties = element.properties.clone();
        for (key, value) in values {
            properties.set(&key, value)?;
        }
        element.properties = properties;
        Ok(Some(element))
    }

    /// Build a copy of an element without inserting it.
    ///
    /// The copy gets a fresh ID, a z-index above every existing element and a
    /// position offset by [`DUPLICATE_OFFSET`] on both axes.
    #[must_use]
    pub fn prepare_duplicate(&self, id: ElementId) -> Option<Element> {
        let original = self.elements.get(&id)?;
        let mut copy = original.clone();
        copy.id = ElementId::new();
        copy.z_index = self.max_z_index() + 1;
        copy.position = original.position.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        Some(copy)
    }

    /// Duplicate an element and append the copy.
    pub fn duplicate(&mut self, id: ElementId) -> Option<&Element> {
        let copy = self.prepare_duplicate(id)?;
        let copy_id = copy.id;
        self.insert(copy);
        self.elements.get(&copy_id)
    }

    /// Raise an element above every other element.
    pub fn bring_to_front(&mut self, id: ElementId) -> Option<&Element> {
        if !self.contains(id) {
            return None;
        }
        let z = self.max_z_index() + 1;
        let element = self.elements.get_mut(&id)?;
        element.z_index = z;
        Some(element)
    }

    /// Lower an element below every other element.
    ///
    /// Other elements already below zero are nudged up by one so the back of
    /// the stack stays compact.
    pub fn send_to_back(&mut self, id: ElementId) -> Option<&Element> {
        if !self.contains(id) {
            return None;
        }
        let z = self.min_z_index() - 1;
        for element in self.elements.values_mut() {
            if element.id == id {
                element.z_index = z;
            } else if element.z_index < 0 {
                element.z_index += 1;
            }
        }
        self.elements.get(&id)
    }

    /// Snapshot every element's z-index, in insertion order.
    #[must_use]
    pub fn z_order(&self) -> Vec<(ElementId, i32)> {
        self.elements().map(|e| (e.id, e.z_index)).collect()
    }

    /// Restore z-indices captured by [`ElementStore::z_order`].
    ///
    /// Entries for elements that no longer exist are skipped.
    pub fn restore_z_order(&mut self, entries: &[(ElementId, i32)]) {
        for (id, z) in entries {
            if let Some(element) = self.elements.get_mut(id) {
                element.z_index = *z;
            }
        }
    }

    /// Align a set of elements. Missing IDs are ignored.
    ///
    /// Returns the IDs that were aligned.
    pub fn align(&mut self, ids: &[ElementId], alignment: Alignment) -> Vec<ElementId> {
        let targets: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|id| self.elements.contains_key(id))
            .collect();
        if targets.is_empty() {
            return targets;
        }

        let members: Vec<&Element> = targets.iter().map(|id| &self.elements[id]).collect();
        let width = |e: &Element| e.size.width.px().unwrap_or(0.0);
        let height = |e: &Element| e.size.height.px().unwrap_or(0.0);
        #[allow(clippy::cast_precision_loss)]
        let count = members.len() as f64;

        let anchor = match alignment {
            Alignment::Left => members.iter().map(|e| e.position.left).fold(f64::INFINITY, f64::min),
            Alignment::Center => members.iter().map(|e| e.position.left).sum::<f64>() / count,
            Alignment::Right => members
                .iter()
                .map(|e| e.position.left + width(e))
                .fold(f64::NEG_INFINITY, f64::max),
            Alignment::Top => members.iter().map(|e| e.position.top).fold(f64::INFINITY, f64::min),
            Alignment::Middle => members.iter().map(|e| e.position.top).sum::<f64>() / count,
            Alignment::Bottom => members
                .iter()
                .map(|e| e.position.top + height(e))
                .fold(f64::NEG_INFINITY, f64::max),
        };

        for id in &targets {
            let Some(element) = self.elements.get_mut(id) else {
                continue;
            };
            let Position { top, left } = element.position;
            element.position = match alignment {
                Alignment::Left | Alignment::Center => Position::new(top, anchor),
                Alignment::Right => Position::new(top, anchor - width(element)),
                Alignment::Top | Alignment::Middle => Position::new(anchor, left),
                Alignment::Bottom => Position::new(anchor - height(element), left),
            };
        }
        targets
    }

    /// Select an element. Returns `None` (and leaves the selection unchanged)
    /// if the element does not exist.
    pub fn select(&mut self, id: ElementId) -> Option<&Element> {
        let element = self.elements.get(&id)?;
        self.selected = Some(id);
        Some(element)
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// ID of the selected element.
    #[must_use]
    pub fn selected_id(&self) -> Option<ElementId> {
        self.selected
    }

    /// The selected element.
    #[must_use]
    pub fn selected(&self) -> Option<&Element> {
        self.selected.and_then(|id| self.elements.get(&id))
    }

    /// Elements sorted ascending by z-index; ties keep insertion order.
    #[must_use]
    pub fn sorted_by_z_index(&self) -> Vec<&Element> {
        let mut sorted: Vec<&Element> = self.elements().collect();
        sorted.sort_by_key(|e| e.z_index);
        sorted
    }

    /// Remove every element and clear the selection.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
        self.selected = None;
    }

    /// Replace the store's contents with copies of `elements`.
    ///
    /// Clears the selection. Later entries with a duplicate ID are dropped.
    pub fn load<'a, I>(&mut self, elements: I)
    where
        I: IntoIterator<Item = &'a Element>,
    {
        self.clear();
        for element in elements {
            if !self.insert(element.clone()) {
                tracing::warn!("Skipping duplicate element id {} on load", element.id);
            }
        }
    }

    /// Deep copies of all elements in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Element> {
        self.elements().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(top: f64, left: f64) -> Position {
        Position::new(top, left)
    }

    #[test]
    fn test_create_assigns_increasing_z() {
        let mut store = ElementStore::new();
        let first = store.create(ElementType::Text, pos(0.0, 0.0)).id;
        let second = store.create(ElementType::Text, pos(0.0, 0.0)).id;

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(first).map(|e| e.z_index), Some(0));
        assert_eq!(store.get(second).map(|e| e.z_index), Some(1));
    }

    #[test]
    fn test_send_to_back_orders_first() {
        let mut store = ElementStore::new();
        let first = store.create(ElementType::Text, pos(0.0, 0.0)).id;
        let second = store.create(ElementType::Text, pos(0.0, 0.0)).id;

        let z = store.send_to_back(second).map(|e| e.z_index);
        assert!(z.is_some_and(|z| z < 0));

        let ids: Vec<_> = store.sorted_by_z_index().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_send_to_back_nudges_negative_elements() {
        let mut store = ElementStore::new();
        let a = store.create(ElementType::Text, pos(0.0, 0.0)).id;
        let b = store.create(ElementType::Text, pos(0.0, 0.0)).id;
        let c = store.create(ElementType::Text, pos(0.0, 0.0)).id;

        store.send_to_back(b); // b: -1
        store.send_to_back(c); // c: -2, b: 0

        assert_eq!(store.get(c).map(|e| e.z_index), Some(-2));
        assert_eq!(store.get(b).map(|e| e.z_index), Some(0));
        let ids: Vec<_> = store.sorted_by_z_index().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c, a, b]);
    }

    #[test]
    fn test_back_then_front_is_last() {
        let mut store = ElementStore::new();
        let ids: Vec<_> = (0..4)
            .map(|_| store.create(ElementType::Heading, pos(0.0, 0.0)).id)
            .collect();

        store.send_to_back(ids[1]);
        store.bring_to_front(ids[1]);

        let sorted: Vec<_> = store.sorted_by_z_index().iter().map(|e| e.id).collect();
        assert_eq!(sorted.last(), Some(&ids[1]));
        assert_eq!(&sorted[..3], &[ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut store = ElementStore::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let mut element = store.prepare(ElementType::Divider, pos(0.0, 0.0));
            element.z_index = 7;
            ids.push(element.id);
            store.insert(element);
        }
        let sorted: Vec<_> = store.sorted_by_z_index().iter().map(|e| e.id).collect();
        assert_eq!(sorted, ids);
    }

    #[test]
    fn test_duplicate_offsets_and_raises() {
        let mut store = ElementStore::new();
        let source = store.create(ElementType::Button, pos(50.0, 50.0)).id;
        let copy = store.duplicate(source).cloned().expect("source exists");

        assert_ne!(copy.id, source);
        assert_eq!(copy.position, pos(70.0, 70.0));
        assert!(copy.z_index > 0);
        assert_eq!(copy.properties, store.get(source).map(|e| e.properties.clone()).expect("source"));
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let mut store = ElementStore::new();
        let ghost = ElementId::new();
        assert!(store.delete(ghost).is_none());
        assert!(store.update_position(ghost, 1.0, 1.0).is_none());
        assert!(store.duplicate(ghost).is_none());
        assert!(store.bring_to_front(ghost).is_none());
        assert!(store.send_to_back(ghost).is_none());
        assert!(matches!(store.update_property(ghost, "content", "x".into()), Ok(None)));
        assert!(store.select(ghost).is_none());
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut store = ElementStore::new();
        let id = store.create(ElementType::Image, pos(0.0, 0.0)).id;
        store.select(id);
        assert_eq!(store.selected_id(), Some(id));

        store.delete(id);
        assert!(store.selected().is_none());
    }

    #[test]
    fn test_clamping() {
        let mut store = ElementStore::new();
        let id = store.create(ElementType::Image, pos(0.0, 0.0)).id;

        let moved = store.update_position(id, -5.0, 12.0).map(|e| e.position);
        assert_eq!(moved, Some(pos(0.0, 12.0)));

        let size = store
            .update_size(id, Dimension::Px(10.0), Dimension::Px(5.0))
            .map(|e| e.size);
        assert_eq!(
            size,
            Some(Size {
                width: Dimension::Px(50.0),
                height: Dimension::Px(20.0)
            })
        );
    }

    #[test]
    fn test_update_properties_is_atomic() {
        let mut store = ElementStore::new();
        let id = store.create(ElementType::Text, pos(0.0, 0.0)).id;
        let result = store.update_properties(
            id,
            vec![
                ("fontColor".to_string(), "#123456".into()),
                ("level".to_string(), "h3".into()),
            ],
        );
        assert!(result.is_err());
        assert_eq!(
            store.get(id).and_then(|e| e.properties.get("fontColor")),
            Some("#000000".into())
        );
    }

    #[test]
    fn test_load_deep_copies() {
        let mut source = ElementStore::new();
        source.create(ElementType::Text, pos(10.0, 10.0));
        let snapshot = source.to_vec();

        let mut store = ElementStore::new();
        store.load(&snapshot);
        let id = snapshot[0].id;
        store
            .update_property(id, "content", "changed".into())
            .expect("valid key");

        assert_eq!(snapshot[0].properties.get("content"), Some("Click to edit text".into()));
        assert!(store.selected().is_none());
    }

    #[test]
    fn test_align_left_and_bottom() {
        let mut store = ElementStore::new();
        let a = store.create(ElementType::Image, pos(10.0, 40.0)).id; // 400x300
        let b = store.create(ElementType::Button, pos(100.0, 25.0)).id; // 150x40

        store.align(&[a, b], Alignment::Left);
        assert_eq!(store.get(a).map(|e| e.position.left), Some(25.0));
        assert_eq!(store.get(b).map(|e| e.position.left), Some(25.0));

        store.align(&[a, b], Alignment::Bottom);
        // a bottom = 310, b bottom = 140 -> both bottoms at 310
        assert_eq!(store.get(a).map(|e| e.position.top), Some(10.0));
        assert_eq!(store.get(b).map(|e| e.position.top), Some(270.0));
    }

    #[test]
    fn test_snap_to_grid() {
        assert!((snap_to_grid(27.0, 10.0) - 30.0).abs() < f64::EPSILON);
        assert!((snap_to_grid(24.0, 10.0) - 20.0).abs() < f64::EPSILON);
        assert!((snap_to_grid(24.0, 0.0) - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_and_insert_at_restores_order() {
        let mut store = ElementStore::new();
        let ids: Vec<_> = (0..3)
            .map(|_| store.create(ElementType::Text, pos(0.0, 0.0)).id)
            .collect();

        let (index, element) = store.remove(ids[1]).expect("exists");
        assert_eq!(index, 1);
        assert!(store.insert_at(index, element.clone()));
        assert!(!store.insert(element));

        let order: Vec<_> = store.elements().map(|e| e.id).collect();
        assert_eq!(order, ids);
    }
}
