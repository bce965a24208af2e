//! Canvas projection and gesture routing.
//!
//! [`CanvasView::render`] rebuilds the whole visual tree from the session's
//! store on every call; the view itself holds nothing but an in-flight drag.
//! Gestures are turned into session calls so every committed change lands in
//! history exactly once.

use std::fmt::Write;

use base64::Engine as _;
use builder_core::{
    snap_to_grid, Dimension, EditorSession, Element, ElementId, ElementType, Position,
    Properties,
};
use serde::Serialize;

use crate::error::{RenderError, RenderResult};
use crate::export::{build_style, escape_html};

/// Default canvas width in pixels.
pub const CANVAS_WIDTH: f64 = 1200.0;

/// Minimum canvas height in pixels.
pub const CANVAS_MIN_HEIGHT: f64 = 600.0;

/// Default grid spacing in pixels.
pub const GRID_SPACING: f64 = 20.0;

/// Border of the selected element.
pub const SELECTED_BORDER: &str = "3px solid #6605c7";

/// Border of unselected elements.
pub const IDLE_BORDER: &str = "2px solid #ddd";

/// A dropped palette item is placed this far above the pointer.
pub const DROP_OFFSET_TOP: f64 = 30.0;

/// A dropped palette item is placed this far left of the pointer.
pub const DROP_OFFSET_LEFT: f64 = 60.0;

/// Height assumed for hit-testing elements with content-driven height.
const AUTO_HEIGHT: f64 = 40.0;

/// Space kept below the lowest element when sizing the canvas.
const BOTTOM_PADDING: f64 = 100.0;

/// Canvas configuration.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Canvas width in pixels.
    pub width: f64,
    /// Minimum canvas height in pixels.
    pub min_height: f64,
    /// Grid spacing in pixels.
    pub grid_spacing: f64,
    /// Grid line colour.
    pub grid_color: String,
    /// Round dropped positions to the grid.
    pub snap_to_grid: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            min_height: CANVAS_MIN_HEIGHT,
            grid_spacing: GRID_SPACING,
            grid_color: "#f0f0f0".to_string(),
            snap_to_grid: false,
        }
    }
}

/// Controls attached to every rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Affordance {
    /// Copy the element.
    Duplicate,
    /// Remove the element.
    Delete,
}

impl Affordance {
    /// Affordances in display order.
    pub const ALL: [Self; 2] = [Self::Duplicate, Self::Delete];

    /// Action name used in markup.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Delete => "delete",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::Duplicate => "Duplicate element",
            Self::Delete => "Delete element",
        }
    }
}

/// Visual projection of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    /// Element the node projects.
    pub id: ElementId,
    /// Element type.
    pub element_type: ElementType,
    /// Inline style (position, stacking, border).
    pub style: String,
    /// Escaped preview markup.
    pub body: String,
    /// Whether the element is selected.
    pub selected: bool,
    /// Controls shown on the node.
    pub affordances: Vec<Affordance>,
}

impl VisualNode {
    fn render_html(&self, out: &mut String) {
        let _ = write!(
            out,
            "<div class=\"canvas-element{}\" data-element-id=\"{}\" data-element-type=\"{}\" style=\"{}\">",
            if self.selected { " selected" } else { "" },
            self.id,
            self.element_type,
            self.style,
        );
        out.push_str(&self.body);
        out.push_str("<div class=\"element-controls\">");
        for affordance in &self.affordances {
            let _ = write!(
                out,
                "<button type=\"button\" data-action=\"{}\" title=\"{}\">{}</button>",
                affordance.as_str(),
                affordance.title(),
                affordance.as_str(),
            );
        }
        out.push_str("</div></div>");
    }
}

/// Decorative background grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridUnderlay {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
    /// Line spacing in pixels.
    pub spacing: f64,
    /// Line colour.
    pub color: String,
}

impl GridUnderlay {
    /// Render the grid as a standalone SVG document.
    ///
    /// One tiled `<pattern>` cell draws the lines, so the output size does not
    /// depend on the canvas dimensions.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let (w, h) = (self.width, self.height);
        let mut svg = String::with_capacity(512);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        );
        let s = self.spacing;
        if s.is_finite() && s > 0.0 {
            let _ = write!(
                svg,
                "<defs><pattern id=\"grid\" width=\"{s}\" height=\"{s}\" patternUnits=\"userSpaceOnUse\">\
                 <path d=\"M {s} 0 L 0 0 0 {s}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/>\
                 </pattern></defs><rect width=\"100%\" height=\"100%\" fill=\"url(#grid)\"/>",
                escape_html(&self.color)
            );
        }
        svg.push_str("</svg>");
        svg
    }

    /// The grid as a CSS `background-image` data URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.to_svg());
        format!("data:image/svg+xml;base64,{encoded}")
    }
}

/// Complete visual projection of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualTree {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Background grid.
    pub grid: GridUnderlay,
    /// Element nodes, back to front.
    pub nodes: Vec<VisualNode>,
}

impl VisualTree {
    /// Render the tree as an HTML canvas container.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(1024 + self.nodes.len() * 512);
        let _ = write!(
            html,
            "<div id=\"blog-canvas\" style=\"position:relative;width:{}px;min-height:{}px;background:white;background-image:url('{}');background-repeat:repeat\">",
            self.width,
            self.height,
            self.grid.to_data_uri(),
        );
        for node in &self.nodes {
            node.render_html(&mut html);
        }
        html.push_str("</div>");
        html
    }

    /// Node for an element, if rendered.
    #[must_use]
    pub fn node(&self, id: ElementId) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    id: ElementId,
    origin: Position,
}

/// Projects a session onto a canvas and routes gestures back into it.
#[derive(Debug, Clone, Default)]
pub struct CanvasView {
    config: CanvasConfig,
    drag: Option<DragState>,
}

impl CanvasView {
    /// Create a view with the given configuration.
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self { config, drag: None }
    }

    /// The view's configuration.
    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Rebuild the visual tree from the session's store.
    #[must_use]
    pub fn render(&self, session: &EditorSession) -> VisualTree {
        let store = session.store();
        let selected = store.selected_id();
        let elements = store.sorted_by_z_index();

        let height = elements
            .iter()
            .map(|e| e.position.top + self.footprint(e).1 + BOTTOM_PADDING)
            .fold(self.config.min_height, f64::max);

        let nodes = elements
            .into_iter()
            .map(|e| visual_node(e, selected == Some(e.id)))
            .collect();

        VisualTree {
            width: self.config.width,
            height,
            grid: GridUnderlay {
                width: self.config.width,
                height,
                spacing: self.config.grid_spacing,
                color: self.config.grid_color.clone(),
            },
            nodes,
        }
    }

    /// Topmost element under a canvas point.
    #[must_use]
    pub fn hit_test(&self, session: &EditorSession, top: f64, left: f64) -> Option<ElementId> {
        session
            .store()
            .sorted_by_z_index()
            .into_iter()
            .rev()
            .find(|e| {
                let (w, h) = self.footprint(e);
                left >= e.position.left
                    && left <= e.position.left + w
                    && top >= e.position.top
                    && top <= e.position.top + h
            })
            .map(|e| e.id)
    }

    /// Click at a canvas point: selects the element there, or clears the
    /// selection on empty canvas.
    pub fn click(&self, session: &mut EditorSession, top: f64, left: f64) -> Option<ElementId> {
        let hit = self.hit_test(session, top, left);
        session.select(hit);
        hit
    }

    /// Drop a palette item at a pointer position.
    ///
    /// # Errors
    ///
    /// Returns an error if `element_type` is not a supported type.
    pub fn drop_new(
        &self,
        session: &mut EditorSession,
        element_type: &str,
        pointer_y: f64,
        pointer_x: f64,
    ) -> RenderResult<ElementId> {
        let position = self.place(pointer_y - DROP_OFFSET_TOP, pointer_x - DROP_OFFSET_LEFT);
        Ok(session.create(element_type, position)?)
    }

    /// Invoke a node's affordance.
    pub fn invoke(&self, session: &mut EditorSession, id: ElementId, affordance: Affordance) -> bool {
        match affordance {
            Affordance::Duplicate => session.duplicate(id).is_some(),
            Affordance::Delete => session.delete(id),
        }
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start dragging an element: remember where it was and select it.
    ///
    /// Returns `false` if the element does not exist.
    pub fn begin_drag(&mut self, session: &mut EditorSession, id: ElementId) -> bool {
        let Some(origin) = session.store().get(id).map(|e| e.position) else {
            return false;
        };
        session.select(Some(id));
        self.drag = Some(DragState { id, origin });
        tracing::debug!("Drag started for {id}");
        true
    }

    /// Move the dragged element live, without touching history.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoDragInProgress`] if no drag was started.
    pub fn drag_to(&mut self, session: &mut EditorSession, top: f64, left: f64) -> RenderResult<()> {
        let drag = self.drag.ok_or(RenderError::NoDragInProgress)?;
        if !session.move_live(drag.id, Position::new(top, left)) {
            // Element vanished mid-drag.
            self.drag = None;
        }
        Ok(())
    }

    /// Finish a drag, committing a single move from the pre-drag position.
    ///
    /// Returns `false` if nothing moved or the element vanished.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoDragInProgress`] if no drag was started.
    pub fn drop(&mut self, session: &mut EditorSession, top: f64, left: f64) -> RenderResult<bool> {
        let drag = self.drag.take().ok_or(RenderError::NoDragInProgress)?;
        let target = self.place(top, left);
        if target == drag.origin {
            session.move_live(drag.id, drag.origin);
            return Ok(false);
        }
        Ok(session.commit_move(drag.id, drag.origin, target))
    }

    /// Abandon a drag and put the element back.
    pub fn cancel_drag(&mut self, session: &mut EditorSession) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        session.move_live(drag.id, drag.origin)
    }

    fn place(&self, top: f64, left: f64) -> Position {
        let position = Position::new(top, left);
        if self.config.snap_to_grid {
            Position::new(
                snap_to_grid(position.top, self.config.grid_spacing),
                snap_to_grid(position.left, self.config.grid_spacing),
            )
        } else {
            position
        }
    }

    fn footprint(&self, element: &Element) -> (f64, f64) {
        let width = match element.size.width {
            Dimension::Px(w) => w,
            Dimension::Full => self.config.width,
            Dimension::Auto => element.element_type().default_size().width.px().unwrap_or(0.0),
        };
        let height = element.size.height.px().unwrap_or(AUTO_HEIGHT);
        (width, height)
    }
}

fn visual_node(element: &Element, selected: bool) -> VisualNode {
    let border = if selected { SELECTED_BORDER } else { IDLE_BORDER };
    let style = build_style(&[
        ("position", "absolute".to_string()),
        ("top", format!("{}px", element.position.top)),
        ("left", format!("{}px", element.position.left)),
        ("width", element.size.width.to_css()),
        ("height", element.size.height.to_css()),
        ("z-index", element.z_index.to_string()),
        ("min-width", "50px".to_string()),
        ("min-height", "20px".to_string()),
        ("border", border.to_string()),
        ("border-radius", "4px".to_string()),
        ("background", "white".to_string()),
        ("padding", "8px".to_string()),
    ]);
    VisualNode {
        id: element.id,
        element_type: element.element_type(),
        style,
        body: preview_body(element),
        selected,
        affordances: Affordance::ALL.to_vec(),
    }
}

const PLACEHOLDER: &str = "background:#f0f0f0;width:100%;height:200px;display:flex;align-items:center;justify-content:center;color:#999";

fn preview_body(element: &Element) -> String {
    match &element.properties {
        Properties::Text(p) => typography(&p.content, p.font_size, &p.font_color, &p.font_weight, &p.font_family),
        Properties::Heading(p) => typography(&p.content, p.font_size, &p.font_color, &p.font_weight, &p.font_family),
        Properties::Image(p) if p.src.is_empty() => {
            format!("<div style=\"{PLACEHOLDER}\">Click to add image</div>")
        }
        Properties::Image(p) => format!(
            "<img src=\"{}\" alt=\"{}\" style=\"max-width:100%;height:auto;border-radius:4px\" />",
            escape_html(&p.src),
            escape_html(&p.alt)
        ),
        Properties::Video(_) => format!("<div style=\"{PLACEHOLDER};border-radius:4px\">Video</div>"),
        Properties::Button(p) => {
            let style = build_style(&[
                ("background", p.background_color.clone()),
                ("color", p.text_color.clone()),
                ("padding", p.padding.clone()),
                ("border-radius", format!("{}px", p.border_radius)),
                ("border", "none".to_string()),
                ("font-weight", p.font_weight.clone()),
                ("pointer-events", "none".to_string()),
            ]);
            format!("<button style=\"{style}\">{}</button>", escape_html(&p.text))
        }
        Properties::Divider(p) => {
            let style = build_style(&[
                ("border", "none".to_string()),
                ("border-top", format!("{}px solid {}", p.thickness, p.color)),
                ("margin", format!("{}px 0", p.margin)),
            ]);
            format!("<hr style=\"{style}\" />")
        }
        Properties::Grid(p) => {
            let style = build_style(&[
                ("display", "grid".to_string()),
                ("grid-template-columns", format!("repeat({}, 1fr)", p.columns)),
                ("gap", format!("{}px", p.gap)),
                ("width", "100%".to_string()),
            ]);
            let mut body = format!("<div style=\"{style}\">");
            for column in 0..p.columns {
                let label = p
                    .items
                    .get(column as usize)
                    .filter(|item| !item.content.is_empty())
                    .map_or_else(|| "Item".to_string(), |item| escape_html(&item.content));
                let _ = write!(
                    body,
                    "<div style=\"background:#f9f9f9;padding:10px;border-radius:4px;text-align:center;color:#999\">{label}</div>"
                );
            }
            body.push_str("</div>");
            body
        }
    }
}

fn typography(content: &str, font_size: f64, color: &str, weight: &str, family: &str) -> String {
    let style = build_style(&[
        ("font-size", format!("{font_size}px")),
        ("color", color.to_string()),
        ("font-weight", weight.to_string()),
        ("font-family", family.to_string()),
        ("word-wrap", "break-word".to_string()),
    ]);
    format!("<div style=\"{style}\">{}</div>", escape_html(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use builder_core::DocumentMetadata;

    fn session_with(types: &[&str]) -> (EditorSession, Vec<ElementId>) {
        let mut session = EditorSession::new(DocumentMetadata::default());
        let ids = types
            .iter()
            .map(|t| session.create(t, Position::new(100.0, 100.0)).expect("valid type"))
            .collect();
        session.take_events();
        (session, ids)
    }

    #[test]
    fn test_render_is_idempotent() {
        let (session, _) = session_with(&["text", "image", "grid", "button"]);
        let view = CanvasView::default();
        let first = view.render(&session);
        let second = view.render(&session);
        assert_eq!(first, second);
        assert_eq!(first.to_html(), second.to_html());
        assert_eq!(first.nodes.len(), 4);
    }

    #[test]
    fn test_selected_border() {
        let (mut session, ids) = session_with(&["text", "text"]);
        session.select(Some(ids[1]));
        let tree = CanvasView::default().render(&session);

        let selected = tree.node(ids[1]).expect("rendered");
        assert!(selected.selected);
        assert!(selected.style.contains("border:3px solid #6605c7"));
        let idle = tree.node(ids[0]).expect("rendered");
        assert!(idle.style.contains("border:2px solid #ddd"));
    }

    #[test]
    fn test_preview_escapes_content() {
        let (mut session, ids) = session_with(&["text"]);
        session
            .set_property(ids[0], "content", "<b>bold</b>".into())
            .expect("valid");
        let tree = CanvasView::default().render(&session);
        let body = &tree.node(ids[0]).expect("rendered").body;
        assert!(body.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!body.contains("<b>"));
    }

    #[test]
    fn test_canvas_grows_with_content() {
        let (mut session, ids) = session_with(&["image"]);
        let view = CanvasView::default();
        assert!((view.render(&session).height - CANVAS_MIN_HEIGHT).abs() < f64::EPSILON);

        session.move_to(ids[0], Position::new(900.0, 0.0));
        let tree = view.render(&session);
        assert!((tree.height - 1300.0).abs() < f64::EPSILON);
        assert!((tree.grid.height - 1300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grid_svg() {
        let grid = GridUnderlay {
            width: 40.0,
            height: 20.0,
            spacing: 20.0,
            color: "#f0f0f0".to_string(),
        };
        let svg = grid.to_svg();
        assert!(svg.contains(r#"<pattern id="grid" width="20" height="20""#));
        assert!(svg.contains(r##"stroke="#f0f0f0""##));
        assert!(svg.contains(r#"fill="url(#grid)""#));
        assert!(grid.to_data_uri().starts_with("data:image/svg+xml;base64,"));

        let blank = GridUnderlay { spacing: 0.0, ..grid };
        assert!(!blank.to_svg().contains("<pattern"));
    }

    #[test]
    fn test_grid_size_independent_of_canvas_height() {
        let (mut session, ids) = session_with(&["text"]);
        let view = CanvasView::default();
        let baseline = view.render(&session).grid.to_svg().len();

        for top in [2e6, 3e17, 1e18] {
            session.move_to(ids[0], Position::new(top, 0.0));
            let tree = view.render(&session);
            assert!(tree.height >= top);
            let svg = tree.grid.to_svg();
            assert!(svg.len() < baseline + 400, "grid svg grew to {} bytes", svg.len());
        }
    }

    #[test]
    fn test_click_selects_and_clears() {
        let (mut session, ids) = session_with(&["button"]);
        let view = CanvasView::default();

        assert_eq!(view.click(&mut session, 110.0, 110.0), Some(ids[0]));
        assert_eq!(session.store().selected_id(), Some(ids[0]));

        assert_eq!(view.click(&mut session, 5.0, 5.0), None);
        assert!(session.store().selected().is_none());
    }

    #[test]
    fn test_drop_new_offsets_pointer() {
        let (mut session, _) = session_with(&[]);
        let view = CanvasView::default();

        let id = view.drop_new(&mut session, "heading", 100.0, 200.0).expect("valid");
        assert_eq!(session.store().get(id).map(|e| e.position), Some(Position::new(70.0, 140.0)));

        let id = view.drop_new(&mut session, "divider", 10.0, 10.0).expect("valid");
        assert_eq!(session.store().get(id).map(|e| e.position), Some(Position::new(0.0, 0.0)));

        assert!(view.drop_new(&mut session, "marquee", 10.0, 10.0).is_err());
    }

    #[test]
    fn test_affordances_route_through_history() {
        let (mut session, ids) = session_with(&["text"]);
        let view = CanvasView::default();
        let undo_len = session.history_state().undo_len;

        assert!(view.invoke(&mut session, ids[0], Affordance::Duplicate));
        assert_eq!(session.store().len(), 2);
        assert!(view.invoke(&mut session, ids[0], Affordance::Delete));
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.history_state().undo_len, undo_len + 2);
    }
}
