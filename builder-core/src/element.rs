//! Document elements - the positioned content blocks of a canvas.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BuilderError, Properties};

/// Minimum width enforced when resizing an element.
pub const MIN_WIDTH: f64 = 50.0;

/// Minimum height enforced when resizing an element.
pub const MIN_HEIGHT: f64 = 20.0;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of element types a document can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// A paragraph of text.
    Text,
    /// A section heading (h1..h6).
    Heading,
    /// A still image.
    Image,
    /// An embedded or uploaded video.
    Video,
    /// A call-to-action button or link.
    Button,
    /// A horizontal rule.
    Divider,
    /// A CSS grid of text items.
    Grid,
}

impl ElementType {
    /// Every supported element type, in palette order.
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Heading,
        Self::Image,
        Self::Video,
        Self::Button,
        Self::Divider,
        Self::Grid,
    ];

    /// The wire name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading => "heading",
            Self::Image => "image",
            Self::Video => "video",
            Self::Button => "button",
            Self::Divider => "divider",
            Self::Grid => "grid",
        }
    }

    /// Palette label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Heading => "Heading",
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Button => "Button",
            Self::Divider => "Divider",
            Self::Grid => "Grid",
        }
    }

    /// Size a freshly created element of this type starts with.
    #[must_use]
    pub const fn default_size(self) -> Size {
        let (width, height) = match self {
            Self::Text => (Dimension::Px(300.0), Dimension::Auto),
            Self::Heading => (Dimension::Px(400.0), Dimension::Auto),
            Self::Image => (Dimension::Px(400.0), Dimension::Px(300.0)),
            Self::Video => (Dimension::Px(400.0), Dimension::Px(225.0)),
            Self::Button => (Dimension::Px(150.0), Dimension::Px(40.0)),
            Self::Divider => (Dimension::Full, Dimension::Px(2.0)),
            Self::Grid => (Dimension::Px(600.0), Dimension::Auto),
        };
        Size { width, height }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BuilderError::InvalidType(s.to_string()))
    }
}

/// Canvas position in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Pixels from the top edge.
    pub top: f64,
    /// Pixels from the left edge.
    pub left: f64,
}

impl Position {
    /// Create a position, clamping both coordinates at zero.
    #[must_use]
    pub fn new(top: f64, left: f64) -> Self {
        Self {
            top: top.max(0.0),
            left: left.max(0.0),
        }
    }

    /// Return this position shifted by the given deltas (clamped at zero).
    #[must_use]
    pub fn offset(self, dy: f64, dx: f64) -> Self {
        Self::new(self.top + dy, self.left + dx)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            top: 50.0,
            left: 50.0,
        }
    }
}

/// One axis of an element's size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    /// A fixed size in pixels.
    Px(f64),
    /// Sized by content (`"auto"`).
    Auto,
    /// Fills the container (`"100%"`).
    Full,
}

impl Dimension {
    /// Pixel value, if this dimension is numeric.
    #[must_use]
    pub const fn px(self) -> Option<f64> {
        match self {
            Self::Px(v) => Some(v),
            Self::Auto | Self::Full => None,
        }
    }

    /// Pixel dimension, or `None` unless `value` is finite and non-negative.
    #[must_use]
    pub fn pixels(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self::Px(value))
    }

    /// Clamp a numeric dimension to `min`; sentinels pass through.
    #[must_use]
    pub fn at_least(self, min: f64) -> Self {
        match self {
            Self::Px(v) => Self::Px(v.max(min)),
            other => other,
        }
    }

    /// CSS value for this dimension.
    #[must_use]
    pub fn to_css(self) -> String {
        match self {
            Self::Px(v) => format!("{v}px"),
            Self::Auto => "auto".to_string(),
            Self::Full => "100%".to_string(),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "100%" => Ok(Self::Full),
            other => other
                .strip_suffix("px")
                .unwrap_or(other)
                .parse::<f64>()
                .ok()
                .and_then(Self::pixels)
                .ok_or_else(|| format!("unsupported dimension: {other}")),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(f64),
    Keyword(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = String;

    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Number(v) => {
                Self::pixels(v).ok_or_else(|| format!("unsupported dimension: {v}"))
            }
            DimensionRepr::Keyword(s) => s.parse(),
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(dim: Dimension) -> Self {
        match dim {
            Dimension::Px(v) => Self::Number(v),
            Dimension::Auto => Self::Keyword("auto".to_string()),
            Dimension::Full => Self::Keyword("100%".to_string()),
        }
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: Dimension,
    /// Vertical extent.
    pub height: Dimension,
}

impl Size {
    /// Create a size with the resize minimums applied.
    #[must_use]
    pub fn clamped(width: Dimension, height: Dimension) -> Self {
        Self {
            width: width.at_least(MIN_WIDTH),
            height: height.at_least(MIN_HEIGHT),
        }
    }
}

/// A positioned, styled content block.
///
/// The element's type is carried by its [`Properties`] variant, so it cannot
/// change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementRepr", into = "ElementRepr")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Top-left corner on the canvas.
    pub position: Position,
    /// Width and height.
    pub size: Size,
    /// Stacking order; only ever compared relatively.
    pub z_index: i32,
    /// Type-specific content and style.
    pub properties: Properties,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Element {
    /// Create a new element of the given type with default properties and size.
    #[must_use]
    pub fn new(element_type: ElementType, position: Position, z_index: i32) -> Self {
        Self {
            id: ElementId::new(),
            position: Position::new(position.top, position.left),
            size: element_type.default_size(),
            z_index,
            properties: Properties::defaults(element_type),
            created: Utc::now(),
        }
    }

    /// The element's type.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.properties.element_type()
    }

    /// Check if a point (in canvas coordinates) is within this element.
    ///
    /// Non-numeric sizes are treated as zero extent.
    #[must_use]
    pub fn contains_point(&self, top: f64, left: f64) -> bool {
        let width = self.size.width.px().unwrap_or(0.0);
        let height = self.size.height.px().unwrap_or(0.0);
        left >= self.position.left
            && left <= self.position.left + width
            && top >= self.position.top
            && top <= self.position.top + height
    }
}

/// Wire shape of an element: the `type` tag sits beside an untyped
/// `properties` object so missing keys can be filled from the schema.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementRepr {
    id: ElementId,
    #[serde(rename = "type")]
    element_type: String,
    position: Position,
    size: Option<Size>,
    #[serde(default)]
    z_index: i32,
    #[serde(default)]
    properties: serde_json::Value,
    created: Option<DateTime<Utc>>,
}

impl TryFrom<ElementRepr> for Element {
    type Error = BuilderError;

    fn try_from(repr: ElementRepr) -> Result<Self, Self::Error> {
        let element_type: ElementType = repr.element_type.parse()?;
        let properties = Properties::from_json(element_type, repr.properties)?;
        Ok(Self {
            id: repr.id,
            position: Position::new(repr.position.top, repr.position.left),
            size: repr.size.unwrap_or_else(|| element_type.default_size()),
            z_index: repr.z_index,
            properties,
            created: repr.created.unwrap_or_else(Utc::now),
        })
    }
}

impl From<Element> for ElementRepr {
    fn from(element: Element) -> Self {
        let element_type = element.element_type();
        Self {
            id: element.id,
            element_type: element_type.as_str().to_string(),
            position: element.position,
            size: Some(element.size),
            z_index: element.z_index,
            properties: element.properties.to_json(),
            created: Some(element.created),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_parse() {
        assert_eq!("heading".parse::<ElementType>().ok(), Some(ElementType::Heading));
        let err = "carousel".parse::<ElementType>().expect_err("unknown type");
        assert!(matches!(err, BuilderError::InvalidType(ref t) if t == "carousel"));
    }

    #[test]
    fn test_position_clamps_negative() {
        let pos = Position::new(-10.0, 5.0);
        assert!((pos.top - 0.0).abs() < f64::EPSILON);
        assert!((pos.left - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dimension_wire_format() {
        let size = Size {
            width: Dimension::Full,
            height: Dimension::Auto,
        };
        let json = serde_json::to_string(&size).expect("serialize");
        assert_eq!(json, r#"{"width":"100%","height":"auto"}"#);

        let parsed: Size = serde_json::from_str(r#"{"width":320,"height":"auto"}"#).expect("parse");
        assert_eq!(parsed.width, Dimension::Px(320.0));
        assert_eq!(parsed.height, Dimension::Auto);
    }

    #[test]
    fn test_dimension_rejects_non_finite_and_negative() {
        assert_eq!("120px".parse::<Dimension>(), Ok(Dimension::Px(120.0)));
        assert_eq!("0".parse::<Dimension>(), Ok(Dimension::Px(0.0)));
        for bad in ["NaN", "inf", "-inf", "infpx", "-5px", "-5", "5pxpx", "wide"] {
            assert!(bad.parse::<Dimension>().is_err(), "{bad} should be rejected");
        }
        assert!(serde_json::from_str::<Size>(r#"{"width":-10,"height":"auto"}"#).is_err());
    }

    #[test]
    fn test_resize_minimums_only_touch_pixels() {
        let size = Size::clamped(Dimension::Px(10.0), Dimension::Auto);
        assert_eq!(size.width, Dimension::Px(MIN_WIDTH));
        assert_eq!(size.height, Dimension::Auto);
    }

    #[test]
    fn test_element_json_shape() {
        let element = Element::new(ElementType::Button, Position::new(10.0, 20.0), 3);
        let value = serde_json::to_value(&element).expect("serialize");
        assert_eq!(value["type"], "button");
        assert_eq!(value["zIndex"], 3);
        assert_eq!(value["properties"]["text"], "Click me");
        assert_eq!(value["size"]["width"], 150.0);

        let back: Element = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, element);
    }

    #[test]
    fn test_missing_properties_filled_from_schema() {
        let json = serde_json::json!({
            "id": ElementId::new(),
            "type": "image",
            "position": {"top": 0, "left": 0},
            "zIndex": 1,
            "properties": {"src": "https://example.com/a.png"}
        });
        let element: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(element.element_type(), ElementType::Image);
        assert_eq!(
            element.properties.get("alt"),
            Some(crate::PropertyValue::Text("Image".to_string()))
        );
        assert_eq!(element.size, ElementType::Image.default_size());
    }

    #[test]
    fn test_unknown_type_rejected_on_load() {
        let json = serde_json::json!({
            "id": ElementId::new(),
            "type": "marquee",
            "position": {"top": 0, "left": 0},
        });
        assert!(serde_json::from_value::<Element>(json).is_err());
    }

    #[test]
    fn test_contains_point() {
        let element = Element::new(ElementType::Image, Position::new(100.0, 100.0), 0);
        assert!(element.contains_point(150.0, 150.0));
        assert!(!element.contains_point(50.0, 50.0));
    }
}
