//! Per-type property schemas.
//!
//! Every element type has a fixed record of properties. Editors address a
//! property by its camelCase wire key (`fontColor`, `borderRadius`, ...); the
//! same keys are read by the export engine, so adding a key means updating the
//! defaults here, the design panel, and the exporter together.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BuilderError, BuilderResult, Dimension, ElementType};

/// Largest column count a grid element accepts.
pub const MAX_GRID_COLUMNS: u32 = 12;

/// A single property value as seen by editors and commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean flag.
    Bool(bool),
    /// A numeric value.
    Number(f64),
    /// A string value (also used for enumerated keys).
    Text(String),
    /// Grid items.
    Items(Vec<GridItem>),
}

impl PropertyValue {
    /// Borrow the string payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Dimension> for PropertyValue {
    fn from(dim: Dimension) -> Self {
        match dim {
            Dimension::Px(v) => Self::Number(v),
            Dimension::Auto => Self::Text("auto".to_string()),
            Dimension::Full => Self::Text("100%".to_string()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Items(items) => write!(f, "[{} items]", items.len()),
        }
    }
}

/// One cell of a grid element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    /// Text shown in the cell.
    #[serde(default)]
    pub content: String,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
    /// Justified.
    Justify,
}

impl TextAlign {
    /// CSS keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

impl FromStr for TextAlign {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            _ => Err(()),
        }
    }
}

/// Heading level, rendered as `<h1>`..`<h6>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    /// `<h1>`
    H1,
    /// `<h2>`
    #[default]
    H2,
    /// `<h3>`
    H3,
    /// `<h4>`
    H4,
    /// `<h5>`
    H5,
    /// `<h6>`
    H6,
}

impl HeadingLevel {
    /// HTML tag name.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
        }
    }
}

impl FromStr for HeadingLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h1" => Ok(Self::H1),
            "h2" => Ok(Self::H2),
            "h3" => Ok(Self::H3),
            "h4" => Ok(Self::H4),
            "h5" => Ok(Self::H5),
            "h6" => Ok(Self::H6),
            _ => Err(()),
        }
    }
}

/// Where a video element's source lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    /// Third-party player URL rendered in an iframe.
    #[default]
    Embed,
    /// Direct media file rendered with `<video>`.
    Upload,
}

impl VideoSource {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embed => "embed",
            Self::Upload => "upload",
        }
    }
}

impl FromStr for VideoSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "embed" => Ok(Self::Embed),
            "upload" => Ok(Self::Upload),
            _ => Err(()),
        }
    }
}

/// Properties of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProperties {
    /// Paragraph text.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// CSS font weight.
    pub font_weight: String,
    /// Text colour as hex.
    pub font_color: String,
    /// CSS font family.
    pub font_family: String,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Unitless line height.
    pub line_height: f64,
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            content: "Click to edit text".to_string(),
            font_size: 16.0,
            font_weight: "normal".to_string(),
            font_color: "#000000".to_string(),
            font_family: "sans-serif".to_string(),
            text_align: TextAlign::Left,
            line_height: 1.5,
        }
    }
}

/// Properties of a heading element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadingProperties {
    /// Heading text.
    pub content: String,
    /// Heading level.
    pub level: HeadingLevel,
    /// Font size in pixels.
    pub font_size: f64,
    /// CSS font weight.
    pub font_weight: String,
    /// Text colour as hex.
    pub font_color: String,
    /// CSS font family.
    pub font_family: String,
    /// Horizontal alignment.
    pub text_align: TextAlign,
}

impl Default for HeadingProperties {
    fn default() -> Self {
        Self {
            content: "Click to edit heading".to_string(),
            level: HeadingLevel::H2,
            font_size: 32.0,
            font_weight: "bold".to_string(),
            font_color: "#000000".to_string(),
            font_family: "serif".to_string(),
            text_align: TextAlign::Left,
        }
    }
}

/// Properties of an image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProperties {
    /// Image URL; empty until the user picks one.
    pub src: String,
    /// Alternative text.
    pub alt: String,
    /// CSS `object-fit`.
    pub object_fit: String,
    /// Placeholder background colour.
    pub background_color: String,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            src: String::new(),
            alt: "Image".to_string(),
            object_fit: "cover".to_string(),
            background_color: "#f0f0f0".to_string(),
        }
    }
}

/// Properties of a video element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoProperties {
    /// Video URL; empty until the user picks one.
    pub src: String,
    /// Embed or uploaded file.
    #[serde(rename = "type")]
    pub source: VideoSource,
    /// Start playing on load.
    pub autoplay: bool,
    /// Show player controls.
    pub controls: bool,
}

impl Default for VideoProperties {
    fn default() -> Self {
        Self {
            src: String::new(),
            source: VideoSource::Embed,
            autoplay: false,
            controls: true,
        }
    }
}

/// Properties of a button element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonProperties {
    /// Button label.
    pub text: String,
    /// Fill colour as hex.
    pub background_color: String,
    /// Label colour as hex.
    pub text_color: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// CSS font weight.
    pub font_weight: String,
    /// CSS padding shorthand.
    pub padding: String,
    /// Corner radius in pixels.
    pub border_radius: f64,
    /// Target URL; empty renders a plain button.
    pub link: String,
}

impl Default for ButtonProperties {
    fn default() -> Self {
        Self {
            text: "Click me".to_string(),
            background_color: "#6605c7".to_string(),
            text_color: "#ffffff".to_string(),
            font_size: 14.0,
            font_weight: "bold".to_string(),
            padding: "10px 20px".to_string(),
            border_radius: 6.0,
            link: String::new(),
        }
    }
}

/// Properties of a divider element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DividerProperties {
    /// Rule colour as hex.
    pub color: String,
    /// Rule thickness in pixels.
    pub thickness: f64,
    /// Vertical margin in pixels.
    pub margin: f64,
    /// Rule width.
    pub width: Dimension,
}

impl Default for DividerProperties {
    fn default() -> Self {
        Self {
            color: "#cccccc".to_string(),
            thickness: 2.0,
            margin: 20.0,
            width: Dimension::Full,
        }
    }
}

/// Properties of a grid element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridProperties {
    /// Number of columns.
    pub columns: u32,
    /// Gap between cells in pixels.
    pub gap: f64,
    /// Cell contents.
    pub items: Vec<GridItem>,
}

impl Default for GridProperties {
    fn default() -> Self {
        Self {
            columns: 2,
            gap: 20.0,
            items: Vec::new(),
        }
    }
}

/// Type-specific properties of an element.
///
/// The variant doubles as the element's type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Properties {
    /// Text paragraph.
    Text(TextProperties),
    /// Heading.
    Heading(HeadingProperties),
    /// Image.
    Image(ImageProperties),
    /// Video.
    Video(VideoProperties),
    /// Button.
    Button(ButtonProperties),
    /// Divider.
    Divider(DividerProperties),
    /// Grid.
    Grid(GridProperties),
}

impl Properties {
    /// Default properties for a freshly created element of `element_type`.
    #[must_use]
    pub fn defaults(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Text => Self::Text(TextProperties::default()),
            ElementType::Heading => Self::Heading(HeadingProperties::default()),
            ElementType::Image => Self::Image(ImageProperties::default()),
            ElementType::Video => Self::Video(VideoProperties::default()),
            ElementType::Button => Self::Button(ButtonProperties::default()),
            ElementType::Divider => Self::Divider(DividerProperties::default()),
            ElementType::Grid => Self::Grid(GridProperties::default()),
        }
    }

    /// The element type these properties belong to.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Heading(_) => ElementType::Heading,
            Self::Image(_) => ElementType::Image,
            Self::Video(_) => ElementType::Video,
            Self::Button(_) => ElementType::Button,
            Self::Divider(_) => ElementType::Divider,
            Self::Grid(_) => ElementType::Grid,
        }
    }

    /// The fixed key set of this schema.
    #[must_use]
    pub const fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::Text(_) => &[
                "content",
                "fontSize",
                "fontWeight",
                "fontColor",
                "fontFamily",
                "textAlign",
                "lineHeight",
            ],
            Self::Heading(_) => &[
                "content",
                "level",
                "fontSize",
                "fontWeight",
                "fontColor",
                "fontFamily",
                "textAlign",
            ],
            Self::Image(_) => &["src", "alt", "objectFit", "backgroundColor"],
            Self::Video(_) => &["src", "type", "autoplay", "controls"],
            Self::Button(_) => &[
                "text",
                "backgroundColor",
                "textColor",
                "fontSize",
                "fontWeight",
                "padding",
                "borderRadius",
                "link",
            ],
            Self::Divider(_) => &["color", "thickness", "margin", "width"],
            Self::Grid(_) => &["columns", "gap", "items"],
        }
    }

    /// Check whether `key` belongs to this schema.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.keys().contains(&key)
    }

    /// Read a property by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        let value: PropertyValue = match (self, key) {
            (Self::Text(p), "content") => p.content.clone().into(),
            (Self::Text(p), "fontSize") => p.font_size.into(),
            (Self::Text(p), "fontWeight") => p.font_weight.clone().into(),
            (Self::Text(p), "fontColor") => p.font_color.clone().into(),
            (Self::Text(p), "fontFamily") => p.font_family.clone().into(),
            (Self::Text(p), "textAlign") => p.text_align.as_str().into(),
            (Self::Text(p), "lineHeight") => p.line_height.into(),

            (Self::Heading(p), "content") => p.content.clone().into(),
            (Self::Heading(p), "level") => p.level.tag().into(),
            (Self::Heading(p), "fontSize") => p.font_size.into(),
            (Self::Heading(p), "fontWeight") => p.font_weight.clone().into(),
            (Self::Heading(p), "fontColor") => p.font_color.clone().into(),
            (Self::Heading(p), "fontFamily") => p.font_family.clone().into(),
            (Self::Heading(p), "textAlign") => p.text_align.as_str().into(),

            (Self::Image(p), "src") => p.src.clone().into(),
            (Self::Image(p), "alt") => p.alt.clone().into(),
            (Self::Image(p), "objectFit") => p.object_fit.clone().into(),
            (Self::Image(p), "backgroundColor") => p.background_color.clone().into(),

            (Self::Video(p), "src") => p.src.clone().into(),
            (Self::Video(p), "type") => p.source.as_str().into(),
            (Self::Video(p), "autoplay") => p.autoplay.into(),
            (Self::Video(p), "controls") => p.controls.into(),

            (Self::Button(p), "text") => p.text.clone().into(),
            (Self::Button(p), "backgroundColor") => p.background_color.clone().into(),
            (Self::Button(p), "textColor") => p.text_color.clone().into(),
            (Self::Button(p), "fontSize") => p.font_size.into(),
            (Self::Button(p), "fontWeight") => p.font_weight.clone().into(),
            (Self::Button(p), "padding") => p.padding.clone().into(),
            (Self::Button(p), "borderRadius") => p.border_radius.into(),
            (Self::Button(p), "link") => p.link.clone().into(),

            (Self::Divider(p), "color") => p.color.clone().into(),
            (Self::Divider(p), "thickness") => p.thickness.into(),
            (Self::Divider(p), "margin") => p.margin.into(),
            (Self::Divider(p), "width") => p.width.into(),

            (Self::Grid(p), "columns") => f64::from(p.columns).into(),
            (Self::Grid(p), "gap") => p.gap.into(),
            (Self::Grid(p), "items") => PropertyValue::Items(p.items.clone()),

            _ => return None,
        };
        Some(value)
    }

    /// Write a property by key, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::UnknownProperty`] if the key is not part of
    /// this schema, or [`BuilderError::InvalidPropertyValue`] if the value has
    /// the wrong shape. The properties are left unchanged on error.
    pub fn set(&mut self, key: &str, value: PropertyValue) -> BuilderResult<PropertyValue> {
        let element_type = self.element_type();
        let unknown = || BuilderError::UnknownProperty {
            element_type,
            key: key.to_string(),
        };
        let previous = self.get(key).ok_or_else(unknown)?;

        match (self, key) {
            (Self::Text(p), "content") => p.content = text(key, value)?,
            (Self::Text(p), "fontSize") => p.font_size = number(key, value)?,
            (Self::Text(p), "fontWeight") => p.font_weight = text(key, value)?,
            (Self::Text(p), "fontColor") => p.font_color = text(key, value)?,
            (Self::Text(p), "fontFamily") => p.font_family = text(key, value)?,
            (Self::Text(p), "textAlign") => {
                p.text_align = keyword(key, value, "left, center, right or justify")?;
            }
            (Self::Text(p), "lineHeight") => p.line_height = number(key, value)?,

            (Self::Heading(p), "content") => p.content = text(key, value)?,
            (Self::Heading(p), "level") => p.level = keyword(key, value, "h1 through h6")?,
            (Self::Heading(p), "fontSize") => p.font_size = number(key, value)?,
            (Self::Heading(p), "fontWeight") => p.font_weight = text(key, value)?,
            (Self::Heading(p), "fontColor") => p.font_color = text(key, value)?,
            (Self::Heading(p), "fontFamily") => p.font_family = text(key, value)?,
            (Self::Heading(p), "textAlign") => {
                p.text_align = keyword(key, value, "left, center, right or justify")?;
            }

            (Self::Image(p), "src") => p.src = text(key, value)?,
            (Self::Image(p), "alt") => p.alt = text(key, value)?,
            (Self::Image(p), "objectFit") => p.object_fit = text(key, value)?,
            (Self::Image(p), "backgroundColor") => p.background_color = text(key, value)?,

            (Self::Video(p), "src") => p.src = text(key, value)?,
            (Self::Video(p), "type") => p.source = keyword(key, value, "embed or upload")?,
            (Self::Video(p), "autoplay") => p.autoplay = flag(key, value)?,
            (Self::Video(p), "controls") => p.controls = flag(key, value)?,

            (Self::Button(p), "text") => p.text = text(key, value)?,
            (Self::Button(p), "backgroundColor") => p.background_color = text(key, value)?,
            (Self::Button(p), "textColor") => p.text_color = text(key, value)?,
            (Self::Button(p), "fontSize") => p.font_size = number(key, value)?,
            (Self::Button(p), "fontWeight") => p.font_weight = text(key, value)?,
            (Self::Button(p), "padding") => p.padding = text(key, value)?,
            (Self::Button(p), "borderRadius") => p.border_radius = number(key, value)?,
            (Self::Button(p), "link") => p.link = text(key, value)?,

            (Self::Divider(p), "color") => p.color = text(key, value)?,
            (Self::Divider(p), "thickness") => p.thickness = number(key, value)?,
            (Self::Divider(p), "margin") => p.margin = number(key, value)?,
            (Self::Divider(p), "width") => p.width = dimension(key, value)?,

            (Self::Grid(p), "columns") => p.columns = columns(key, value)?,
            (Self::Grid(p), "gap") => p.gap = number(key, value)?,
            (Self::Grid(p), "items") => match value {
                PropertyValue::Items(items) => p.items = items,
                _ => return Err(invalid(key, "a list of grid items")),
            },

            _ => return Err(unknown()),
        }

        Ok(previous)
    }

    /// Serialize to the JSON object stored under an element's `properties`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            Self::Text(p) => serde_json::to_value(p),
            Self::Heading(p) => serde_json::to_value(p),
            Self::Image(p) => serde_json::to_value(p),
            Self::Video(p) => serde_json::to_value(p),
            Self::Button(p) => serde_json::to_value(p),
            Self::Divider(p) => serde_json::to_value(p),
            Self::Grid(p) => serde_json::to_value(p),
        };
        value.unwrap_or_default()
    }

    /// Parse a `properties` object for the given type.
    ///
    /// Missing keys take the type's defaults; keys outside the schema are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::Serialization`] if a present key has the wrong
    /// JSON shape.
    pub fn from_json(element_type: ElementType, value: serde_json::Value) -> BuilderResult<Self> {
        if value.is_null() {
            return Ok(Self::defaults(element_type));
        }
        let properties = match element_type {
            ElementType::Text => Self::Text(serde_json::from_value(value)?),
            ElementType::Heading => Self::Heading(serde_json::from_value(value)?),
            ElementType::Image => Self::Image(serde_json::from_value(value)?),
            ElementType::Video => Self::Video(serde_json::from_value(value)?),
            ElementType::Button => Self::Button(serde_json::from_value(value)?),
            ElementType::Divider => Self::Divider(serde_json::from_value(value)?),
            ElementType::Grid => Self::Grid(serde_json::from_value(value)?),
        };
        Ok(properties)
    }
}

fn invalid(key: &str, expected: &'static str) -> BuilderError {
    BuilderError::InvalidPropertyValue {
        key: key.to_string(),
        expected,
    }
}

fn text(key: &str, value: PropertyValue) -> BuilderResult<String> {
    match value {
        PropertyValue::Text(s) => Ok(s),
        _ => Err(invalid(key, "a string")),
    }
}

fn number(key: &str, value: PropertyValue) -> BuilderResult<f64> {
    match value {
        PropertyValue::Number(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(invalid(key, "a non-negative number")),
    }
}

fn flag(key: &str, value: PropertyValue) -> BuilderResult<bool> {
    match value {
        PropertyValue::Bool(b) => Ok(b),
        _ => Err(invalid(key, "a boolean")),
    }
}

fn keyword<T: FromStr>(key: &str, value: PropertyValue, expected: &'static str) -> BuilderResult<T> {
    value
        .as_text()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(key, expected))
}

fn dimension(key: &str, value: PropertyValue) -> BuilderResult<Dimension> {
    let parsed = match value {
        PropertyValue::Number(n) => Dimension::pixels(n),
        PropertyValue::Text(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(key, "a pixel width, \"auto\" or \"100%\""))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn columns(key: &str, value: PropertyValue) -> BuilderResult<u32> {
    match value {
        PropertyValue::Number(n)
            if n.fract() == 0.0 && n >= 1.0 && n <= f64::from(MAX_GRID_COLUMNS) =>
        {
            Ok(n as u32)
        }
        _ => Err(invalid(key, "a whole number of columns between 1 and 12")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_schema_keys() {
        for element_type in ElementType::ALL {
            let props = Properties::defaults(element_type);
            assert_eq!(props.element_type(), element_type);
            for key in props.keys() {
                assert!(props.get(key).is_some(), "{element_type} missing {key}");
            }
            let json = props.to_json();
            let object = json.as_object().expect("object");
            assert_eq!(object.len(), props.keys().len(), "{element_type} key count");
        }
    }

    #[test]
    fn test_set_returns_previous_value() {
        let mut props = Properties::defaults(ElementType::Text);
        let previous = props
            .set("fontColor", "#ff0000".into())
            .expect("valid key");
        assert_eq!(previous, PropertyValue::from("#000000"));
        assert_eq!(props.get("fontColor"), Some("#ff0000".into()));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut props = Properties::defaults(ElementType::Divider);
        let err = props.set("fontSize", 12.0.into()).expect_err("not a divider key");
        assert!(matches!(err, BuilderError::UnknownProperty { .. }));
        assert_eq!(props, Properties::defaults(ElementType::Divider));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let mut props = Properties::defaults(ElementType::Video);
        assert!(props.set("autoplay", "yes".into()).is_err());
        assert!(props.set("type", "stream".into()).is_err());
        assert!(props.set("type", "upload".into()).is_ok());

        let mut heading = Properties::defaults(ElementType::Heading);
        assert!(heading.set("level", "h7".into()).is_err());
        assert!(heading.set("fontSize", (-4.0).into()).is_err());
        assert!(heading.set("level", "h1".into()).is_ok());
    }

    #[test]
    fn test_grid_columns_bounds() {
        let mut grid = Properties::defaults(ElementType::Grid);
        assert!(grid.set("columns", 0.0.into()).is_err());
        assert!(grid.set("columns", 2.5.into()).is_err());
        assert!(grid.set("columns", 13.0.into()).is_err());
        assert!(grid.set("columns", 3.0.into()).is_ok());
        assert_eq!(grid.get("columns"), Some(PropertyValue::Number(3.0)));
    }

    #[test]
    fn test_divider_width_accepts_sentinels() {
        let mut divider = Properties::defaults(ElementType::Divider);
        assert_eq!(divider.get("width"), Some("100%".into()));
        divider.set("width", 240.0.into()).expect("pixel width");
        assert_eq!(divider.get("width"), Some(PropertyValue::Number(240.0)));
        divider.set("width", "auto".into()).expect("auto width");
        assert_eq!(divider.get("width"), Some("auto".into()));
    }

    #[test]
    fn test_divider_width_rejects_bad_numbers() {
        let mut divider = Properties::defaults(ElementType::Divider);
        for bad in ["NaN", "inf", "-5px"] {
            assert!(divider.set("width", bad.into()).is_err(), "{bad} accepted");
        }
        assert!(divider.set("width", (-5.0).into()).is_err());
        assert!(divider.set("width", f64::NAN.into()).is_err());
        assert_eq!(divider.get("width"), Some("100%".into()));
    }

    #[test]
    fn test_from_json_drops_unknown_keys() {
        let json = serde_json::json!({"text": "Go", "onclick": "alert(1)"});
        let props = Properties::from_json(ElementType::Button, json).expect("parse");
        assert_eq!(props.get("text"), Some("Go".into()));
        assert!(props.to_json().get("onclick").is_none());
    }

    #[test]
    fn test_video_type_wire_key() {
        let props = Properties::defaults(ElementType::Video);
        assert_eq!(props.to_json()["type"], "embed");
    }
}
