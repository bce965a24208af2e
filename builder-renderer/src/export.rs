//! Document export to HTML and portable JSON.
//!
//! Every function here is a pure function of its inputs: the same elements
//! and metadata always produce byte-identical output. The only clock read is
//! [`ExportEngine::export_to_json`], which stamps `exportedAt`.

use std::fmt::Write;

use builder_core::{
    ButtonProperties, DividerProperties, DocumentMetadata, DocumentSnapshot, Element,
    GridProperties, HeadingProperties, ImageProperties, Properties, TextProperties,
    VideoProperties, VideoSource,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RenderResult;

/// Title used when the metadata has none.
pub const UNTITLED: &str = "Untitled Blog";

/// Placeholder emitted for an image with no source.
pub const EMPTY_IMAGE: &str = "<!-- Empty image element -->\n";

/// Placeholder emitted for a video with no source.
pub const EMPTY_VIDEO: &str = "<!-- Empty video element -->\n";

/// Configuration for document export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Title used when the metadata title is empty.
    pub default_title: String,
    /// Reading speed used for the read-time estimate.
    pub words_per_minute: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_title: UNTITLED.to_string(),
            words_per_minute: 200,
        }
    }
}

/// Derived facts about a document's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Words across text, heading, button and grid content.
    pub word_count: usize,
    /// Estimated reading time in whole minutes (at least 1).
    pub read_time_minutes: usize,
    /// Source of the first image in z-order, if any.
    pub featured_image: Option<String>,
}

/// Converts element sequences into semantic HTML and snapshots.
#[derive(Debug, Clone, Default)]
pub struct ExportEngine {
    config: ExportConfig,
}

impl ExportEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an engine with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Render elements as an HTML fragment, back to front.
    #[must_use]
    pub fn export_to_html(&self, elements: &[Element]) -> String {
        let mut sorted: Vec<&Element> = elements.iter().collect();
        sorted.sort_by_key(|e| e.z_index);

        let parts: Vec<String> = sorted
            .into_iter()
            .map(render_element_html)
            .filter(|html| !html.is_empty())
            .collect();
        parts.join("\n")
    }

    /// Snapshot elements and metadata, stamped with the current time.
    #[must_use]
    pub fn export_to_json(&self, elements: &[Element], metadata: &DocumentMetadata) -> DocumentSnapshot {
        self.export_to_json_at(elements, metadata, Utc::now())
    }

    /// Snapshot elements and metadata with an explicit timestamp.
    ///
    /// The elements are deep-copied; the snapshot shares nothing with the
    /// caller.
    #[must_use]
    pub fn export_to_json_at(
        &self,
        elements: &[Element],
        metadata: &DocumentMetadata,
        exported_at: DateTime<Utc>,
    ) -> DocumentSnapshot {
        DocumentSnapshot::new(metadata.clone(), elements.to_vec(), exported_at)
    }

    /// Serialize a snapshot of the elements to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_to_json_string(
        &self,
        elements: &[Element],
        metadata: &DocumentMetadata,
        exported_at: DateTime<Utc>,
    ) -> RenderResult<String> {
        let snapshot = self.export_to_json_at(elements, metadata, exported_at);
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Wrap the HTML fragment in a standalone document.
    #[must_use]
    pub fn generate_complete_document(
        &self,
        elements: &[Element],
        metadata: &DocumentMetadata,
    ) -> String {
        let content = self.export_to_html(elements);
        let title = if metadata.title.is_empty() {
            escape_html(&self.config.default_title)
        } else {
            escape_html(&metadata.title)
        };
        let excerpt = escape_html(&metadata.excerpt);
        let excerpt_html = if excerpt.is_empty() {
            String::new()
        } else {
            format!("<p class=\"blog-excerpt\">{excerpt}</p>")
        };

        let mut html = String::with_capacity(DOCUMENT_STYLE.len() + content.len() + 512);
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        let _ = writeln!(html, "    <title>{title}</title>");
        html.push_str(DOCUMENT_STYLE);
        html.push_str("</head>\n<body>\n    <article class=\"blog-container\">\n");
        html.push_str("        <header class=\"blog-header\">\n");
        let _ = writeln!(html, "            <h1 class=\"blog-title\">{title}</h1>");
        let _ = writeln!(html, "            {excerpt_html}");
        html.push_str("        </header>\n        <div class=\"blog-content\">\n");
        html.push_str(&content);
        html.push_str("\n        </div>\n    </article>\n</body>\n</html>");
        html
    }

    /// Word count, read time and featured image for the elements.
    #[must_use]
    pub fn summarize(&self, elements: &[Element]) -> DocumentSummary {
        let mut sorted: Vec<&Element> = elements.iter().collect();
        sorted.sort_by_key(|e| e.z_index);

        let mut word_count = 0;
        let mut featured_image = None;
        for element in sorted {
            match &element.properties {
                Properties::Text(p) => word_count += count_words(&p.content),
                Properties::Heading(p) => word_count += count_words(&p.content),
                Properties::Button(p) => word_count += count_words(&p.text),
                Properties::Grid(p) => {
                    word_count += p.items.iter().map(|i| count_words(&i.content)).sum::<usize>();
                }
                Properties::Image(p) if featured_image.is_none() && !p.src.is_empty() => {
                    featured_image = Some(p.src.clone());
                }
                Properties::Image(_) | Properties::Video(_) | Properties::Divider(_) => {}
            }
        }

        let wpm = self.config.words_per_minute.max(1);
        DocumentSummary {
            word_count,
            read_time_minutes: word_count.div_ceil(wpm).max(1),
            featured_image,
        }
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Escape text for safe interpolation into HTML content or attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Join CSS declarations into an inline style, escaping each value.
#[must_use]
pub fn build_style(declarations: &[(&str, String)]) -> String {
    let parts: Vec<String> = declarations
        .iter()
        .map(|(key, value)| format!("{key}:{}", escape_html(value)))
        .collect();
    parts.join(";")
}

/// Render a single element to HTML.
fn render_element_html(element: &Element) -> String {
    let max_width = element
        .size
        .width
        .px()
        .map_or_else(|| "100%".to_string(), |w| format!("{w}px"));

    match &element.properties {
        Properties::Text(p) => render_text(p),
        Properties::Heading(p) => render_heading(p),
        Properties::Image(p) => render_image(p, max_width),
        Properties::Video(p) => render_video(p, max_width),
        Properties::Button(p) => render_button(p),
        Properties::Divider(p) => render_divider(p),
        Properties::Grid(p) => render_grid(p),
    }
}

fn render_text(p: &TextProperties) -> String {
    let style = build_style(&[
        ("font-size", format!("{}px", p.font_size)),
        ("color", p.font_color.clone()),
        ("font-weight", p.font_weight.clone()),
        ("font-family", p.font_family.clone()),
        ("text-align", p.text_align.as_str().to_string()),
        ("line-height", p.line_height.to_string()),
        ("margin-bottom", "1rem".to_string()),
    ]);
    format!("<p style=\"{style}\">{}</p>", escape_html(&p.content))
}

fn render_heading(p: &HeadingProperties) -> String {
    let tag = p.level.tag();
    let style = build_style(&[
        ("font-size", format!("{}px", p.font_size)),
        ("color", p.font_color.clone()),
        ("font-weight", p.font_weight.clone()),
        ("font-family", p.font_family.clone()),
        ("text-align", p.text_align.as_str().to_string()),
        ("margin-bottom", "1.5rem".to_string()),
        ("margin-top", "1.5rem".to_string()),
    ]);
    format!("<{tag} style=\"{style}\">{}</{tag}>", escape_html(&p.content))
}

fn render_image(p: &ImageProperties, max_width: String) -> String {
    if p.src.is_empty() {
        return EMPTY_IMAGE.to_string();
    }
    let style = build_style(&[
        ("width", "100%".to_string()),
        ("height", "auto".to_string()),
        ("object-fit", p.object_fit.clone()),
        ("border-radius", "0.5rem".to_string()),
        ("margin-bottom", "1.5rem".to_string()),
        ("max-width", max_width),
    ]);
    format!(
        "<figure style=\"margin-bottom: 1.5rem; margin-top: 1.5rem;\">\n    <img src=\"{}\" alt=\"{}\" style=\"{style}\" />\n</figure>",
        escape_html(&p.src),
        escape_html(&p.alt),
    )
}

fn render_video(p: &VideoProperties, max_width: String) -> String {
    if p.src.is_empty() {
        return EMPTY_VIDEO.to_string();
    }
    let src = escape_html(&p.src);
    match p.source {
        VideoSource::Embed => format!(
            "<div style=\"position: relative; padding-bottom: 56.25%; height: 0; overflow: hidden; margin-bottom: 1.5rem; border-radius: 0.5rem;\">\n    <iframe style=\"position: absolute; top: 0; left: 0; width: 100%; height: 100%; border: none;\" src=\"{src}\" allowfullscreen></iframe>\n</div>"
        ),
        VideoSource::Upload => {
            let style = build_style(&[
                ("width", "100%".to_string()),
                ("height", "auto".to_string()),
                ("border-radius", "0.5rem".to_string()),
                ("margin-bottom", "1.5rem".to_string()),
                ("max-width", max_width),
            ]);
            let mut attrs = String::new();
            if p.autoplay {
                attrs.push_str(" autoplay");
            }
            if p.controls {
                attrs.push_str(" controls");
            }
            format!(
                "<video style=\"{style}\"{attrs}>\n    <source src=\"{src}\" />\n    Your browser does not support the video tag.\n</video>"
            )
        }
    }
}

fn render_button(p: &ButtonProperties) -> String {
    let style = build_style(&[
        ("background-color", p.background_color.clone()),
        ("color", p.text_color.clone()),
        ("font-size", format!("{}px", p.font_size)),
        ("font-weight", p.font_weight.clone()),
        ("padding", p.padding.clone()),
        ("border-radius", format!("{}px", p.border_radius)),
        ("border", "none".to_string()),
        ("cursor", "pointer".to_string()),
        ("display", "inline-block".to_string()),
        ("text-decoration", "none".to_string()),
        ("margin-bottom", "1.5rem".to_string()),
        ("margin-top", "1rem".to_string()),
    ]);
    let text = escape_html(&p.text);
    if p.link.is_empty() {
        format!("<button style=\"{style}\" class=\"btn\" type=\"button\">{text}</button>")
    } else {
        format!(
            "<a href=\"{}\" style=\"{style}\" class=\"btn\">{text}</a>",
            escape_html(&p.link)
        )
    }
}

fn render_divider(p: &DividerProperties) -> String {
    let style = build_style(&[
        ("border", "none".to_string()),
        ("border-top", format!("{}px solid {}", p.thickness, p.color)),
        ("margin-top", format!("{}px", p.margin)),
        ("margin-bottom", format!("{}px", p.margin)),
        ("width", p.width.to_css()),
    ]);
    format!("<hr style=\"{style}\" />")
}

fn render_grid(p: &GridProperties) -> String {
    let style = build_style(&[
        ("display", "grid".to_string()),
        ("grid-template-columns", format!("repeat({}, 1fr)", p.columns)),
        ("gap", format!("{}px", p.gap)),
        ("margin-bottom", "1.5rem".to_string()),
        ("margin-top", "1rem".to_string()),
    ]);
    let cell_padding = p.gap / 2.0;
    let mut html = format!("<div style=\"{style}\">");
    for item in &p.items {
        let content = if item.content.is_empty() {
            "Grid item".to_string()
        } else {
            escape_html(&item.content)
        };
        let _ = write!(
            html,
            "\n    <div style=\"padding: {cell_padding}px;\">\n        <div style=\"background: #f9f9f9; padding: 1rem; border-radius: 0.5rem;\">\n            {content}\n        </div>\n    </div>"
        );
    }
    html.push_str("\n</div>");
    html
}

const DOCUMENT_STYLE: &str = r"    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', sans-serif;
            line-height: 1.6;
            color: #333;
            background: #f9f9f9;
        }
        .blog-container {
            max-width: 800px;
            margin: 2rem auto;
            padding: 2rem;
            background: white;
            border-radius: 0.5rem;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        .blog-header {
            margin-bottom: 2rem;
            border-bottom: 2px solid #e5e5e5;
            padding-bottom: 1.5rem;
        }
        .blog-title {
            font-size: 2.5rem;
            font-weight: bold;
            margin-bottom: 0.5rem;
        }
        .blog-excerpt {
            font-size: 1.1rem;
            color: #666;
            font-style: italic;
        }
        .blog-content {
            line-height: 1.8;
        }
        .blog-content h1, .blog-content h2, .blog-content h3, .blog-content h4, .blog-content h5, .blog-content h6 {
            margin-top: 1.5rem;
            margin-bottom: 0.5rem;
        }
        .blog-content img, .blog-content video {
            max-width: 100%;
            height: auto;
        }
    </style>
";
