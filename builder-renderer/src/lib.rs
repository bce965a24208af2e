//! # Builder Renderer
//!
//! Projects an editor session onto a canvas and exports documents.
//!
//! ## Outputs
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                EditorSession                │
//! ├──────────────────────┬──────────────────────┤
//! │ CanvasView           │ ExportEngine         │
//! │ - Visual tree        │ - HTML fragment      │
//! │ - Grid underlay      │ - Full document      │
//! │ - Click / drag / drop│ - JSON snapshot      │
//! └──────────────────────┴──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod error;
pub mod export;

pub use canvas::{Affordance, CanvasConfig, CanvasView, GridUnderlay, VisualNode, VisualTree};
pub use error::{RenderError, RenderResult};
pub use export::{escape_html, DocumentSummary, ExportConfig, ExportEngine};
