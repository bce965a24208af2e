//! # Builder Core
//!
//! Document model and editing engine for the visual document builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               EditorSession                 │
//! │        dispatch(Action) -> events           │
//! ├─────────────────────────────────────────────┤
//! │  ElementStore    │  History                 │
//! │  - Elements      │  - Commands              │
//! │  - Z-order       │  - Undo / redo stacks    │
//! │  - Selection     │                          │
//! ├─────────────────────────────────────────────┤
//! │  DesignPanel     │  DocumentSnapshot        │
//! │  - Controls      │  - Metadata              │
//! │  - Live preview  │  - Portable JSON         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! No I/O happens here. Rendering and export live in `builder-renderer`,
//! persistence in `builder-autosave`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod element;
pub mod error;
pub mod event;
pub mod history;
pub mod panel;
pub mod properties;
pub mod session;
pub mod snapshot;
pub mod store;

pub use command::{Command, LayerDirection};
pub use element::{
    Dimension, Element, ElementId, ElementType, Position, Size, MIN_HEIGHT, MIN_WIDTH,
};
pub use error::{BuilderError, BuilderResult};
pub use event::{EditorEvent, NotificationLevel};
pub use history::{History, HistoryState, DEFAULT_MAX_LEVELS};
pub use panel::{DesignPanel, PANEL_KEYS};
pub use properties::{
    ButtonProperties, DividerProperties, GridItem, GridProperties, HeadingLevel,
    HeadingProperties, ImageProperties, Properties, PropertyValue, TextAlign, TextProperties,
    VideoProperties, VideoSource, MAX_GRID_COLUMNS,
};
pub use session::{Action, EditorSession};
pub use snapshot::{slugify, DocumentMetadata, DocumentSnapshot, SNAPSHOT_VERSION};
pub use store::{snap_to_grid, Alignment, ElementStore, DUPLICATE_OFFSET};

/// Builder core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
