//! Conditional stylesheet selection for environments without media-query
//! support.
//!
//! Stylesheet text is scanned for `@media` blocks keyed by `min-width` /
//! `max-width`. On every evaluation pass the [`Engine`] injects the blocks
//! whose conditions hold into the document head as `<style>` elements, and
//! notifies listeners of [`MediaQueryList`]s whose state changed.
//!
//! ```
//! use respond_lib::{create_dom_tree, Engine, SharedViewport};
//!
//! let viewport = SharedViewport::new(400.0);
//! let doc = create_dom_tree("<!DOCTYPE html><head><link rel=stylesheet href=a.css></head>");
//! let mut engine = Engine::new(doc, viewport.clone());
//!
//! engine
//!     .parse("@media (min-width: 600px) { .nav { display: flex } }", "a.css", None)
//!     .unwrap();
//! assert!(engine.injected().is_empty());
//!
//! let narrow = engine.match_media("(max-width: 599px)").unwrap();
//! assert!(narrow.matches());
//!
//! viewport.set_width(800.0);
//! engine.apply().unwrap();
//! assert_eq!(engine.injected().len(), 1);
//! assert!(!narrow.matches());
//! ```

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod query;
pub mod sheets;
pub mod throttle;
pub mod viewport;

pub mod parser {
    pub mod html;
    pub mod media;
}

pub mod style {
    pub mod evaluate;
    pub mod inject;
    pub mod rules;
}

pub use config::EngineConfig;
pub use dom::dom_tree::Document;
pub use engine::Engine;
pub use error::{ListenerError, RespondError};
pub use parser::html::create_dom_tree;
pub use query::{ListenerId, MediaQueryList};
pub use sheets::{FsSheetSource, SheetSource};
pub use throttle::{Clock, ManualClock, SystemClock};
pub use viewport::{SharedViewport, Viewport};
