//! Template engine for the hx edge request router.
//!
//! Templates use Handlebars syntax. Sources are read cache-first with a
//! network fallback; partials referenced with `{{> name}}` are fetched from the
//! partial directory, resolved depth-first and registered before the template
//! that includes them is compiled.
//!
//! Compiled renderers and loaded partials are memoized for the lifetime of the
//! [`TemplateEngine`]. Nothing is persisted, so a new engine starts cold.
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = TemplateEngine::new(scope, cache, network, "templates");
//! let renderer = engine.get_template("templates/task.html").await?;
//! let html = renderer.render(&serde_json::json!({ "task": "buy milk" }))?;
//! ```

mod engine;
mod error;
mod partials;

pub use engine::*;
pub use error::*;
pub use partials::*;
