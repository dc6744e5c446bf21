//! View rendering
//!
//! The templating layer is a collaborator: given a view name and a map of
//! named values it produces a body. [`JsonRenderer`] is the built-in
//! implementation; hosts with real templates implement [`ViewRenderer`].

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type for rendering
pub type RenderResult<T> = Result<T, RenderError>;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// A value could not be converted for the view
    #[error("Failed to serialize view value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The renderer has no template with this name
    #[error("Unknown view: {0}")]
    UnknownView(String),
}

/// Named values handed to a view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewValues {
    values: Map<String, Value>,
}

impl ViewValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, serializing it eagerly
    pub fn insert<T: Serialize>(&mut self, name: &str, value: &T) -> RenderResult<()> {
        self.values.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with<T: Serialize>(mut self, name: &str, value: &T) -> RenderResult<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// A rendered body and its media type
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub view: String,
    pub content_type: &'static str,
    pub body: String,
}

/// Templating collaborator
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &str, values: &ViewValues) -> RenderResult<RenderedView>;
}

/// Renders every view as a JSON object `{"view": name, ...values}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ViewRenderer for JsonRenderer {
    fn render(&self, view: &str, values: &ViewValues) -> RenderResult<RenderedView> {
        if view.trim().is_empty() {
            return Err(RenderError::UnknownView(view.to_string()));
        }
        let mut document = Map::new();
        document.insert("view".to_string(), Value::String(view.to_string()));
        for (name, value) in values.as_map() {
            document.insert(name.clone(), value.clone());
        }
        let document = Value::Object(document);
        let body = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(RenderedView {
            view: view.to_string(),
            content_type: "application/json",
            body,
        })
    }
}
