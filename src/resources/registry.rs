//! Resource registry: static URIs and URI templates.

use crate::error::{ProtocolError, Result};
use crate::protocol::{
    HandlerContext, ReadResourceResult, Resource, ResourceContent, ResourceTemplate,
};
use crate::resources::template::UriTemplate;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A readable resource. `C` is the lifespan context the resource reads from.
#[async_trait]
pub trait ResourceHandler<C>: Send + Sync {
    /// URI or URI template, e.g. `greeting://{name}`.
    fn uri_template(&self) -> &str;
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn mime_type(&self) -> &str {
        "text/plain"
    }

    /// Produce the text of the resource for the placeholder values in `params`.
    async fn read(&self, ctx: &HandlerContext<C>, params: HashMap<String, String>)
    -> Result<String>;
}

struct Entry<C> {
    template: UriTemplate,
    handler: Arc<dyn ResourceHandler<C>>,
}

pub struct ResourceRegistry<C> {
    entries: RwLock<Vec<Entry<C>>>,
}

impl<C: Send + Sync + 'static> ResourceRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a resource; fails if its URI template does not compile.
    pub fn register<R: ResourceHandler<C> + 'static>(&self, resource: R) -> Result<()> {
        let template = UriTemplate::parse(resource.uri_template())?;
        debug!("Registering resource: {}", template.as_str());
        self.entries.write().push(Entry {
            template,
            handler: Arc::new(resource),
        });
        Ok(())
    }

    /// Resources with a fixed URI.
    pub fn list(&self) -> Vec<Resource> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.template.is_static())
            .map(|e| Resource {
                uri: e.template.as_str().to_string(),
                name: e.handler.name().to_string(),
                description: e.handler.description().map(str::to_string),
                mime_type: Some(e.handler.mime_type().to_string()),
            })
            .collect()
    }

    /// Resources addressed through placeholders.
    pub fn list_templates(&self) -> Vec<ResourceTemplate> {
        self.entries
            .read()
            .iter()
            .filter(|e| !e.template.is_static())
            .map(|e| ResourceTemplate {
                uri_template: e.template.as_str().to_string(),
                name: e.handler.name().to_string(),
                description: e.handler.description().map(str::to_string),
                mime_type: Some(e.handler.mime_type().to_string()),
            })
            .collect()
    }

    /// Read `uri` through the first registered template that matches it.
    pub async fn read(&self, ctx: &HandlerContext<C>, uri: &str) -> Result<ReadResourceResult> {
        let matched = self.entries.read().iter().find_map(|e| {
            e.template
                .matches(uri)
                .map(|params| (Arc::clone(&e.handler), params))
        });
        let (handler, params) =
            matched.ok_or_else(|| ProtocolError::ResourceNotFound(uri.to_string()))?;

        let text = handler.read(ctx, params).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContent {
                uri: uri.to_string(),
                mime_type: Some(handler.mime_type().to_string()),
                text: Some(text),
                blob: None,
            }],
        })
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<C: Send + Sync + 'static> Default for ResourceRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
