use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TemplateError;
use crate::usecase::ports::render::{RenderContext, TemplateEngine};

/// Engine without any templates; every column falls through to operations
/// and accessors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateEngine for NoTemplates {
    fn exists(&self, _template: &str) -> bool {
        false
    }

    fn render(
        &self,
        template: &str,
        _context: &RenderContext<'_>,
    ) -> Result<String, TemplateError> {
        Err(TemplateError::NotFound(template.to_string()))
    }
}

type RenderFn = Arc<dyn Fn(&RenderContext<'_>) -> Result<String, TemplateError> + Send + Sync>;

/// Templates registered as render functions under their full id.
#[derive(Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, RenderFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, template: impl Into<String>, render: F) -> Self
    where
        F: Fn(&RenderContext<'_>) -> Result<String, TemplateError> + Send + Sync + 'static,
    {
        self.templates.insert(template.into(), Arc::new(render));
        self
    }
}

impl TemplateEngine for TemplateRegistry {
    fn exists(&self, template: &str) -> bool {
        self.templates.contains_key(template)
    }

    fn render(&self, template: &str, context: &RenderContext<'_>) -> Result<String, TemplateError> {
        let render = self
            .templates
            .get(template)
            .ok_or_else(|| TemplateError::NotFound(template.to_string()))?;
        render(context)
    }
}
