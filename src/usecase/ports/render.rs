use crate::domain::entities::entity::EntityRef;
use crate::error::TemplateError;

/// What a cell template sees: the row being rendered.
pub struct RenderContext<'a> {
    pub element: &'a EntityRef,
}

pub trait TemplateEngine: Send + Sync {
    fn exists(&self, template: &str) -> bool;

    fn render(&self, template: &str, context: &RenderContext<'_>) -> Result<String, TemplateError>;
}

pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}
