use serde_json::Value;

use crate::config::DataTableConfig;
use crate::domain::entities::entity::{EntityRef, FieldValue};
use crate::domain::entities::path::EntityPath;
use crate::domain::entities::response::ResultRow;
use crate::error::DataTableError;
use crate::usecase::ports::render::{RenderContext, TemplateEngine, Translator};
use crate::usecase::ports::source::SourceColumn;

/// Renders cells by trying, for the head of the column path, a template, then
/// a registered operation, then an accessor.
pub struct CellFormatter<'a> {
    templates: &'a dyn TemplateEngine,
    translator: &'a dyn Translator,
    templates_path: &'a str,
    config: &'a DataTableConfig,
}

impl<'a> CellFormatter<'a> {
    pub fn new(
        templates: &'a dyn TemplateEngine,
        translator: &'a dyn Translator,
        templates_path: &'a str,
        config: &'a DataTableConfig,
    ) -> Self {
        Self {
            templates,
            translator,
            templates_path,
            config,
        }
    }

    /// One cell per declared column. Paths may be written qualified with the
    /// root alias (`entity.name`); the alias is dropped before rendering.
    pub fn format_row(
        &self,
        element: &EntityRef,
        columns: &[SourceColumn],
    ) -> Result<ResultRow, DataTableError> {
        columns
            .iter()
            .map(|column| {
                let path = EntityPath::parse(&column.path).relative_to(&self.config.root_alias);
                self.format_cell(element, &path)
            })
            .collect()
    }

    pub fn format_cell(
        &self,
        element: &EntityRef,
        path: &EntityPath,
    ) -> Result<Value, DataTableError> {
        let head = path.head();

        let template = format!(
            "{}{}{}",
            self.templates_path, head, self.config.template_suffix
        );
        if self.templates.exists(&template) {
            let rendered = self
                .templates
                .render(&template, &RenderContext { element })?;
            return Ok(Value::String(rendered));
        }

        if let Some(value) = element.invoke(head) {
            return Ok(value.to_json());
        }

        let Some(value) = element.get(head) else {
            return Err(self.no_render_info(head));
        };

        let Some(rest) = path.tail() else {
            return Ok(self.leaf(&value));
        };
        if value.is_falsy() {
            return Ok(Value::String(String::new()));
        }
        match value {
            FieldValue::Entity(nested) => self.format_cell(&nested, &rest),
            _ => Err(self.no_render_info(rest.head())),
        }
    }

    fn leaf(&self, value: &FieldValue) -> Value {
        match value {
            FieldValue::Date(date) => {
                Value::String(date.format(&self.config.date_format).to_string())
            }
            FieldValue::DateTime(datetime) => {
                Value::String(datetime.format(&self.config.date_format).to_string())
            }
            other => other.to_json(),
        }
    }

    fn no_render_info(&self, column: &str) -> DataTableError {
        DataTableError::NoRenderInfo {
            message: self.translator.translate(&self.config.error_message_key),
            column: column.to_string(),
        }
    }
}
