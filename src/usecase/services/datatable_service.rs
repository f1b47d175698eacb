use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::config::DataTableConfig;
use crate::domain::entities::request::DataTableRequest;
use crate::domain::entities::response::{DataTableResponse, ResultRow};
use crate::error::DataTableError;
use crate::usecase::ports::render::{TemplateEngine, Translator};
use crate::usecase::ports::source::{DataSourceAdapter, SourceColumn};
use crate::usecase::services::assembler::{assemble, with_error};
use crate::usecase::services::cell_formatter::CellFormatter;
use crate::usecase::services::executor::execute;
use crate::usecase::services::query_compiler::compile;
use crate::usecase::services::row_expander::expand;

/// State of one request cycle. Every call builds its own, so a service can
/// be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request: DataTableRequest,
    pub data: Vec<ResultRow>,
    pub records_filtered: u64,
    pub records_total: u64,
    pub total_degraded: bool,
}

impl RequestContext {
    pub fn new(request: DataTableRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    pub fn into_response(self) -> DataTableResponse {
        DataTableResponse {
            total_degraded: self.total_degraded,
            ..assemble(
                self.data,
                self.records_filtered,
                self.records_total,
                self.request.draw,
            )
        }
    }
}

pub struct DataTableService {
    adapter: Arc<dyn DataSourceAdapter>,
    templates: Arc<dyn TemplateEngine>,
    translator: Arc<dyn Translator>,
    config: DataTableConfig,
}

impl DataTableService {
    pub fn new(
        adapter: Arc<dyn DataSourceAdapter>,
        templates: Arc<dyn TemplateEngine>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            adapter,
            templates,
            translator,
            config: DataTableConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DataTableConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DataTableConfig {
        &self.config
    }

    pub fn columns(&self) -> &[SourceColumn] {
        self.adapter.columns()
    }

    /// Parses the parameter bag and runs one request cycle.
    pub fn get(&self, params: &Value) -> Result<DataTableResponse, DataTableError> {
        let mut context = RequestContext::new(DataTableRequest::from_params(params));
        self.run(&mut context)?;
        Ok(context.into_response())
    }

    /// Like [`get`](Self::get), but a hard failure comes back as an envelope
    /// carrying `error`, the echoed draw and the counts computed so far.
    pub fn respond(&self, params: &Value) -> DataTableResponse {
        let mut context = RequestContext::new(DataTableRequest::from_params(params));
        match self.run(&mut context) {
            Ok(()) => context.into_response(),
            Err(err) => {
                error!(error = %err, draw = context.request.draw, "datatable request failed");
                context.data.clear();
                with_error(context.into_response(), err.to_string())
            }
        }
    }

    pub fn run(&self, context: &mut RequestContext) -> Result<(), DataTableError> {
        let mut builder = self.adapter.create_query_builder(&self.config.root_alias)?;
        compile(
            builder.as_mut(),
            &context.request,
            self.adapter.columns(),
            &self.config,
        );

        let page = execute(self.adapter.as_ref(), builder.as_ref())?;
        context.records_total = page.records_total;
        context.records_filtered = page.records_filtered;
        context.total_degraded = page.total_degraded;
        debug!(
            rows = page.rows.len(),
            filtered = page.records_filtered,
            total = page.records_total,
            "datatable page fetched"
        );

        let formatter = CellFormatter::new(
            self.templates.as_ref(),
            self.translator.as_ref(),
            self.adapter.templates_path(),
            &self.config,
        );
        for row in expand(page.rows) {
            let formatted = formatter.format_row(&row, self.adapter.columns())?;
            context.data.push(formatted);
        }
        Ok(())
    }
}
