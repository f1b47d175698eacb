use tracing::warn;

use crate::domain::entities::entity::EntityRef;
use crate::error::QueryError;
use crate::usecase::ports::source::{DataSourceAdapter, QueryBuilder};

pub struct ExecutedPage {
    pub rows: Vec<EntityRef>,
    pub records_filtered: u64,
    pub records_total: u64,
    /// Set when `records_total` is 0 because the count query failed.
    pub total_degraded: bool,
}

/// Runs the compiled page query and the unfiltered total count. A failing
/// page query is returned as an error; a failing count reports 0.
pub fn execute(
    adapter: &dyn DataSourceAdapter,
    builder: &dyn QueryBuilder,
) -> Result<ExecutedPage, QueryError> {
    let page = builder.fetch_page()?;
    let total = adapter
        .create_query_builder(builder.root_alias())
        .and_then(|counter| counter.count_all());

    let (records_total, total_degraded) = match total {
        Ok(total) => (total, false),
        Err(err) => {
            warn!(error = %err, "total count query failed, reporting 0");
            (0, true)
        }
    };

    Ok(ExecutedPage {
        rows: page.rows,
        records_filtered: page.filtered,
        records_total,
        total_degraded,
    })
}
