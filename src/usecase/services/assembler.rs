use crate::domain::entities::response::{DataTableResponse, ResultRow};

pub fn assemble(
    data: Vec<ResultRow>,
    records_filtered: u64,
    records_total: u64,
    draw: i64,
) -> DataTableResponse {
    DataTableResponse {
        data,
        records_filtered,
        records_total,
        draw,
        error: None,
        total_degraded: false,
    }
}

/// Same envelope with an `error` entry merged in.
pub fn with_error(response: DataTableResponse, message: impl Into<String>) -> DataTableResponse {
    DataTableResponse {
        error: Some(message.into()),
        ..response
    }
}
