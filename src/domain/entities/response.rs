use serde::Serialize;
use serde_json::Value;

/// Rendered cells of one row, in declared column order.
pub type ResultRow = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTableResponse {
    pub data: Vec<ResultRow>,
    pub records_filtered: u64,
    pub records_total: u64,
    pub draw: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `records_total` is 0 because the total count query failed, not because
    /// the source is empty. Not part of the wire format.
    #[serde(skip)]
    pub total_degraded: bool,
}
