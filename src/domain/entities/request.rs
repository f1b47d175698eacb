use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub data: String,
    pub orderable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDirective {
    pub column: usize,
    pub direction: SortDirection,
}

/// Scalar a filter can bind.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FilterScalar {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(FilterScalar::Bool(*value)),
            Value::Number(number) => number
                .as_i64()
                .map(FilterScalar::Int)
                .or_else(|| number.as_f64().map(FilterScalar::Float)),
            Value::String(value) => Some(FilterScalar::Text(value.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Text form used when the scalar is wrapped into a pattern.
    pub fn as_text(&self) -> String {
        match self {
            FilterScalar::Bool(true) => "1".to_string(),
            FilterScalar::Bool(false) => String::new(),
            FilterScalar::Int(value) => value.to_string(),
            FilterScalar::Float(value) => value.to_string(),
            FilterScalar::Text(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Like,
    Not,
    /// Any other comparison name falls back to the scalar rule.
    Equals,
}

impl Comparison {
    fn parse(raw: &str) -> Self {
        match raw {
            "like" => Comparison::Like,
            "not" => Comparison::Not,
            _ => Comparison::Equals,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// `None` means the client sent `null`.
    Scalar(Option<FilterScalar>),
    Descriptor {
        value: Option<FilterScalar>,
        comparison: Comparison,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: FilterValue,
}

/// One parsed request. Entries that cannot be understood are dropped while
/// parsing; nothing here fails.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTableRequest {
    pub draw: i64,
    pub start: u64,
    /// `None` when the client asked for every row (`length <= 0`).
    pub length: Option<u64>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderDirective>,
    pub columns: Vec<ColumnDescriptor>,
}

impl DataTableRequest {
    pub fn from_params(params: &Value) -> Self {
        let empty = Map::new();
        let params = params.as_object().unwrap_or(&empty);

        let length = params.get("length").and_then(as_int).unwrap_or(0);

        Self {
            draw: params.get("draw").and_then(as_int).unwrap_or(0),
            start: params.get("start").and_then(as_int).unwrap_or(0).max(0) as u64,
            length: (length > 0).then_some(length as u64),
            filters: params.get("where").map(parse_filters).unwrap_or_default(),
            order: params.get("order").map(parse_order).unwrap_or_default(),
            columns: params.get("columns").map(parse_columns).unwrap_or_default(),
        }
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(value) => *value,
        Value::String(text) => matches!(text.trim(), "true" | "1"),
        Value::Number(number) => number.as_i64().is_some_and(|value| value != 0),
        _ => false,
    }
}

/// Arrays and objects keyed by position (`{"0": ..., "1": ...}`) both count
/// as lists, the way form-encoded bags arrive.
fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let mut entries = map
                .iter()
                .filter_map(|(key, item)| key.parse::<usize>().ok().map(|idx| (idx, item)))
                .collect::<Vec<_>>();
            entries.sort_by_key(|(idx, _)| *idx);
            entries.into_iter().map(|(_, item)| item).collect()
        }
        _ => Vec::new(),
    }
}

fn parse_filters(value: &Value) -> Vec<Filter> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(column, value)| {
            parse_filter_value(value).map(|value| Filter {
                column: column.clone(),
                value,
            })
        })
        .collect()
}

fn parse_filter_value(value: &Value) -> Option<FilterValue> {
    match value {
        Value::Object(descriptor) => {
            let comparison = descriptor
                .get("comparison")
                .or_else(|| descriptor.get("comparision"))
                .and_then(Value::as_str)?;
            let raw = descriptor.get("value")?;
            let value = match raw {
                Value::Null => None,
                other => Some(FilterScalar::from_json(other)?),
            };
            Some(FilterValue::Descriptor {
                value,
                comparison: Comparison::parse(comparison),
            })
        }
        Value::Array(_) => None,
        Value::Null => Some(FilterValue::Scalar(None)),
        scalar => FilterScalar::from_json(scalar).map(|value| FilterValue::Scalar(Some(value))),
    }
}

fn parse_order(value: &Value) -> Vec<OrderDirective> {
    as_list(value)
        .into_iter()
        .filter_map(|entry| {
            let column = entry.get("column").and_then(as_int)?;
            let direction = entry
                .get("dir")
                .and_then(Value::as_str)
                .and_then(SortDirection::parse)?;
            Some(OrderDirective {
                column: usize::try_from(column).ok()?,
                direction,
            })
        })
        .collect()
}

fn parse_columns(value: &Value) -> Vec<ColumnDescriptor> {
    as_list(value)
        .into_iter()
        .map(|entry| ColumnDescriptor {
            data: match entry.get("data") {
                Some(Value::String(data)) => data.clone(),
                Some(Value::Number(number)) => number.to_string(),
                _ => String::new(),
            },
            orderable: entry.get("orderable").is_some_and(as_bool),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_params_reads_numeric_strings_and_defaults() {
        let request = DataTableRequest::from_params(&json!({
            "draw": "7",
            "start": "20",
            "length": 10,
        }));

        assert_eq!(request.draw, 7);
        assert_eq!(request.start, 20);
        assert_eq!(request.length, Some(10));
        assert!(request.filters.is_empty());

        let empty = DataTableRequest::from_params(&Value::Null);
        assert_eq!(empty, DataTableRequest::default());
    }

    #[test]
    fn non_positive_length_means_unbounded() {
        let request = DataTableRequest::from_params(&json!({"length": -1, "start": -5}));
        assert_eq!(request.length, None);
        assert_eq!(request.start, 0);
    }

    #[test]
    fn filters_parse_scalars_nulls_and_descriptors() {
        let request = DataTableRequest::from_params(&json!({
            "where": {
                "name": "abc",
                "deletedAt": null,
                "city": {"value": "ber", "comparison": "like"},
                "legacy": {"value": null, "comparision": "not"},
                "missingValue": {"comparison": "like"},
                "missingComparison": {"value": "x"},
                "list": [1, 2],
            }
        }));

        let by_column = |name: &str| {
            request
                .filters
                .iter()
                .find(|filter| filter.column == name)
                .map(|filter| filter.value.clone())
        };

        assert_eq!(
            by_column("name"),
            Some(FilterValue::Scalar(Some(FilterScalar::Text("abc".into()))))
        );
        assert_eq!(by_column("deletedAt"), Some(FilterValue::Scalar(None)));
        assert_eq!(
            by_column("city"),
            Some(FilterValue::Descriptor {
                value: Some(FilterScalar::Text("ber".into())),
                comparison: Comparison::Like,
            })
        );
        assert_eq!(
            by_column("legacy"),
            Some(FilterValue::Descriptor {
                value: None,
                comparison: Comparison::Not,
            })
        );
        assert_eq!(by_column("missingValue"), None);
        assert_eq!(by_column("missingComparison"), None);
        assert_eq!(by_column("list"), None);
    }

    #[test]
    fn order_and_columns_accept_indexed_objects() {
        let request = DataTableRequest::from_params(&json!({
            "order": {
                "1": {"column": "0", "dir": "DESC"},
                "0": {"column": 2, "dir": "asc"},
                "2": {"column": 1, "dir": "sideways"},
                "3": {"dir": "asc"},
            },
            "columns": [
                {"data": "name", "orderable": "true"},
                {"data": 1, "orderable": false},
                {"data": "edit"},
            ],
        }));

        assert_eq!(
            request.order,
            vec![
                OrderDirective {
                    column: 2,
                    direction: SortDirection::Asc,
                },
                OrderDirective {
                    column: 0,
                    direction: SortDirection::Desc,
                },
            ]
        );
        assert_eq!(
            request.columns,
            vec![
                ColumnDescriptor {
                    data: "name".into(),
                    orderable: true,
                },
                ColumnDescriptor {
                    data: "1".into(),
                    orderable: false,
                },
                ColumnDescriptor {
                    data: "edit".into(),
                    orderable: false,
                },
            ]
        );
    }
}
