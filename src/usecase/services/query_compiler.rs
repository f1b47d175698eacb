use tracing::debug;

use crate::config::DataTableConfig;
use crate::domain::entities::path::{EntityPath, QualifiedColumn};
use crate::domain::entities::request::{
    Comparison, DataTableRequest, Filter, FilterScalar, FilterValue, OrderDirective,
};
use crate::usecase::ports::source::{CompareOp, Predicate, QueryBuilder, SourceColumn};

/// Mapped target that sorts by the root identifier.
pub const EDIT_COLUMN: &str = "edit";

/// Applies filters, ordering and paging of `request` to `builder`. Entries
/// that do not resolve are dropped.
pub fn compile(
    builder: &mut dyn QueryBuilder,
    request: &DataTableRequest,
    columns: &[SourceColumn],
    config: &DataTableConfig,
) {
    for filter in &request.filters {
        apply_filter(builder, filter, config);
    }
    for directive in &request.order {
        apply_order(builder, directive, request, columns, config);
    }
    builder.set_first_result(request.start);
    builder.set_max_results(request.length);
}

fn apply_filter(builder: &mut dyn QueryBuilder, filter: &Filter, config: &DataTableConfig) {
    let path = EntityPath::parse(&filter.column);
    if !builder.has_root_field(path.head()) {
        debug!(column = %filter.column, "skipping filter on unmapped column");
        return;
    }
    let column = path.qualify(builder.root_alias(), &config.identifier_field);
    let param = column.param_name();

    match &filter.value {
        FilterValue::Descriptor {
            value,
            comparison: Comparison::Like,
        } => {
            let needle = value.as_ref().map(FilterScalar::as_text).unwrap_or_default();
            compare(
                builder,
                column,
                CompareOp::Like,
                param,
                FilterScalar::Text(format!("%{needle}%")),
            );
        }
        FilterValue::Descriptor {
            value: None,
            comparison: Comparison::Not,
        } => builder.and_where(Predicate::IsNotNull(column)),
        // Strict inequality: the value is bound as is, without wildcards.
        FilterValue::Descriptor {
            value: Some(value),
            comparison: Comparison::Not,
        } => compare(builder, column, CompareOp::NotEq, param, value.clone()),
        FilterValue::Descriptor {
            value,
            comparison: Comparison::Equals,
        }
        | FilterValue::Scalar(value) => match value {
            Some(value) => compare(builder, column, CompareOp::Eq, param, value.clone()),
            None => builder.and_where(Predicate::IsNull(column)),
        },
    }
}

fn compare(
    builder: &mut dyn QueryBuilder,
    column: QualifiedColumn,
    op: CompareOp,
    param: String,
    value: FilterScalar,
) {
    builder.set_parameter(&param, value);
    builder.and_where(Predicate::Compare { column, op, param });
}

fn apply_order(
    builder: &mut dyn QueryBuilder,
    directive: &OrderDirective,
    request: &DataTableRequest,
    columns: &[SourceColumn],
    config: &DataTableConfig,
) {
    let Some(descriptor) = request.columns.get(directive.column) else {
        debug!(column = directive.column, "skipping order on unknown column index");
        return;
    };
    if !descriptor.orderable {
        debug!(column = %descriptor.data, "skipping order on non-orderable column");
        return;
    }
    let Some(source) = resolve_source_column(columns, &descriptor.data) else {
        debug!(column = %descriptor.data, "skipping order on undeclared column");
        return;
    };

    let root_alias = builder.root_alias().to_string();
    let target = if source.path == EDIT_COLUMN {
        QualifiedColumn::new(&root_alias, &config.identifier_field)
    } else {
        EntityPath::parse(&source.path).qualify(&root_alias, &config.identifier_field)
    };
    builder.add_order_by(target, directive.direction);
}

/// Finds the declared column a client `data` key refers to: by name, or by
/// position when the key is a bare index.
pub fn resolve_source_column<'a>(
    columns: &'a [SourceColumn],
    data: &str,
) -> Option<&'a SourceColumn> {
    columns
        .iter()
        .find(|column| column.name == data)
        .or_else(|| data.parse::<usize>().ok().and_then(|idx| columns.get(idx)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::entities::request::SortDirection;
    use crate::usecase::services::testing::RecordingQueryBuilder;

    fn source_columns() -> Vec<SourceColumn> {
        vec![
            SourceColumn::new("id", "entity.id"),
            SourceColumn::new("name", "entity.name"),
            SourceColumn::new("city", "profile.city"),
            SourceColumn::new("edit", "edit"),
        ]
    }

    fn compiled(params: serde_json::Value) -> RecordingQueryBuilder {
        let mut builder = RecordingQueryBuilder::new(&["id", "name", "deletedAt"]);
        let request = DataTableRequest::from_params(&params);
        compile(
            &mut builder,
            &request,
            &source_columns(),
            &DataTableConfig::default(),
        );
        builder
    }

    fn column(alias: &str, field: &str) -> QualifiedColumn {
        QualifiedColumn::new(alias, field)
    }

    #[test]
    fn scalar_filters_bind_equality_and_null_checks() {
        let builder = compiled(json!({"where": {"name": "Ada", "deletedAt": null}}));

        assert_eq!(
            builder.recorded.predicates,
            vec![
                Predicate::IsNull(column("entity", "deletedAt")),
                Predicate::Compare {
                    column: column("entity", "name"),
                    op: CompareOp::Eq,
                    param: "entity_name".to_string(),
                },
            ]
        );
        assert_eq!(
            builder.recorded.parameters,
            vec![("entity_name".to_string(), FilterScalar::Text("Ada".into()))]
        );
    }

    #[test]
    fn like_filter_wraps_value_in_wildcards() {
        let builder = compiled(json!({"where": {"name": {"value": "abc", "comparison": "like"}}}));

        assert_eq!(
            builder.recorded.predicates,
            vec![Predicate::Compare {
                column: column("entity", "name"),
                op: CompareOp::Like,
                param: "entity_name".to_string(),
            }]
        );
        assert_eq!(
            builder.recorded.parameters,
            vec![("entity_name".to_string(), FilterScalar::Text("%abc%".into()))]
        );
    }

    #[test]
    fn not_null_descriptor_becomes_is_not_null() {
        let builder =
            compiled(json!({"where": {"deletedAt": {"value": null, "comparison": "not"}}}));

        assert_eq!(
            builder.recorded.predicates,
            vec![Predicate::IsNotNull(column("entity", "deletedAt"))]
        );
        assert!(builder.recorded.parameters.is_empty());
    }

    #[test]
    fn not_descriptor_binds_strict_inequality_without_wildcards() {
        let builder = compiled(json!({"where": {"name": {"value": "Ada", "comparison": "not"}}}));

        assert_eq!(
            builder.recorded.predicates,
            vec![Predicate::Compare {
                column: column("entity", "name"),
                op: CompareOp::NotEq,
                param: "entity_name".to_string(),
            }]
        );
        assert_eq!(
            builder.recorded.parameters,
            vec![("entity_name".to_string(), FilterScalar::Text("Ada".into()))]
        );
    }

    #[test]
    fn unknown_comparison_falls_back_to_equality() {
        let builder = compiled(json!({"where": {"name": {"value": "Ada", "comparison": "eq"}}}));

        assert!(matches!(
            builder.recorded.predicates.as_slice(),
            [Predicate::Compare { op: CompareOp::Eq, .. }]
        ));
    }

    #[test]
    fn unmapped_and_incomplete_filters_are_ignored() {
        let builder = compiled(json!({"where": {
            "profile.city": "Berlin",
            "nope": "x",
            "name": {"comparison": "like"},
        }}));

        assert!(builder.recorded.predicates.is_empty());
        assert!(builder.recorded.parameters.is_empty());
    }

    #[test]
    fn order_applies_only_valid_orderable_directives_in_sequence() {
        let builder = compiled(json!({
            "columns": [
                {"data": "id", "orderable": true},
                {"data": "name", "orderable": false},
                {"data": "city", "orderable": true},
                {"data": "unknown", "orderable": true},
            ],
            "order": [
                {"column": 2, "dir": "desc"},
                {"column": 1, "dir": "asc"},
                {"column": 3, "dir": "asc"},
                {"column": 9, "dir": "asc"},
                {"column": 0, "dir": "asc"},
            ],
        }));

        assert_eq!(
            builder.recorded.orders,
            vec![
                (column("profile", "city"), SortDirection::Desc),
                (column("entity", "id"), SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn edit_target_orders_by_root_identifier() {
        let builder = compiled(json!({
            "columns": [{"data": "edit", "orderable": true}],
            "order": [{"column": 0, "dir": "desc"}],
        }));

        assert_eq!(
            builder.recorded.orders,
            vec![(column("entity", "id"), SortDirection::Desc)]
        );
    }

    #[test]
    fn numeric_data_key_resolves_by_position() {
        let builder = compiled(json!({
            "columns": [{"data": 1, "orderable": true}],
            "order": [{"column": 0, "dir": "asc"}],
        }));

        assert_eq!(
            builder.recorded.orders,
            vec![(column("entity", "name"), SortDirection::Asc)]
        );
    }

    #[test]
    fn paging_is_forwarded() {
        let builder = compiled(json!({"start": 30, "length": 15}));
        assert_eq!(builder.recorded.first_result, 30);
        assert_eq!(builder.recorded.max_results, Some(15));

        let unbounded = compiled(json!({"length": -1}));
        assert_eq!(unbounded.recorded.max_results, None);
    }
}
