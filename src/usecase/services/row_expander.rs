use crate::domain::entities::entity::EntityRef;

/// Flattens one level of children: each row is followed by its own children.
/// Children of children stay collapsed.
pub fn expand(rows: Vec<EntityRef>) -> Vec<EntityRef> {
    let mut expanded = Vec::with_capacity(rows.len());
    for row in rows {
        let children = row.children().unwrap_or_default();
        expanded.push(row);
        expanded.extend(children);
    }
    expanded
}
