use std::fmt;

/// Literal column name that stands for the root identifier.
pub const SELECT_COLUMN: &str = "select";

/// A dot-delimited field path such as `profile.createdAt`, parsed once into
/// its segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityPath {
    segments: Vec<String>,
}

impl EntityPath {
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw.split('.').map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment; a parsed path always has at least one.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// The path below the head, or `None` when the head is the leaf.
    pub fn tail(&self) -> Option<EntityPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[1..].to_vec(),
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.segments.len() == 1
    }

    /// Drops a leading `alias` segment so `entity.name` reads as `name` from
    /// the row itself.
    pub fn relative_to(self, alias: &str) -> EntityPath {
        if self.segments.len() > 1 && self.segments[0] == alias {
            return Self {
                segments: self.segments[1..].to_vec(),
            };
        }
        self
    }

    /// Resolves the path to an alias-qualified column. The last segment is the
    /// field, the one before it the alias; a single segment is qualified with
    /// `root_alias`. `select` maps to `identifier`.
    pub fn qualify(&self, root_alias: &str, identifier: &str) -> QualifiedColumn {
        if self.segments.len() == 1 && self.segments[0] == SELECT_COLUMN {
            return QualifiedColumn::new(root_alias, identifier);
        }
        let field = &self.segments[self.segments.len() - 1];
        match self.segments.len() {
            1 => QualifiedColumn::new(root_alias, field),
            len => QualifiedColumn::new(&self.segments[len - 2], field),
        }
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedColumn {
    pub alias: String,
    pub field: String,
}

impl QualifiedColumn {
    pub fn new(alias: &str, field: &str) -> Self {
        Self {
            alias: alias.to_string(),
            field: field.to_string(),
        }
    }

    /// Bind parameter name unique to this column, e.g. `profile_city`.
    pub fn param_name(&self) -> String {
        format!("{}_{}", self.alias, self.field)
    }
}

impl fmt::Display for QualifiedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.field)
    }
}
