//! In-memory collaborators shared by the service tests.

use std::sync::{Arc, Mutex, OnceLock};

use chrono::NaiveDate;

use crate::domain::entities::entity::{Capabilities, Entity, EntityRef, FieldValue};
use crate::domain::entities::path::QualifiedColumn;
use crate::domain::entities::request::{FilterScalar, SortDirection};
use crate::error::QueryError;
use crate::usecase::ports::source::{
    DataSourceAdapter, Page, Predicate, QueryBuilder, SourceColumn,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorded {
    pub predicates: Vec<Predicate>,
    pub parameters: Vec<(String, FilterScalar)>,
    pub orders: Vec<(QualifiedColumn, SortDirection)>,
    pub first_result: u64,
    pub max_results: Option<u64>,
}

/// Records every mutation and serves a canned page.
pub struct RecordingQueryBuilder {
    pub fields: Vec<&'static str>,
    pub recorded: Recorded,
    pub rows: Vec<EntityRef>,
    pub filtered: u64,
    pub total: Result<u64, QueryError>,
    pub fail_fetch: bool,
    pub sink: Option<Arc<Mutex<Recorded>>>,
}

impl RecordingQueryBuilder {
    pub fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
            recorded: Recorded::default(),
            rows: Vec::new(),
            filtered: 0,
            total: Ok(0),
            fail_fetch: false,
            sink: None,
        }
    }
}

impl QueryBuilder for RecordingQueryBuilder {
    fn root_alias(&self) -> &str {
        "entity"
    }

    fn has_root_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    fn and_where(&mut self, predicate: Predicate) {
        self.recorded.predicates.push(predicate);
    }

    fn set_parameter(&mut self, name: &str, value: FilterScalar) {
        self.recorded.parameters.push((name.to_string(), value));
    }

    fn add_order_by(&mut self, column: QualifiedColumn, direction: SortDirection) {
        self.recorded.orders.push((column, direction));
    }

    fn set_first_result(&mut self, offset: u64) {
        self.recorded.first_result = offset;
    }

    fn set_max_results(&mut self, limit: Option<u64>) {
        self.recorded.max_results = limit;
    }

    fn fetch_page(&self) -> Result<Page, QueryError> {
        if let Some(sink) = &self.sink {
            if let Ok(mut recorded) = sink.lock() {
                *recorded = self.recorded.clone();
            }
        }
        if self.fail_fetch {
            return Err(QueryError::Message("no such table: users".to_string()));
        }
        Ok(Page {
            rows: self.rows.clone(),
            filtered: self.filtered,
        })
    }

    fn count_all(&self) -> Result<u64, QueryError> {
        self.total.clone()
    }
}

/// Adapter handing out [`RecordingQueryBuilder`]s configured by a closure.
pub struct FakeAdapter {
    pub columns: Vec<SourceColumn>,
    pub templates_path: String,
    pub make: Box<dyn Fn() -> RecordingQueryBuilder + Send + Sync>,
}

impl DataSourceAdapter for FakeAdapter {
    fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    fn create_query_builder(&self, _alias: &str) -> Result<Box<dyn QueryBuilder>, QueryError> {
        Ok(Box::new((self.make)()))
    }

    fn templates_path(&self) -> &str {
        &self.templates_path
    }
}

pub struct Profile {
    pub city: Option<String>,
    pub created_at: Option<NaiveDate>,
}

impl Entity for Profile {
    fn capabilities() -> &'static Capabilities<Self> {
        static CAPABILITIES: OnceLock<Capabilities<Profile>> = OnceLock::new();
        CAPABILITIES.get_or_init(|| {
            Capabilities::<Self>::new()
                .accessor("city", |profile| profile.city.clone().into())
                .accessor("createdAt", |profile| profile.created_at.into())
        })
    }
}

pub struct User {
    pub id: i64,
    pub name: String,
    pub profile: Option<Arc<Profile>>,
    pub children: Vec<EntityRef>,
}

impl User {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            profile: None,
            children: Vec::new(),
        }
    }

    pub fn with_profile(mut self, city: Option<&str>, created_at: Option<NaiveDate>) -> Self {
        self.profile = Some(Arc::new(Profile {
            city: city.map(str::to_string),
            created_at,
        }));
        self
    }

    pub fn with_children(mut self, children: Vec<EntityRef>) -> Self {
        self.children = children;
        self
    }

    pub fn into_ref(self) -> EntityRef {
        Arc::new(self)
    }
}

impl Entity for User {
    fn capabilities() -> &'static Capabilities<Self> {
        static CAPABILITIES: OnceLock<Capabilities<User>> = OnceLock::new();
        CAPABILITIES.get_or_init(|| {
            Capabilities::<Self>::new()
                .accessor("id", |user| user.id.into())
                .accessor("name", |user| user.name.clone().into())
                .accessor("profile", |user| match &user.profile {
                    Some(profile) => FieldValue::Entity(profile.clone()),
                    None => FieldValue::Null,
                })
                .method("label", |user| format!("#{} {}", user.id, user.name).into())
                .children(|user| user.children.clone())
        })
    }
}
