//! Query shaping: turns untyped request parameters into scoped, filtered,
//! searched and paginated dataset views.
//!
//! Filter specs are resolved against a closed association registry when the
//! component is configured, so an unknown `assoc.column` path fails at
//! startup instead of during a request.

pub mod users;

use std::collections::BTreeMap;

use sea_orm::sea_query::Condition;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Select};
use serde::Deserialize;
use uuid::Uuid;

use quarterdeck_core::sea_ext::IlikeContains;
use quarterdeck_domain::pagination::PageRequest;

use crate::error::AdminServiceError;

// ── Request parameters ───────────────────────────────────────────────────────

/// Untyped request parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    pub values: BTreeMap<String, String>,
}

impl QueryParams {
    /// Parse a raw query string. Unparseable input degrades to no parameters
    /// rather than failing the request.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let values = raw
            .and_then(|r| serde_qs::from_str(r).ok())
            .unwrap_or_default();
        Self { values }
    }

    /// A parameter counts as present only when non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Free-text search term.
    pub fn q(&self) -> Option<&str> {
        self.get("q")
    }

    /// `page`/`count` with defaults 1/10. Malformed numerics coerce to 0 and
    /// are rejected later by [`PageRequest::validated`].
    pub fn page_request(&self) -> PageRequest {
        let parse = |name: &str, default: u32| match self.values.get(name) {
            Some(v) => v.trim().parse().unwrap_or(0),
            None => default,
        };
        PageRequest {
            count: parse("count", 10),
            page: parse("page", 1),
        }
    }
}

// ── Filter specs ─────────────────────────────────────────────────────────────

/// Value coercion applied to the raw parameter before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Use the raw string as-is.
    Text,
    /// Parse as integer; malformed input coerces to 0.
    Int,
    /// Lowercase the raw string.
    Lowercase,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
}

impl Modifier {
    pub fn coerce(self, raw: &str) -> FilterValue {
        match self {
            Self::Text => FilterValue::Text(raw.to_owned()),
            Self::Int => FilterValue::Int(raw.parse().unwrap_or(0)),
            Self::Lowercase => FilterValue::Text(raw.to_lowercase()),
        }
    }
}

impl From<FilterValue> for sea_orm::Value {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => s.into(),
            FilterValue::Int(i) => i.into(),
        }
    }
}

/// One-hop association a filter can traverse. Implemented by a closed enum
/// per component, which is what makes unknown paths a configuration-time
/// error.
#[allow(async_fn_in_trait)]
pub trait Association: Copy + Send + Sync + 'static {
    type Base: EntityTrait;

    fn parse(name: &str) -> Option<Self>;

    fn supports_column(self, column: &str) -> bool;

    /// Look up the associated row by `column = value`, returning the key the
    /// edge condition needs. `None` means no row matched.
    async fn lookup(
        self,
        db: &DatabaseConnection,
        column: &'static str,
        value: &FilterValue,
    ) -> Result<Option<Uuid>, AdminServiceError>;

    /// Condition over the base entity selecting rows attached to `key`.
    /// `None` must yield a queryable-but-always-false condition, preserving
    /// "no match" as an empty result rather than an error.
    fn edge_condition(self, key: Option<Uuid>) -> Condition;
}

#[derive(Debug, Clone)]
pub enum FilterTarget<A: Association> {
    Column(<A::Base as EntityTrait>::Column),
    Association { assoc: A, column: &'static str },
}

/// Declarative mapping from a request parameter to a dataset predicate.
#[derive(Debug, Clone)]
pub struct FilterSpec<A: Association> {
    pub name: &'static str,
    pub target: FilterTarget<A>,
    pub modifier: Modifier,
}

impl<A: Association> FilterSpec<A> {
    pub fn column(name: &'static str, column: <A::Base as EntityTrait>::Column) -> Self {
        Self::column_with(name, column, Modifier::Text)
    }

    pub fn column_with(
        name: &'static str,
        column: <A::Base as EntityTrait>::Column,
        modifier: Modifier,
    ) -> Self {
        Self {
            name,
            target: FilterTarget::Column(column),
            modifier,
        }
    }

    /// Build an association-traversing spec from an `assoc.column` path,
    /// resolved against the registry now rather than at request time.
    pub fn associated(name: &'static str, path: &'static str) -> Result<Self, AdminServiceError> {
        let unknown = || AdminServiceError::UnknownAssociation(path.to_owned());
        let (assoc_name, column) = path.split_once('.').ok_or_else(unknown)?;
        let assoc = A::parse(assoc_name).ok_or_else(unknown)?;
        if !assoc.supports_column(column) {
            return Err(unknown());
        }
        Ok(Self {
            name,
            target: FilterTarget::Association { assoc, column },
            modifier: Modifier::Text,
        })
    }
}

// ── Shaping ──────────────────────────────────────────────────────────────────

/// A filter whose association lookups have already run.
#[derive(Debug, Clone)]
pub enum ResolvedFilter<A: Association> {
    Column(<A::Base as EntityTrait>::Column, FilterValue),
    Edge(A, Option<Uuid>),
}

/// Run the association lookups for every spec whose parameter is present
/// and non-empty.
pub async fn resolve<A: Association>(
    db: &DatabaseConnection,
    specs: &[FilterSpec<A>],
    params: &QueryParams,
) -> Result<Vec<ResolvedFilter<A>>, AdminServiceError> {
    let mut resolved = Vec::new();
    for spec in specs {
        let Some(raw) = params.get(spec.name) else {
            continue;
        };
        let value = spec.modifier.coerce(raw);
        match &spec.target {
            FilterTarget::Column(column) => resolved.push(ResolvedFilter::Column(*column, value)),
            FilterTarget::Association { assoc, column } => {
                let key = assoc.lookup(db, *column, &value).await?;
                resolved.push(ResolvedFilter::Edge(*assoc, key));
            }
        }
    }
    Ok(resolved)
}

/// Narrow `select` by each resolved filter, then by the free-text search.
/// Pure: all lookups happened in [`resolve`].
pub fn apply<A: Association>(
    mut select: Select<A::Base>,
    resolved: &[ResolvedFilter<A>],
    searchable: &[<A::Base as EntityTrait>::Column],
    q: Option<&str>,
) -> Select<A::Base> {
    for filter in resolved {
        select = match filter {
            ResolvedFilter::Column(column, value) => select.filter(column.eq(value.clone())),
            ResolvedFilter::Edge(assoc, key) => select.filter(assoc.edge_condition(*key)),
        };
    }
    if let Some(q) = q {
        if !searchable.is_empty() {
            select = select.filter(search_condition(searchable, q));
        }
    }
    select
}

/// OR of case-insensitive substring predicates across the searchable columns.
pub fn search_condition<C: ColumnTrait>(searchable: &[C], q: &str) -> Condition {
    let mut any = Condition::any();
    for column in searchable {
        any = any.add(column.ilike_contains(q));
    }
    any
}

/// Scope → filter → search, in that order.
pub async fn shape<A: Association>(
    db: &DatabaseConnection,
    select: Select<A::Base>,
    specs: &[FilterSpec<A>],
    searchable: &[<A::Base as EntityTrait>::Column],
    params: &QueryParams,
) -> Result<Select<A::Base>, AdminServiceError> {
    let resolved = resolve(db, specs, params).await?;
    Ok(apply(select, &resolved, searchable, params.q()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams {
            values: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn should_coerce_text_int_and_lowercase() {
        assert_eq!(
            Modifier::Text.coerce("Alice"),
            FilterValue::Text("Alice".into())
        );
        assert_eq!(Modifier::Int.coerce("42"), FilterValue::Int(42));
        assert_eq!(Modifier::Int.coerce("not-a-number"), FilterValue::Int(0));
        assert_eq!(
            Modifier::Lowercase.coerce("Alice"),
            FilterValue::Text("alice".into())
        );
    }

    #[test]
    fn should_treat_empty_params_as_absent() {
        let p = params(&[("status", ""), ("q", "")]);
        assert_eq!(p.get("status"), None);
        assert_eq!(p.q(), None);
        assert_eq!(p.get("missing"), None);
    }

    #[test]
    fn should_default_page_request() {
        let p = params(&[]);
        assert_eq!(p.page_request(), PageRequest { count: 10, page: 1 });
    }

    #[test]
    fn should_coerce_malformed_page_numbers_to_zero() {
        let p = params(&[("page", "abc"), ("count", "")]);
        let page = p.page_request();
        assert_eq!(page.page, 0);
        assert_eq!(page.count, 0);
        assert!(page.validated().is_err());
    }

    #[test]
    fn should_parse_flat_query_strings() {
        let p = QueryParams::from_raw(Some("status=active&q=bob&page=3"));
        assert_eq!(p.get("status"), Some("active"));
        assert_eq!(p.q(), Some("bob"));
        assert_eq!(p.page_request().page, 3);
    }

    #[test]
    fn should_degrade_to_empty_on_missing_query() {
        let p = QueryParams::from_raw(None);
        assert!(p.values.is_empty());
    }
}
