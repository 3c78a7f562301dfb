//! Filter/search configuration of the users component.

use anyhow::Context as _;
use sea_orm::sea_query::{Condition, Query};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use quarterdeck_admin_schema::{identities, roles, user_roles, users};

use crate::error::AdminServiceError;
use crate::query::{Association, FilterSpec, FilterValue};

/// Associations the users component may traverse in filter specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAssoc {
    Roles,
    Identities,
}

impl Association for UserAssoc {
    type Base = users::Entity;

    fn parse(name: &str) -> Option<Self> {
        match name {
            "roles" => Some(Self::Roles),
            "identities" => Some(Self::Identities),
            _ => None,
        }
    }

    fn supports_column(self, column: &str) -> bool {
        match self {
            Self::Roles => column == "name",
            Self::Identities => column == "username",
        }
    }

    async fn lookup(
        self,
        db: &DatabaseConnection,
        column: &'static str,
        value: &FilterValue,
    ) -> Result<Option<Uuid>, AdminServiceError> {
        debug_assert!(self.supports_column(column));
        let FilterValue::Text(text) = value else {
            return Ok(None);
        };
        match self {
            Self::Roles => {
                let role = roles::Entity::find()
                    .filter(roles::Column::Name.eq(text.as_str()))
                    .one(db)
                    .await
                    .context("resolve role filter")?;
                Ok(role.map(|r| r.id))
            }
            Self::Identities => {
                let identity = identities::Entity::find()
                    .filter(identities::Column::Username.eq(text.as_str()))
                    .one(db)
                    .await
                    .context("resolve identity filter")?;
                Ok(identity.map(|i| i.user_id))
            }
        }
    }

    fn edge_condition(self, key: Option<Uuid>) -> Condition {
        match (self, key) {
            (Self::Roles, Some(role_id)) => Condition::all().add(
                users::Column::Id.in_subquery(
                    Query::select()
                        .column(user_roles::Column::UserId)
                        .from(user_roles::Entity)
                        .and_where(user_roles::Column::RoleId.eq(role_id))
                        .to_owned(),
                ),
            ),
            (Self::Identities, Some(user_id)) => {
                Condition::all().add(users::Column::Id.eq(user_id))
            }
            // No associated row matched: stay queryable but match nothing.
            (_, None) => Condition::all().add(users::Column::Id.is_in(Vec::<Uuid>::new())),
        }
    }
}

/// Filter specs and searchable fields of the users collection, resolved once
/// at startup.
#[derive(Debug, Clone)]
pub struct UserComponent {
    pub filters: Vec<FilterSpec<UserAssoc>>,
    pub searchable: Vec<users::Column>,
}

impl UserComponent {
    pub fn new() -> Result<Self, AdminServiceError> {
        Ok(Self {
            filters: vec![
                FilterSpec::column("email", users::Column::Email),
                FilterSpec::column("name", users::Column::Name),
                FilterSpec::associated("role", "roles.name")?,
                FilterSpec::associated("username", "identities.username")?,
            ],
            searchable: vec![users::Column::Email, users::Column::Name],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    use crate::query::{Modifier, QueryParams, ResolvedFilter, apply, search_condition};

    fn sql_of(select: sea_orm::Select<users::Entity>) -> String {
        select.build(DbBackend::Postgres).to_string()
    }

    #[test]
    fn component_configuration_is_valid() {
        let component = UserComponent::new().unwrap();
        assert_eq!(component.filters.len(), 4);
        assert_eq!(component.searchable.len(), 2);
    }

    #[test]
    fn unknown_association_fails_at_configuration_time() {
        let err = FilterSpec::<UserAssoc>::associated("manager", "managers.username").unwrap_err();
        assert!(matches!(err, AdminServiceError::UnknownAssociation(_)));

        let err = FilterSpec::<UserAssoc>::associated("role", "roles.secret").unwrap_err();
        assert!(matches!(err, AdminServiceError::UnknownAssociation(_)));

        let err = FilterSpec::<UserAssoc>::associated("role", "no-dot-here").unwrap_err();
        assert!(matches!(err, AdminServiceError::UnknownAssociation(_)));
    }

    #[test]
    fn role_edge_condition_uses_join_table_subquery() {
        let role_id = Uuid::new_v4();
        let sql = sql_of(
            users::Entity::find().filter(UserAssoc::Roles.edge_condition(Some(role_id))),
        );
        assert!(sql.contains(r#"IN (SELECT "user_id" FROM "user_roles""#), "{sql}");
        assert!(sql.contains(r#""role_id" ="#), "{sql}");
    }

    #[test]
    fn identity_edge_condition_pins_the_user_id() {
        let user_id = Uuid::new_v4();
        let sql = sql_of(
            users::Entity::find().filter(UserAssoc::Identities.edge_condition(Some(user_id))),
        );
        assert!(sql.contains(r#""users"."id" ="#), "{sql}");
    }

    #[test]
    fn missing_associated_row_matches_nothing() {
        let sql = sql_of(users::Entity::find().filter(UserAssoc::Roles.edge_condition(None)));
        // sea-query renders an empty IN list as a constant-false predicate.
        assert!(sql.contains("1 = 2"), "{sql}");
    }

    #[test]
    fn filters_compose_as_an_intersection() {
        let role_id = Uuid::new_v4();
        let resolved = vec![
            ResolvedFilter::<UserAssoc>::Column(
                users::Column::Email,
                Modifier::Text.coerce("alice@example.com"),
            ),
            ResolvedFilter::Edge(UserAssoc::Roles, Some(role_id)),
        ];
        let sql = sql_of(apply(users::Entity::find(), &resolved, &[], None));
        assert!(sql.contains(r#""users"."email" ="#), "{sql}");
        assert!(sql.contains(r#"IN (SELECT "user_id" FROM "user_roles""#), "{sql}");
        assert!(sql.contains(" AND "), "{sql}");
    }

    #[test]
    fn absent_parameter_drops_the_predicate_entirely() {
        // Only the email parameter is present; the role spec must contribute
        // nothing, not a NULL comparison.
        let params = QueryParams::from_raw(Some("email=alice%40example.com"));
        let component = UserComponent::new().unwrap();
        let present: Vec<&str> = component
            .filters
            .iter()
            .filter(|spec| params.get(spec.name).is_some())
            .map(|spec| spec.name)
            .collect();
        assert_eq!(present, vec!["email"]);
    }

    #[test]
    fn search_is_additive_or_across_fields() {
        let sql = sql_of(users::Entity::find().filter(search_condition(
            &[users::Column::Email, users::Column::Name],
            "bob",
        )));
        assert!(sql.contains("ILIKE"), "{sql}");
        assert!(sql.contains("%bob%"), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn search_escapes_pattern_metacharacters() {
        let sql = sql_of(
            users::Entity::find()
                .filter(search_condition(&[users::Column::Email], "50%_off")),
        );
        assert!(sql.contains(r"50\%\_off"), "{sql}");
    }

    #[test]
    fn empty_search_term_is_a_no_op() {
        let unfiltered = sql_of(users::Entity::find());
        let shaped = sql_of(apply::<UserAssoc>(
            users::Entity::find(),
            &[],
            &[users::Column::Email, users::Column::Name],
            None,
        ));
        assert_eq!(unfiltered, shaped);
    }

    #[test]
    fn empty_searchable_list_is_a_no_op() {
        let unfiltered = sql_of(users::Entity::find());
        let shaped = sql_of(apply::<UserAssoc>(
            users::Entity::find(),
            &[],
            &[],
            Some("bob"),
        ));
        assert_eq!(unfiltered, shaped);
    }
}
