use chrono::NaiveDate;
use serde_json::{Map, Value};
use sqlx::{Postgres, Row, Transaction};
use std::collections::HashMap;

use crate::app::AppState;
use crate::auth::hash_password;
use crate::database::query_builder::stored_value;
use crate::database::{ListParams, QueryBuilder, QueryTimer, SortDirection, SqlValue};
use crate::entities::{
    self, check_date_ranges, validate_payload, EntityDef, FieldDef, FieldKind, Mode, ValidatedField,
};
use crate::error::ApiError;
use crate::middleware::AuthStaff;
use crate::permissions::{require, Action};

/// CRUD over one registry entity, gated by the caller's permissions
pub struct EntityService<'a> {
    state: &'a AppState,
    entity: &'static EntityDef,
    builder: QueryBuilder,
}

impl<'a> EntityService<'a> {
    pub fn new(state: &'a AppState, entity: &'static EntityDef) -> Self {
        Self {
            state,
            entity,
            builder: QueryBuilder::new(entity),
        }
    }

    /// Resolve an entity by URL name; unknown names are 404
    pub fn resolve(state: &'a AppState, name: &str) -> Result<Self, ApiError> {
        entities::find(name)
            .map(|entity| Self::new(state, entity))
            .ok_or_else(|| ApiError::not_found(format!("Unknown entity '{}'", name)))
    }

    pub fn entity(&self) -> &'static EntityDef {
        self.entity
    }

    fn timer(&self, label: &'a str) -> QueryTimer<'a> {
        QueryTimer::start(label, &self.state.config.database)
    }

    pub async fn list(&self, staff: &AuthStaff, params: &ListParams) -> Result<(Vec<Value>, i64), ApiError> {
        require(self.state, staff, self.entity.page, Action::View).await?;

        let _timer = self.timer(self.entity.name);
        let count = self.builder.count(params);
        let total: i64 = count.query().fetch_one(&self.state.pool).await?.try_get("count")?;

        let list = self.builder.list(params);
        let rows = list.query().fetch_all(&self.state.pool).await?;
        let records = rows
            .iter()
            .map(|row| row.try_get::<Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, total))
    }

    pub async fn get(&self, staff: &AuthStaff, id: i64) -> Result<Value, ApiError> {
        require(self.state, staff, self.entity.page, Action::View).await?;

        let stmt = self.builder.by_id(id);
        let row = stmt.query().fetch_optional(&self.state.pool).await?;
        match row {
            Some(row) => Ok(row.try_get::<Value, _>("row")?),
            None => Err(self.not_found(id)),
        }
    }

    pub async fn create(&self, staff: &AuthStaff, payload: &Value) -> Result<Value, ApiError> {
        require(self.state, staff, self.entity.page, Action::Add).await?;

        let fields = validate_payload(self.entity, payload, Mode::Create)?;
        check_date_ranges(self.entity, &fields, None)?;
        let fields = self.hash_passwords(fields).await?;

        let _timer = self.timer(self.entity.name);
        let mut tx = self.state.pool.begin().await?;

        self.check_references(&mut tx, &fields).await?;
        self.check_unique(&mut tx, &fields, None, None).await?;

        let id: i64 = self
            .builder
            .insert(&fields, Some(staff.staff_id))
            .query()
            .fetch_one(&mut *tx)
            .await?
            .try_get("id")?;
        let record = self.fetch_in(&mut tx, id).await?.ok_or_else(|| self.not_found(id))?;

        tx.commit().await?;
        tracing::info!(staff_id = staff.staff_id, "Created {} {}", self.entity.name, id);
        Ok(Value::Object(record))
    }

    pub async fn update(&self, staff: &AuthStaff, id: i64, payload: &Value) -> Result<Value, ApiError> {
        require(self.state, staff, self.entity.page, Action::Edit).await?;

        let fields = validate_payload(self.entity, payload, Mode::Update)?;
        let fields = self.hash_passwords(fields).await?;

        let _timer = self.timer(self.entity.name);
        let mut tx = self.state.pool.begin().await?;

        self.lock(&mut tx, id).await?;
        let existing = self.fetch_in(&mut tx, id).await?.ok_or_else(|| self.not_found(id))?;

        check_date_ranges(self.entity, &fields, Some(&existing))?;
        self.check_references(&mut tx, &fields).await?;
        self.check_unique(&mut tx, &fields, Some(&existing), Some(id)).await?;

        self.builder.update(id, &fields).query().execute(&mut *tx).await?;
        let record = self.fetch_in(&mut tx, id).await?.ok_or_else(|| self.not_found(id))?;

        tx.commit().await?;
        tracing::info!(staff_id = staff.staff_id, "Updated {} {}", self.entity.name, id);
        Ok(Value::Object(record))
    }

    pub async fn delete(&self, staff: &AuthStaff, id: i64) -> Result<(), ApiError> {
        require(self.state, staff, self.entity.page, Action::Delete).await?;

        if self.entity.name == "staff" && id == staff.staff_id {
            return Err(ApiError::conflict("You cannot delete your own account"));
        }

        let _timer = self.timer(self.entity.name);
        let mut tx = self.state.pool.begin().await?;
        self.lock(&mut tx, id).await?;

        let mut blockers = Vec::new();
        for (dependent, field) in entities::dependents(self.entity) {
            let count: i64 = QueryBuilder::dependent_count(dependent, field, id)
                .query()
                .fetch_one(&mut *tx)
                .await?
                .try_get("count")?;
            if count > 0 {
                blockers.push(format!("{} ({})", dependent.name, count));
            }
        }
        if !blockers.is_empty() {
            return Err(ApiError::conflict(format!(
                "Cannot delete {} {}: referenced by {}",
                self.entity.name,
                id,
                blockers.join(", ")
            )));
        }

        self.builder.delete(id).query().execute(&mut *tx).await?;
        tx.commit().await?;
        tracing::info!(staff_id = staff.staff_id, "Deleted {} {}", self.entity.name, id);
        Ok(())
    }

    fn not_found(&self, id: i64) -> ApiError {
        ApiError::not_found(format!("{} {} not found", self.entity.name, id))
    }

    async fn lock(&self, tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<(), ApiError> {
        let locked = self.builder.lock(id).query().fetch_optional(&mut **tx).await?;
        locked.map(|_| ()).ok_or_else(|| self.not_found(id))
    }

    async fn fetch_in(&self, tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<Option<Map<String, Value>>, ApiError> {
        let row = self.builder.by_id(id).query().fetch_optional(&mut **tx).await?;
        match row {
            Some(row) => match row.try_get::<Value, _>("row")? {
                Value::Object(map) => Ok(Some(map)),
                other => {
                    tracing::error!("Unexpected row shape for {} {}: {}", self.entity.name, id, other);
                    Err(ApiError::internal_server_error("Unexpected record format"))
                }
            },
            None => Ok(None),
        }
    }

    async fn hash_passwords(&self, mut fields: Vec<ValidatedField>) -> Result<Vec<ValidatedField>, ApiError> {
        let cost = self.state.config.security.bcrypt_cost;
        for f in fields.iter_mut().filter(|f| f.field.is_hidden()) {
            if let SqlValue::Text(plain) = &f.value {
                let plain = plain.clone();
                let hashed = tokio::task::spawn_blocking(move || hash_password(&plain, cost))
                    .await
                    .map_err(|e| ApiError::internal_server_error(format!("Password hashing failed: {}", e)))?
                    .map_err(|e| {
                        tracing::error!("bcrypt error: {}", e);
                        ApiError::internal_server_error("Password hashing failed")
                    })?;
                f.value = SqlValue::Text(hashed);
            }
        }
        Ok(fields)
    }

    /// Every referenced id in `fields` must exist
    async fn check_references(&self, tx: &mut Transaction<'_, Postgres>, fields: &[ValidatedField]) -> Result<(), ApiError> {
        for f in fields {
            let (Some(reference), Some(id)) = (f.field.reference, f.value.as_i64()) else {
                continue;
            };
            let found: bool = QueryBuilder::reference_exists(&reference, id)
                .query()
                .fetch_one(&mut **tx)
                .await?
                .try_get("found")?;
            if !found {
                return Err(ApiError::field_error(
                    f.field.name,
                    format!("{} {} does not exist", reference.entity, id),
                ));
            }
        }
        Ok(())
    }

    /// Each unique column set touched by `fields` must be free
    async fn check_unique(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fields: &[ValidatedField],
        existing: Option<&Map<String, Value>>,
        exclude_id: Option<i64>,
    ) -> Result<(), ApiError> {
        for set in self.entity.unique {
            let touched = set.iter().any(|c| fields.iter().any(|f| f.field.name == *c));
            if !touched {
                continue;
            }

            let values: Vec<SqlValue> = set
                .iter()
                .map(|c| match fields.iter().find(|f| f.field.name == *c) {
                    Some(f) => f.value.clone(),
                    None => match (self.entity.field(c), existing.and_then(|row| row.get(*c))) {
                        (Some(def), Some(stored)) => stored_value(def, stored),
                        (Some(def), None) => SqlValue::Null(def.kind.sql_type()),
                        (None, _) => SqlValue::Null(entities::SqlType::Text),
                    },
                })
                .collect();
            // NULL never collides, same as the unique index
            if values.iter().any(SqlValue::is_null) {
                continue;
            }

            let taken: bool = self
                .builder
                .unique_taken(set, values, exclude_id)
                .query()
                .fetch_one(&mut **tx)
                .await?
                .try_get("taken")?;
            if taken {
                return Err(ApiError::conflict(format!(
                    "{} with the same {} already exists",
                    self.entity.name,
                    set.join(" and ")
                )));
            }
        }
        Ok(())
    }
}

const RESERVED_KEYS: &[&str] = &["search", "from", "to", "order", "limit", "offset"];

/// Build list options from query-string style pairs.
///
/// Keys naming a filterable field become equality filters; unrelated keys
/// are ignored so clients may add cache-busting parameters.
pub fn parse_list_params(
    entity: &'static EntityDef,
    query: &HashMap<String, String>,
    state: &AppState,
) -> Result<ListParams, ApiError> {
    let date = |key: &str| -> Result<Option<NaiveDate>, ApiError> {
        match query.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("{} must be a date (YYYY-MM-DD)", key))),
            None => Ok(None),
        }
    };
    let number = |key: &str| -> Result<Option<i64>, ApiError> {
        match query.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(s) => s
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("{} must be an integer", key))),
            None => Ok(None),
        }
    };

    let from = date("from")?;
    let to = date("to")?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(ApiError::bad_request("from must not be after to"));
        }
    }

    let order = match query.get("order").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(spec) => Some(parse_order(entity, spec)?),
        None => None,
    };

    let mut filters = Vec::new();
    for (key, raw) in query {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(field) = entity.field(key).filter(|f| f.filterable) {
            filters.push((field, parse_filter(field, raw)?));
        }
    }
    // HashMap iteration order is random; keep SQL stable
    filters.sort_by_key(|(f, _)| f.name);

    Ok(ListParams {
        search: query.get("search").cloned(),
        from,
        to,
        filters,
        order,
        limit: state.config.page_size(number("limit")?),
        offset: number("offset")?.unwrap_or(0).max(0),
    })
}

fn parse_order(entity: &'static EntityDef, spec: &str) -> Result<(&'static str, SortDirection), ApiError> {
    let mut parts = spec.split_whitespace();
    let column = parts.next().unwrap_or_default();
    let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => SortDirection::Asc,
        Some("desc") => SortDirection::Desc,
        Some(other) => return Err(ApiError::bad_request(format!("invalid sort direction '{}'", other))),
    };
    entity
        .sortable_column(column)
        .map(|c| (c, direction))
        .ok_or_else(|| ApiError::bad_request(format!("cannot order {} by '{}'", entity.name, column)))
}

fn parse_filter(field: &FieldDef, raw: &str) -> Result<SqlValue, ApiError> {
    let raw = raw.trim();
    let invalid = |expected: &str| ApiError::bad_request(format!("filter {} must be {}", field.name, expected));
    match field.kind {
        FieldKind::Integer => raw.parse::<i64>().map(SqlValue::BigInt).map_err(|_| invalid("an integer")),
        FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(SqlValue::Date)
            .map_err(|_| invalid("a date (YYYY-MM-DD)")),
        FieldKind::Enum(values) => {
            let v = raw.to_lowercase();
            if values.contains(&v.as_str()) {
                Ok(SqlValue::Text(v))
            } else {
                Err(invalid(&format!("one of: {}", values.join(", "))))
            }
        }
        _ => Ok(SqlValue::Text(raw.to_string())),
    }
}
