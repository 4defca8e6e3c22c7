use chrono::{Duration, NaiveDate};

use super::values::{SqlStatement, SqlValue};
use crate::entities::{EntityDef, FieldDef, FieldKind, Reference, ValidatedField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Parsed list options; every column name here came from the registry
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub filters: Vec<(&'static FieldDef, SqlValue)>,
    pub order: Option<(&'static str, SortDirection)>,
    pub limit: i64,
    pub offset: i64,
}

/// Numbers placeholders as values are pushed
#[derive(Default)]
struct Params(Vec<SqlValue>);

impl Params {
    fn push(&mut self, v: SqlValue) -> String {
        self.0.push(v);
        format!("${}", self.0.len())
    }
}

/// Builds parameterized statements for one registry entity
pub struct QueryBuilder {
    entity: &'static EntityDef,
}

impl QueryBuilder {
    pub fn new(entity: &'static EntityDef) -> Self {
        Self { entity }
    }

    fn join_alias(field: &FieldDef) -> String {
        format!("r_{}", field.name)
    }

    fn referenced_fields(&self) -> impl Iterator<Item = (&'static FieldDef, Reference)> + '_ {
        self.entity
            .fields
            .iter()
            .filter_map(|f| f.reference.map(|r| (f, r)))
    }

    /// `SELECT <columns> FROM <table> e LEFT JOIN ...`
    fn select_from(&self) -> String {
        let mut columns: Vec<String> = self
            .entity
            .readable_columns()
            .into_iter()
            .map(|c| format!("e.{}", c))
            .collect();
        let mut joins = String::new();

        for (field, r) in self.referenced_fields() {
            let alias = Self::join_alias(field);
            columns.push(format!("{}.{} AS {}_label", alias, r.label, field.name));
            joins.push_str(&format!(
                " LEFT JOIN {} {} ON {}.{} = e.{}",
                r.table, alias, alias, r.key, field.name
            ));
        }

        format!("SELECT {} FROM {} e{}", columns.join(", "), self.entity.table, joins)
    }

    fn where_clause(&self, p: &ListParams, params: &mut Params) -> String {
        let mut conditions = Vec::new();

        if let Some(term) = p.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let placeholder = params.push(SqlValue::Text(like_pattern(term)));
            let mut targets: Vec<String> = self
                .entity
                .fields
                .iter()
                .filter(|f| f.searchable)
                .map(|f| format!("e.{}", f.name))
                .collect();
            targets.extend(
                self.referenced_fields()
                    .map(|(f, r)| format!("{}.{}", Self::join_alias(f), r.label)),
            );
            if !targets.is_empty() {
                let ors: Vec<String> = targets.iter().map(|t| format!("{} ILIKE {}", t, placeholder)).collect();
                conditions.push(format!("({})", ors.join(" OR ")));
            }
        }

        let date_column = self.entity.date_column;
        if let Some(from) = p.from {
            conditions.push(format!("e.{} >= {}", date_column, params.push(SqlValue::Date(from))));
        }
        if let Some(to) = p.to {
            // Exclusive upper bound so timestamp columns include the whole day
            let next = to + Duration::days(1);
            conditions.push(format!("e.{} < {}", date_column, params.push(SqlValue::Date(next))));
        }

        for (field, value) in &p.filters {
            conditions.push(format!("e.{} = {}", field.name, params.push(value.clone())));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }

    pub fn list(&self, p: &ListParams) -> SqlStatement {
        let mut params = Params::default();
        let where_clause = self.where_clause(p, &mut params);

        let pk = self.entity.primary_key;
        let order = match p.order {
            Some((column, dir)) if column != pk => format!("e.{} {}, e.{} DESC", column, dir.to_sql(), pk),
            Some((_, dir)) => format!("e.{} {}", pk, dir.to_sql()),
            None => format!("e.{} DESC", pk),
        };
        let limit = params.push(SqlValue::BigInt(p.limit));
        let offset = params.push(SqlValue::BigInt(p.offset));

        SqlStatement {
            sql: format!(
                "SELECT row_to_json(t) AS row FROM ({}{} ORDER BY {} LIMIT {} OFFSET {}) t",
                self.select_from(),
                where_clause,
                order,
                limit,
                offset
            ),
            params: params.0,
        }
    }

    pub fn count(&self, p: &ListParams) -> SqlStatement {
        let mut params = Params::default();
        let where_clause = self.where_clause(p, &mut params);

        let mut joins = String::new();
        for (field, r) in self.referenced_fields() {
            let alias = Self::join_alias(field);
            joins.push_str(&format!(
                " LEFT JOIN {} {} ON {}.{} = e.{}",
                r.table, alias, alias, r.key, field.name
            ));
        }

        SqlStatement {
            sql: format!("SELECT COUNT(*) AS count FROM {} e{}{}", self.entity.table, joins, where_clause),
            params: params.0,
        }
    }

    pub fn by_id(&self, id: i64) -> SqlStatement {
        SqlStatement {
            sql: format!(
                "SELECT row_to_json(t) AS row FROM ({} WHERE e.{} = $1) t",
                self.select_from(),
                self.entity.primary_key
            ),
            params: vec![SqlValue::BigInt(id)],
        }
    }

    /// Row lock held until the surrounding transaction ends
    pub fn lock(&self, id: i64) -> SqlStatement {
        SqlStatement {
            sql: format!(
                "SELECT {pk} FROM {table} WHERE {pk} = $1 FOR UPDATE",
                pk = self.entity.primary_key,
                table = self.entity.table
            ),
            params: vec![SqlValue::BigInt(id)],
        }
    }

    pub fn insert(&self, fields: &[ValidatedField], created_by: Option<i64>) -> SqlStatement {
        let mut params = Params::default();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();

        for f in fields {
            columns.push(f.field.name);
            placeholders.push(params.push(f.value.clone()));
        }
        if self.entity.stamp_creator {
            columns.push("created_by");
            placeholders.push(params.push(match created_by {
                Some(id) => SqlValue::BigInt(id),
                None => SqlValue::Null(crate::entities::SqlType::BigInt),
            }));
        }

        SqlStatement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {} AS id",
                self.entity.table,
                columns.join(", "),
                placeholders.join(", "),
                self.entity.primary_key
            ),
            params: params.0,
        }
    }

    pub fn update(&self, id: i64, fields: &[ValidatedField]) -> SqlStatement {
        let mut params = Params::default();
        let assignments: Vec<String> = fields
            .iter()
            .map(|f| format!("{} = {}", f.field.name, params.push(f.value.clone())))
            .collect();
        let pk = params.push(SqlValue::BigInt(id));

        SqlStatement {
            sql: format!(
                "UPDATE {} SET {} WHERE {} = {}",
                self.entity.table,
                assignments.join(", "),
                self.entity.primary_key,
                pk
            ),
            params: params.0,
        }
    }

    pub fn delete(&self, id: i64) -> SqlStatement {
        SqlStatement {
            sql: format!("DELETE FROM {} WHERE {} = $1", self.entity.table, self.entity.primary_key),
            params: vec![SqlValue::BigInt(id)],
        }
    }

    /// Whether another row already holds `values` for `columns`
    pub fn unique_taken(&self, columns: &[&str], values: Vec<SqlValue>, exclude_id: Option<i64>) -> SqlStatement {
        let mut params = Params::default();
        let mut conditions: Vec<String> = columns
            .iter()
            .zip(values)
            .map(|(c, v)| format!("{} = {}", c, params.push(v)))
            .collect();
        if let Some(id) = exclude_id {
            conditions.push(format!("{} <> {}", self.entity.primary_key, params.push(SqlValue::BigInt(id))));
        }

        SqlStatement {
            sql: format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {}) AS taken",
                self.entity.table,
                conditions.join(" AND ")
            ),
            params: params.0,
        }
    }

    pub fn reference_exists(reference: &Reference, id: i64) -> SqlStatement {
        SqlStatement {
            sql: format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1) AS found",
                reference.table, reference.key
            ),
            params: vec![SqlValue::BigInt(id)],
        }
    }

    pub fn dependent_count(dependent: &EntityDef, field: &FieldDef, id: i64) -> SqlStatement {
        SqlStatement {
            sql: format!("SELECT COUNT(*) AS count FROM {} WHERE {} = $1", dependent.table, field.name),
            params: vec![SqlValue::BigInt(id)],
        }
    }
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Convert a stored JSON column value back into a typed parameter
pub fn stored_value(field: &FieldDef, v: &serde_json::Value) -> SqlValue {
    use rust_decimal::Decimal;
    use std::str::FromStr;

    let null = SqlValue::Null(field.kind.sql_type());
    match field.kind {
        FieldKind::Integer => v.as_i64().map(SqlValue::BigInt).unwrap_or(null),
        FieldKind::Decimal => match v {
            serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .map(SqlValue::Numeric)
                .unwrap_or(null),
            _ => null,
        },
        FieldKind::Date => v
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(SqlValue::Date)
            .unwrap_or(null),
        _ => v.as_str().map(|s| SqlValue::Text(s.to_string())).unwrap_or(null),
    }
}
