use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{postgres::PgArguments, query::Query, Postgres};

use crate::entities::SqlType;

/// A typed statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    BigInt(i64),
    Numeric(Decimal),
    Date(NaiveDate),
    /// NULL bound with the column's type so Postgres can infer the parameter
    Null(SqlType),
}

impl SqlValue {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }
}

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

pub fn bind_value<'q>(q: PgQuery<'q>, v: &'q SqlValue) -> PgQuery<'q> {
    match v {
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::BigInt(n) => q.bind(*n),
        SqlValue::Numeric(d) => q.bind(*d),
        SqlValue::Date(d) => q.bind(*d),
        SqlValue::Null(SqlType::Text) => q.bind(None::<String>),
        SqlValue::Null(SqlType::BigInt) => q.bind(None::<i64>),
        SqlValue::Null(SqlType::Numeric) => q.bind(None::<Decimal>),
        SqlValue::Null(SqlType::Date) => q.bind(None::<NaiveDate>),
    }
}

/// Bind every parameter in order
pub fn bind_all<'q>(mut q: PgQuery<'q>, params: &'q [SqlValue]) -> PgQuery<'q> {
    for p in params {
        q = bind_value(q, p);
    }
    q
}

/// SQL text plus the parameters its placeholders refer to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl SqlStatement {
    pub fn query(&self) -> PgQuery<'_> {
        bind_all(sqlx::query(&self.sql), &self.params)
    }
}
