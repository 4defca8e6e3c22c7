//! Static descriptors for every back-office entity.
//!
//! Handlers never take table or column names from a request: every
//! identifier that reaches SQL comes from an [`EntityDef`] in [`registry`].

pub mod registry;
pub mod validate;

use serde::Serialize;

use crate::database::SqlValue;

pub use registry::{dependents, find, pages, ENTITIES, EXTRA_PAGES};
pub use validate::{check_date_ranges, validate_payload, Mode, ValidatedField, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Integer,
    Decimal,
    Date,
    Enum(&'static [&'static str]),
    /// Hashed on write and never selected
    Password,
}

impl FieldKind {
    /// Postgres type used when binding a typed NULL
    pub fn sql_type(&self) -> SqlType {
        match self {
            FieldKind::Integer => SqlType::BigInt,
            FieldKind::Decimal => SqlType::Numeric,
            FieldKind::Date => SqlType::Date,
            _ => SqlType::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    BigInt,
    Numeric,
    Date,
}

/// Foreign key to another entity's primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub entity: &'static str,
    pub table: &'static str,
    pub key: &'static str,
    /// Column shown as `<field>_label` in reads
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub max_len: usize,
    pub searchable: bool,
    pub filterable: bool,
    pub reference: Option<Reference>,
    /// Stored when a create omits the field or sends it blank
    pub default: Option<&'static str>,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            max_len: 255,
            searchable: false,
            filterable: false,
            reference: None,
            default: None,
        }
    }

    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    pub const fn searchable(self) -> Self {
        Self { searchable: true, ..self }
    }

    pub const fn filterable(self) -> Self {
        Self { filterable: true, ..self }
    }

    pub const fn max_len(self, max_len: usize) -> Self {
        Self { max_len, ..self }
    }

    pub const fn references(self, reference: Reference) -> Self {
        Self {
            reference: Some(reference),
            filterable: true,
            ..self
        }
    }

    pub const fn default(self, value: &'static str) -> Self {
        Self {
            default: Some(value),
            ..self
        }
    }

    /// Value written in place of a blank, typed NULL when there is no default
    pub fn blank_value(&self) -> SqlValue {
        match self.default {
            Some(value) => SqlValue::Text(value.to_string()),
            None => SqlValue::Null(self.kind.sql_type()),
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.kind, FieldKind::Password)
    }
}

#[derive(Debug, Serialize)]
pub struct EntityDef {
    /// URL segment under /api/data
    pub name: &'static str,
    #[serde(skip)]
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Page name checked against the permissions table
    pub page: &'static str,
    pub fields: &'static [FieldDef],
    pub unique: &'static [&'static [&'static str]],
    /// Column bounded by `from`/`to` on list
    pub date_column: &'static str,
    /// (start, end) pairs where start must not be after end
    pub date_ranges: &'static [(&'static str, &'static str)],
    /// Records `created_by` from the caller's token
    pub stamp_creator: bool,
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Columns a read returns, in order. Hidden fields are never included.
    pub fn readable_columns(&self) -> Vec<&'static str> {
        let mut cols = vec![self.primary_key];
        cols.extend(self.fields.iter().filter(|f| !f.is_hidden()).map(|f| f.name));
        if self.stamp_creator {
            cols.push("created_by");
        }
        cols.push("created_at");
        cols
    }

    /// The registry's name for `column` when a list may sort on it
    pub fn sortable_column(&self, column: &str) -> Option<&'static str> {
        self.readable_columns().into_iter().find(|c| *c == column)
    }
}
