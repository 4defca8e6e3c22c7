use super::{EntityDef, FieldDef, FieldKind, Reference};

const CUSTOMER: Reference = Reference { entity: "customers", table: "customers", key: "customer_id", label: "customer_name" };
const SUPPLIER: Reference = Reference { entity: "suppliers", table: "suppliers", key: "supp_id", label: "supp_name" };
const CURRENCY: Reference = Reference { entity: "currencies", table: "currencies", key: "currency_id", label: "currency_name" };
const ACCOUNT: Reference = Reference { entity: "accounts", table: "accounts", key: "account_id", label: "account_name" };
const ROLE: Reference = Reference { entity: "roles", table: "roles", key: "role_id", label: "role_name" };
const BRANCH: Reference = Reference { entity: "branches", table: "branches", key: "branch_id", label: "branch_name" };
const EXPENSE_TYPE: Reference = Reference {
    entity: "expense_types",
    table: "expense_types",
    key: "expense_type_id",
    label: "expense_type",
};

pub const ACTIVE_STATUS: &[&str] = &["active", "inactive"];
pub const SUPPLIER_TYPES: &[&str] = &["ticket", "visa", "residence", "hotel", "car", "other"];
pub const ACCOUNT_TYPES: &[&str] = &["cash", "bank", "card"];
pub const FLIGHT_TYPES: &[&str] = &["one_way", "return"];
pub const VISA_STATUS: &[&str] = &["pending", "applied", "approved", "rejected"];
pub const LOAN_STATUS: &[&str] = &["open", "settled"];
pub const CHEQUE_TYPES: &[&str] = &["payable", "receivable"];
pub const CHEQUE_STATUS: &[&str] = &["pending", "cleared", "bounced", "cancelled"];

/// Residence processing stages in the order a file moves through them
pub const RESIDENCE_STAGES: &[&str] = &[
    "offer_letter",
    "insurance",
    "labour_card",
    "e_visa",
    "change_status",
    "medical",
    "emirates_id",
    "visa_stamping",
    "completed",
];

/// Pages that are not backed by an entity
pub const EXTRA_PAGES: &[&str] = &["analytics", "chat", "permissions"];

// Shared by every sales module
const fn money(name: &'static str) -> FieldDef {
    FieldDef::new(name, FieldKind::Decimal).required()
}

const fn passenger() -> FieldDef {
    FieldDef::new("passenger_name", FieldKind::Text).required().searchable()
}

const fn customer() -> FieldDef {
    FieldDef::new("customer_id", FieldKind::Integer).required().references(CUSTOMER)
}

const fn supplier() -> FieldDef {
    FieldDef::new("supp_id", FieldKind::Integer).required().references(SUPPLIER)
}

const fn currency() -> FieldDef {
    FieldDef::new("currency_id", FieldKind::Integer).required().references(CURRENCY)
}

const fn account() -> FieldDef {
    FieldDef::new("account_id", FieldKind::Integer).references(ACCOUNT)
}

const fn remarks() -> FieldDef {
    FieldDef::new("remarks", FieldKind::Text).max_len(2000)
}

pub static ENTITIES: &[EntityDef] = &[
    EntityDef {
        name: "branches",
        table: "branches",
        primary_key: "branch_id",
        page: "branches",
        fields: &[
            FieldDef::new("branch_name", FieldKind::Text).required().searchable(),
            FieldDef::new("address", FieldKind::Text).max_len(500),
        ],
        unique: &[&["branch_name"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: false,
    },
    EntityDef {
        name: "roles",
        table: "roles",
        primary_key: "role_id",
        page: "roles",
        fields: &[FieldDef::new("role_name", FieldKind::Text).required().searchable().max_len(100)],
        unique: &[&["role_name"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: false,
    },
    EntityDef {
        name: "staff",
        table: "staff",
        primary_key: "staff_id",
        page: "staff",
        fields: &[
            FieldDef::new("staff_name", FieldKind::Text).required().searchable(),
            FieldDef::new("staff_email", FieldKind::Email).required().searchable(),
            FieldDef::new("staff_phone", FieldKind::Phone).searchable(),
            FieldDef::new("password", FieldKind::Password).required().max_len(128),
            FieldDef::new("role_id", FieldKind::Integer).required().references(ROLE),
            FieldDef::new("branch_id", FieldKind::Integer).references(BRANCH),
            FieldDef::new("status", FieldKind::Enum(ACTIVE_STATUS)).filterable().default("active"),
        ],
        unique: &[&["staff_email"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: false,
    },
    EntityDef {
        name: "customers",
        table: "customers",
        primary_key: "customer_id",
        page: "customers",
        fields: &[
            FieldDef::new("customer_name", FieldKind::Text).required().searchable(),
            FieldDef::new("customer_phone", FieldKind::Phone).searchable(),
            FieldDef::new("customer_email", FieldKind::Email).searchable(),
            FieldDef::new("customer_address", FieldKind::Text).max_len(500),
            FieldDef::new("status", FieldKind::Enum(ACTIVE_STATUS)).filterable().default("active"),
        ],
        unique: &[&["customer_name", "customer_phone"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: true,
    },
    EntityDef {
        name: "suppliers",
        table: "suppliers",
        primary_key: "supp_id",
        page: "suppliers",
        fields: &[
            FieldDef::new("supp_name", FieldKind::Text).required().searchable(),
            FieldDef::new("supp_type", FieldKind::Enum(SUPPLIER_TYPES)).required().filterable(),
            FieldDef::new("supp_email", FieldKind::Email).searchable(),
            FieldDef::new("supp_phone", FieldKind::Phone).searchable(),
        ],
        unique: &[&["supp_name"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: false,
    },
    EntityDef {
        name: "currencies",
        table: "currencies",
        primary_key: "currency_id",
        page: "currencies",
        fields: &[
            FieldDef::new("currency_name", FieldKind::Text).required().searchable().max_len(50),
            FieldDef::new("currency_symbol", FieldKind::Text).required().max_len(10),
        ],
        unique: &[&["currency_name"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: false,
    },
    EntityDef {
        name: "accounts",
        table: "accounts",
        primary_key: "account_id",
        page: "accounts",
        fields: &[
            FieldDef::new("account_name", FieldKind::Text).required().searchable(),
            FieldDef::new("account_type", FieldKind::Enum(ACCOUNT_TYPES)).required().filterable(),
            FieldDef::new("account_number", FieldKind::Text).searchable().max_len(64),
        ],
        unique: &[&["account_name"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: false,
    },
    EntityDef {
        name: "tickets",
        table: "tickets",
        primary_key: "ticket_id",
        page: "tickets",
        fields: &[
            FieldDef::new("pnr", FieldKind::Text).required().searchable().max_len(20),
            passenger(),
            customer(),
            supplier(),
            FieldDef::new("from_place", FieldKind::Text).required().searchable().max_len(100),
            FieldDef::new("to_place", FieldKind::Text).required().searchable().max_len(100),
            FieldDef::new("flight_date", FieldKind::Date).required(),
            FieldDef::new("return_date", FieldKind::Date),
            FieldDef::new("flight_type", FieldKind::Enum(FLIGHT_TYPES)).filterable().default("one_way"),
            money("net_price"),
            money("sale"),
            currency(),
            remarks(),
        ],
        unique: &[&["pnr", "passenger_name"]],
        date_column: "created_at",
        date_ranges: &[("flight_date", "return_date")],
        stamp_creator: true,
    },
    EntityDef {
        name: "visas",
        table: "visas",
        primary_key: "visa_id",
        page: "visas",
        fields: &[
            passenger(),
            customer(),
            supplier(),
            FieldDef::new("country_name", FieldKind::Text).required().searchable().max_len(100),
            FieldDef::new("visa_type", FieldKind::Text).searchable().max_len(100),
            money("net_price"),
            money("sale"),
            currency(),
            FieldDef::new("status", FieldKind::Enum(VISA_STATUS)).filterable().default("pending"),
            remarks(),
        ],
        unique: &[],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: true,
    },
    EntityDef {
        name: "residences",
        table: "residences",
        primary_key: "residence_id",
        page: "residences",
        fields: &[
            passenger(),
            customer(),
            supplier(),
            FieldDef::new("nationality", FieldKind::Text).required().searchable().max_len(100),
            FieldDef::new("passport_number", FieldKind::Text).required().searchable().max_len(30),
            FieldDef::new("company_name", FieldKind::Text).searchable(),
            money("net_price"),
            money("sale"),
            currency(),
            FieldDef::new("stage", FieldKind::Enum(RESIDENCE_STAGES)).filterable().default("offer_letter"),
            remarks(),
        ],
        unique: &[&["passport_number"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: true,
    },
    EntityDef {
        name: "hotels",
        table: "hotels",
        primary_key: "hotel_id",
        page: "hotels",
        fields: &[
            FieldDef::new("hotel_name", FieldKind::Text).required().searchable(),
            passenger(),
            customer(),
            supplier(),
            FieldDef::new("check_in", FieldKind::Date).required(),
            FieldDef::new("check_out", FieldKind::Date).required(),
            money("net_price"),
            money("sale"),
            currency(),
            remarks(),
        ],
        unique: &[],
        date_column: "created_at",
        date_ranges: &[("check_in", "check_out")],
        stamp_creator: true,
    },
    EntityDef {
        name: "car_rentals",
        table: "car_rentals",
        primary_key: "car_id",
        page: "car_rentals",
        fields: &[
            FieldDef::new("car_description", FieldKind::Text).required().searchable(),
            passenger(),
            customer(),
            supplier(),
            FieldDef::new("pick_date", FieldKind::Date).required(),
            FieldDef::new("drop_date", FieldKind::Date).required(),
            money("net_price"),
            money("sale"),
            currency(),
            remarks(),
        ],
        unique: &[],
        date_column: "created_at",
        date_ranges: &[("pick_date", "drop_date")],
        stamp_creator: true,
    },
    EntityDef {
        name: "loans",
        table: "loans",
        primary_key: "loan_id",
        page: "loans",
        fields: &[
            customer(),
            money("amount"),
            currency(),
            account(),
            FieldDef::new("loan_date", FieldKind::Date).required(),
            FieldDef::new("status", FieldKind::Enum(LOAN_STATUS)).filterable().default("open"),
            remarks(),
        ],
        unique: &[],
        date_column: "loan_date",
        date_ranges: &[],
        stamp_creator: true,
    },
    EntityDef {
        name: "cheques",
        table: "cheques",
        primary_key: "cheque_id",
        page: "cheques",
        fields: &[
            FieldDef::new("cheque_number", FieldKind::Text).required().searchable().max_len(50),
            FieldDef::new("cheque_type", FieldKind::Enum(CHEQUE_TYPES)).required().filterable(),
            FieldDef::new("payee", FieldKind::Text).required().searchable(),
            FieldDef::new("bank_name", FieldKind::Text).required().searchable().max_len(100),
            money("amount"),
            FieldDef::new("cheque_date", FieldKind::Date).required(),
            currency(),
            FieldDef::new("status", FieldKind::Enum(CHEQUE_STATUS)).filterable().default("pending"),
        ],
        unique: &[&["cheque_number", "bank_name"]],
        date_column: "cheque_date",
        date_ranges: &[],
        stamp_creator: true,
    },
    EntityDef {
        name: "expense_types",
        table: "expense_types",
        primary_key: "expense_type_id",
        page: "expense_types",
        fields: &[FieldDef::new("expense_type", FieldKind::Text).required().searchable().max_len(100)],
        unique: &[&["expense_type"]],
        date_column: "created_at",
        date_ranges: &[],
        stamp_creator: false,
    },
    EntityDef {
        name: "expenses",
        table: "expenses",
        primary_key: "expense_id",
        page: "expenses",
        fields: &[
            FieldDef::new("expense_type_id", FieldKind::Integer).required().references(EXPENSE_TYPE),
            money("amount"),
            currency(),
            account(),
            FieldDef::new("expense_date", FieldKind::Date).required(),
            FieldDef::new("description", FieldKind::Text).searchable().max_len(1000),
        ],
        unique: &[],
        date_column: "expense_date",
        date_ranges: &[],
        stamp_creator: true,
    },
    EntityDef {
        name: "customer_payments",
        table: "customer_payments",
        primary_key: "payment_id",
        page: "customer_payments",
        fields: &[
            customer(),
            money("amount"),
            currency(),
            account(),
            FieldDef::new("payment_date", FieldKind::Date).required(),
            remarks(),
        ],
        unique: &[],
        date_column: "payment_date",
        date_ranges: &[],
        stamp_creator: true,
    },
];

/// Look up an entity by its URL name
pub fn find(name: &str) -> Option<&'static EntityDef> {
    ENTITIES.iter().find(|e| e.name == name)
}

/// Every page name the permission matrix knows about
pub fn pages() -> Vec<&'static str> {
    ENTITIES
        .iter()
        .map(|e| e.page)
        .chain(EXTRA_PAGES.iter().copied())
        .collect()
}

/// Entities holding a foreign key into `entity`, with the referencing field
pub fn dependents(entity: &EntityDef) -> Vec<(&'static EntityDef, &'static FieldDef)> {
    ENTITIES
        .iter()
        .flat_map(|e| e.fields.iter().map(move |f| (e, f)))
        .filter(|(_, f)| f.reference.map(|r| r.table == entity.table).unwrap_or(false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_and_pages_are_unique() {
        let names: HashSet<_> = ENTITIES.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), ENTITIES.len());
        let pages: HashSet<_> = pages().into_iter().collect();
        assert_eq!(pages.len(), ENTITIES.len() + EXTRA_PAGES.len());
    }

    #[test]
    fn references_point_at_registered_entities() {
        for entity in ENTITIES {
            for field in entity.fields {
                if let Some(r) = field.reference {
                    let target = find(r.entity).unwrap_or_else(|| panic!("{}.{} -> {}", entity.name, field.name, r.entity));
                    assert_eq!(target.table, r.table);
                    assert_eq!(target.primary_key, r.key);
                    assert!(target.field(r.label).is_some(), "label {} missing on {}", r.label, r.entity);
                }
            }
        }
    }

    #[test]
    fn unique_sets_and_ranges_name_real_fields() {
        for entity in ENTITIES {
            for set in entity.unique {
                for col in *set {
                    assert!(entity.field(col).is_some(), "{}: unique column {}", entity.name, col);
                }
            }
            for (start, end) in entity.date_ranges {
                assert_eq!(entity.field(start).map(|f| f.kind), Some(FieldKind::Date));
                assert_eq!(entity.field(end).map(|f| f.kind), Some(FieldKind::Date));
            }
            assert!(entity.sortable_column(entity.date_column).is_some(), "{}: date column", entity.name);
        }
    }

    #[test]
    fn customers_have_sales_dependents() {
        let customers = find("customers").unwrap();
        let deps: Vec<_> = dependents(customers).iter().map(|(e, _)| e.name).collect();
        for name in ["tickets", "visas", "residences", "hotels", "car_rentals", "loans", "customer_payments"] {
            assert!(deps.contains(&name), "missing dependent {}", name);
        }
        assert!(!deps.contains(&"staff"));
    }

    #[test]
    fn roles_are_referenced_by_staff() {
        let roles = find("roles").unwrap();
        let deps = dependents(roles);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].0.name, "staff");
        assert_eq!(deps[0].1.name, "role_id");
    }
}
