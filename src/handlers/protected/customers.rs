// GET /api/customers/:id/balance - what a customer owes across every module

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Extension,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;
use std::collections::BTreeMap;

use crate::analytics::SALES_MODULES;
use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::path_params;
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::permissions::{require, Action};

#[derive(Debug, Serialize, PartialEq)]
pub struct CustomerBalance {
    pub customer_id: i64,
    pub customer_name: String,
    pub sales: BTreeMap<&'static str, Decimal>,
    pub total_sales: Decimal,
    pub loans: Decimal,
    pub payments: Decimal,
    pub balance: Decimal,
}

impl CustomerBalance {
    fn new(
        customer_id: i64,
        customer_name: String,
        sales: BTreeMap<&'static str, Decimal>,
        loans: Decimal,
        payments: Decimal,
    ) -> Self {
        let total_sales: Decimal = sales.values().copied().sum();
        Self {
            customer_id,
            customer_name,
            sales,
            total_sales,
            loans,
            payments,
            balance: total_sales + loans - payments,
        }
    }
}

fn balance_sql() -> String {
    let mut columns: Vec<String> = SALES_MODULES
        .iter()
        .map(|m| format!("(SELECT COALESCE(SUM(sale), 0) FROM {m} WHERE customer_id = $1) AS {m}"))
        .collect();
    columns.push("(SELECT COALESCE(SUM(amount), 0) FROM loans WHERE customer_id = $1) AS loans".to_string());
    columns.push(
        "(SELECT COALESCE(SUM(amount), 0) FROM customer_payments WHERE customer_id = $1) AS payments".to_string(),
    );
    format!("SELECT {}", columns.join(", "))
}

pub async fn balance(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<CustomerBalance> {
    let customer_id = path_params(path)?;
    require(&state, &staff, "customers", Action::View).await?;

    let name: Option<String> = sqlx::query_scalar("SELECT customer_name FROM customers WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_optional(&state.pool)
        .await?;
    let Some(customer_name) = name else {
        return Err(ApiError::not_found(format!("customers {} not found", customer_id)));
    };

    let row = sqlx::query(&balance_sql()).bind(customer_id).fetch_one(&state.pool).await?;
    let mut sales = BTreeMap::new();
    for module in SALES_MODULES {
        sales.insert(*module, row.try_get::<Decimal, _>(*module)?);
    }

    Ok(ApiResponse::success(CustomerBalance::new(
        customer_id,
        customer_name,
        sales,
        row.try_get("loans")?,
        row.try_get("payments")?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_adds_loans_and_subtracts_payments() {
        let sales = [("tickets", Decimal::new(120000, 2)), ("visas", Decimal::new(30000, 2))]
            .into_iter()
            .collect();
        let b = CustomerBalance::new(3, "Omar".into(), sales, Decimal::new(500, 0), Decimal::new(1000, 0));
        assert_eq!(b.total_sales, Decimal::new(1500, 0));
        assert_eq!(b.balance, Decimal::new(1000, 0));
    }

    #[test]
    fn sql_covers_every_module() {
        let sql = balance_sql();
        for m in SALES_MODULES {
            assert!(sql.contains(&format!("FROM {m} WHERE customer_id = $1) AS {m}")));
        }
        assert!(sql.contains("FROM customer_payments"));
    }
}
