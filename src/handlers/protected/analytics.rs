// GET /api/analytics/* - dashboard rollups

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;

use crate::analytics::{
    fill_months, monthly_sql, rank_staff, staff_sql, totals_sql, DateWindow, ModuleSummary, MonthBucket,
    Period, SalesTotals, StaffPerformance, Summary, SALES_MODULES,
};
use crate::app::AppState;
use crate::database::QueryTimer;
use crate::error::ApiError;
use crate::handlers::query_params;
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::permissions::{require, Action};

const PAGE: &str = "analytics";
const SALES_DATE: &str = "created_at";

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub year: Option<String>,
}

impl AnalyticsQuery {
    fn date(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>, ApiError> {
        match value.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("{} must be a date (YYYY-MM-DD)", name))),
            None => Ok(None),
        }
    }

    fn period(&self) -> Result<Period, ApiError> {
        let from = Self::date(self.from.as_deref(), "from")?;
        let to = Self::date(self.to.as_deref(), "to")?;
        Period::parse(self.period.as_deref(), from, to).map_err(ApiError::bad_request)
    }

    fn year(&self, today: NaiveDate) -> Result<i32, ApiError> {
        match self.year.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(today.year()),
            Some(s) => match s.parse::<i32>() {
                Ok(y) if (2000..=2100).contains(&y) => Ok(y),
                _ => Err(ApiError::bad_request("year must be between 2000 and 2100")),
            },
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn sales_totals(pool: &PgPool, module: &str, window: DateWindow) -> Result<SalesTotals, ApiError> {
    let row = sqlx::query(&totals_sql(module, SALES_DATE))
        .bind(window.from)
        .bind(window.end_exclusive())
        .fetch_one(pool)
        .await?;
    Ok(SalesTotals::new(row.try_get("count")?, row.try_get("sales")?, row.try_get("cost")?))
}

async fn expense_total(pool: &PgPool, window: DateWindow) -> Result<Decimal, ApiError> {
    let total: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE expense_date >= $1 AND expense_date < $2",
    )
    .bind(window.from)
    .bind(window.end_exclusive())
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// GET /api/analytics/summary?period=today|week|month|year|custom&from&to
pub async fn summary(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<Summary> {
    let query = query_params(query)?;
    let period = query.period()?;
    require(&state, &staff, PAGE, Action::View).await?;

    let (current, previous) = period.windows(today());
    let _timer = QueryTimer::start("analytics summary", &state.config.database);

    let mut modules = Vec::with_capacity(SALES_MODULES.len());
    for module in SALES_MODULES {
        let now = sales_totals(&state.pool, module, current).await?;
        let before = sales_totals(&state.pool, module, previous).await?;
        modules.push(ModuleSummary::new(*module, now, before));
    }
    let expenses = (
        expense_total(&state.pool, current).await?,
        expense_total(&state.pool, previous).await?,
    );

    Ok(ApiResponse::success(Summary::build(&period, (current, previous), modules, expenses)))
}

#[derive(Debug, Serialize)]
pub struct ExpenseMonth {
    pub month: u32,
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub modules: BTreeMap<&'static str, Vec<MonthBucket>>,
    pub expenses: Vec<ExpenseMonth>,
}

/// GET /api/analytics/monthly?year=YYYY - twelve zero-filled buckets per module
pub async fn monthly(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<MonthlyReport> {
    let query = query_params(query)?;
    let year = query.year(today())?;
    require(&state, &staff, PAGE, Action::View).await?;

    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| ApiError::bad_request("invalid year"))?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(|| ApiError::bad_request("invalid year"))?;
    let _timer = QueryTimer::start("analytics monthly", &state.config.database);

    let mut modules = BTreeMap::new();
    for module in SALES_MODULES {
        let rows = sqlx::query(&monthly_sql(module, SALES_DATE))
            .bind(start)
            .bind(end)
            .fetch_all(&state.pool)
            .await?;
        let mut parsed: Vec<(u32, i64, Decimal, Decimal)> = Vec::with_capacity(rows.len());
        for row in &rows {
            let month: i32 = row.try_get("month")?;
            parsed.push((month as u32, row.try_get("count")?, row.try_get("sales")?, row.try_get("profit")?));
        }
        modules.insert(*module, fill_months(parsed));
    }

    let rows = sqlx::query(
        "SELECT EXTRACT(MONTH FROM expense_date)::INT AS month, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS amount \
         FROM expenses WHERE expense_date >= $1 AND expense_date < $2 GROUP BY 1 ORDER BY 1",
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.pool)
    .await?;
    let mut parsed: Vec<(u32, i64, Decimal, Decimal)> = Vec::with_capacity(rows.len());
    for row in &rows {
        let month: i32 = row.try_get("month")?;
        parsed.push((month as u32, row.try_get("count")?, row.try_get("amount")?, Decimal::ZERO));
    }
    let expenses = fill_months(parsed)
        .into_iter()
        .map(|b| ExpenseMonth {
            month: b.month,
            count: b.count,
            amount: b.sales,
        })
        .collect();

    Ok(ApiResponse::success(MonthlyReport { year, modules, expenses }))
}

#[derive(Debug, Serialize)]
pub struct StaffReport {
    pub period: &'static str,
    pub window: DateWindow,
    pub staff: Vec<StaffPerformance>,
}

/// GET /api/analytics/staff?period=... - sales per creating staff member
pub async fn staff(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthStaff>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<StaffReport> {
    let query = query_params(query)?;
    let period = query.period()?;
    require(&state, &caller, PAGE, Action::View).await?;

    let (window, _) = period.windows(today());
    let _timer = QueryTimer::start("analytics staff", &state.config.database);

    let mut rows: Vec<(&'static str, i64, i64, Decimal)> = Vec::new();
    for module in SALES_MODULES {
        let fetched = sqlx::query(&staff_sql(module, SALES_DATE))
            .bind(window.from)
            .bind(window.end_exclusive())
            .fetch_all(&state.pool)
            .await?;
        for row in &fetched {
            rows.push((*module, row.try_get("staff_id")?, row.try_get("count")?, row.try_get("sales")?));
        }
    }
    let mut ranked = rank_staff(rows);

    let ids: Vec<i64> = ranked.iter().map(|s| s.staff_id).collect();
    if !ids.is_empty() {
        let names = sqlx::query("SELECT staff_id, staff_name FROM staff WHERE staff_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&state.pool)
            .await?;
        for row in &names {
            let id: i64 = row.try_get("staff_id")?;
            let name: String = row.try_get("staff_name")?;
            if let Some(s) = ranked.iter_mut().find(|s| s.staff_id == id) {
                s.staff_name = Some(name);
            }
        }
    }

    Ok(ApiResponse::success(StaffReport {
        period: period.name(),
        window,
        staff: ranked,
    }))
}
