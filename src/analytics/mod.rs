//! Date-windowed rollups behind the dashboard endpoints.

pub mod period;

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub use period::{DateWindow, Period};

/// Entities that record a sale (`net_price`, `sale`, `created_by`)
pub const SALES_MODULES: &[&str] = &["tickets", "visas", "residences", "hotels", "car_rentals"];

/// Percentage change from `previous` to `current`, rounded to 2 places.
/// A zero baseline reports 100 when anything happened and 0 otherwise.
pub fn percent_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO { Decimal::ONE_HUNDRED } else { Decimal::ZERO };
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Count and money totals of one sales module over one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SalesTotals {
    pub count: i64,
    pub sales: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

impl SalesTotals {
    pub fn new(count: i64, sales: Decimal, cost: Decimal) -> Self {
        Self {
            count,
            sales,
            cost,
            profit: sales - cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changes {
    pub count: Decimal,
    pub sales: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSummary {
    pub module: &'static str,
    pub current: SalesTotals,
    pub previous: SalesTotals,
    pub change: Changes,
}

impl ModuleSummary {
    pub fn new(module: &'static str, current: SalesTotals, previous: SalesTotals) -> Self {
        let change = Changes {
            count: percent_change(Decimal::from(current.count), Decimal::from(previous.count)),
            sales: percent_change(current.sales, previous.sales),
            profit: percent_change(current.profit, previous.profit),
        };
        Self {
            module,
            current,
            previous,
            change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummary {
    pub current: Decimal,
    pub previous: Decimal,
    pub change: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub period: &'static str,
    pub current_window: DateWindow,
    pub previous_window: DateWindow,
    pub modules: Vec<ModuleSummary>,
    pub expenses: ExpenseSummary,
    pub net_profit: NetProfit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetProfit {
    pub current: Decimal,
    pub previous: Decimal,
    pub change: Decimal,
}

impl Summary {
    /// Assemble the dashboard from per-module totals and expense totals
    pub fn build(
        period: &Period,
        windows: (DateWindow, DateWindow),
        modules: Vec<ModuleSummary>,
        expenses: (Decimal, Decimal),
    ) -> Self {
        let profit_current: Decimal = modules.iter().map(|m| m.current.profit).sum();
        let profit_previous: Decimal = modules.iter().map(|m| m.previous.profit).sum();
        let net_current = profit_current - expenses.0;
        let net_previous = profit_previous - expenses.1;

        Self {
            period: period.name(),
            current_window: windows.0,
            previous_window: windows.1,
            modules,
            expenses: ExpenseSummary {
                current: expenses.0,
                previous: expenses.1,
                change: percent_change(expenses.0, expenses.1),
            },
            net_profit: NetProfit {
                current: net_current,
                previous: net_previous,
                change: percent_change(net_current, net_previous),
            },
        }
    }
}

/// One calendar month of a module's activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthBucket {
    pub month: u32,
    pub count: i64,
    pub sales: Decimal,
    pub profit: Decimal,
}

/// Expand sparse `(month, count, sales, profit)` rows into twelve buckets
pub fn fill_months(rows: impl IntoIterator<Item = (u32, i64, Decimal, Decimal)>) -> Vec<MonthBucket> {
    let mut buckets: Vec<MonthBucket> = (1..=12).map(|month| MonthBucket { month, ..Default::default() }).collect();
    for (month, count, sales, profit) in rows {
        if let Some(bucket) = buckets.get_mut(month.wrapping_sub(1) as usize) {
            bucket.count += count;
            bucket.sales += sales;
            bucket.profit += profit;
        }
    }
    buckets
}

/// Sales attributed to one staff member over a window
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StaffPerformance {
    pub staff_id: i64,
    pub staff_name: Option<String>,
    pub count: i64,
    pub sales: Decimal,
    pub modules: BTreeMap<&'static str, StaffModuleSales>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StaffModuleSales {
    pub count: i64,
    pub sales: Decimal,
}

/// Merge per-module `(staff_id, count, sales)` rows, best seller first.
/// Ties keep the lower staff id first.
pub fn rank_staff(rows: impl IntoIterator<Item = (&'static str, i64, i64, Decimal)>) -> Vec<StaffPerformance> {
    let mut by_staff: HashMap<i64, StaffPerformance> = HashMap::new();
    for (module, staff_id, count, sales) in rows {
        let entry = by_staff.entry(staff_id).or_insert_with(|| StaffPerformance {
            staff_id,
            ..Default::default()
        });
        entry.count += count;
        entry.sales += sales;
        let totals = entry.modules.entry(module).or_default();
        totals.count += count;
        totals.sales += sales;
    }

    let mut ranked: Vec<StaffPerformance> = by_staff.into_values().collect();
    ranked.sort_by(|a, b| b.sales.cmp(&a.sales).then(a.staff_id.cmp(&b.staff_id)));
    ranked
}

/// Sales totals of `table` between `$1` (inclusive) and `$2` (exclusive)
pub fn totals_sql(table: &str, date_column: &str) -> String {
    format!(
        "SELECT COUNT(*) AS count, COALESCE(SUM(sale), 0) AS sales, COALESCE(SUM(net_price), 0) AS cost \
         FROM {table} WHERE {date_column} >= $1 AND {date_column} < $2"
    )
}

/// Monthly sales rollup of `table` for the year starting at `$1`
pub fn monthly_sql(table: &str, date_column: &str) -> String {
    format!(
        "SELECT EXTRACT(MONTH FROM {date_column})::INT AS month, COUNT(*) AS count, \
         COALESCE(SUM(sale), 0) AS sales, COALESCE(SUM(sale - net_price), 0) AS profit \
         FROM {table} WHERE {date_column} >= $1 AND {date_column} < $2 GROUP BY 1 ORDER BY 1"
    )
}

/// Per-creator sales of `table` between `$1` and `$2`
pub fn staff_sql(table: &str, date_column: &str) -> String {
    format!(
        "SELECT created_by AS staff_id, COUNT(*) AS count, COALESCE(SUM(sale), 0) AS sales \
         FROM {table} WHERE {date_column} >= $1 AND {date_column} < $2 AND created_by IS NOT NULL \
         GROUP BY created_by"
    )
}
