//! Summary metrics and the chart-ready aggregate views of a `LedgerTable`.
//!
//! Everything here is a pure function of the ledger rows. Undefined amounts are skipped when
//! summing, so a group whose amounts are all undefined sums to zero.

use crate::model::LedgerRow;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// The headline numbers of the dashboard.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Every row counts, including rows whose amount is undefined.
    pub transaction_count: usize,
    pub latest_timestamp: Option<NaiveDateTime>,
}

/// Total debits on one calendar day.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Amounts summed by month and transaction type, pivoted so that each month is one row and each
/// type is one column.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct MonthlyMatrix {
    /// Column labels, sorted.
    types: Vec<String>,
    rows: Vec<MonthlyRow>,
}

/// One month of a `MonthlyMatrix`. `values` lines up with `MonthlyMatrix::types`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub month: String,
    pub values: Vec<Decimal>,
}

impl MonthlyMatrix {
    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn rows(&self) -> &[MonthlyRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a single cell, e.g. `get("2024-01", "debit")`.
    pub fn get(&self, month: &str, kind: &str) -> Option<Decimal> {
        let col = self.types.iter().position(|t| t == kind)?;
        self.rows
            .iter()
            .find(|row| row.month == month)
            .and_then(|row| row.values.get(col).copied())
    }
}

pub fn summarize(rows: &[LedgerRow]) -> Summary {
    Summary {
        total_debit: sum_amounts(rows.iter().filter(|r| r.is_debit())),
        total_credit: sum_amounts(rows.iter().filter(|r| r.is_credit())),
        transaction_count: rows.len(),
        latest_timestamp: rows.iter().filter_map(LedgerRow::date_time).max(),
    }
}

/// Debits grouped by date, ascending. Rows without a date are left out.
pub fn daily_debit_series(rows: &[LedgerRow]) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.is_debit()) {
        if let Some(date) = row.date() {
            *by_date.entry(date).or_default() += row.amount().unwrap_or_default();
        }
    }
    by_date
        .into_iter()
        .map(|(date, amount)| DailyPoint { date, amount })
        .collect()
}

/// Sums amounts by (month, type) and pivots the result. Months are ordered by plain string
/// comparison, so the `"NaT"` bucket lands wherever it sorts among the `YYYY-MM` labels. Missing
/// combinations are filled with zero.
pub fn monthly_type_matrix(rows: &[LedgerRow]) -> MonthlyMatrix {
    let mut groups: BTreeMap<&str, BTreeMap<&str, Decimal>> = BTreeMap::new();
    let mut types: BTreeSet<&str> = BTreeSet::new();
    for row in rows {
        types.insert(row.kind());
        *groups
            .entry(row.month())
            .or_default()
            .entry(row.kind())
            .or_default() += row.amount().unwrap_or_default();
    }

    let rows = groups
        .into_iter()
        .map(|(month, sums)| MonthlyRow {
            month: month.to_string(),
            values: types
                .iter()
                .map(|kind| sums.get(kind).copied().unwrap_or_default())
                .collect(),
        })
        .collect();

    MonthlyMatrix {
        types: types.into_iter().map(str::to_string).collect(),
        rows,
    }
}

fn sum_amounts<'a>(rows: impl Iterator<Item = &'a LedgerRow>) -> Decimal {
    rows.filter_map(LedgerRow::amount).sum()
}
