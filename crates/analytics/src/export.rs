//! Flat, camelCase record shapes for handing a run to spreadsheets or other tools.

use crate::report::PortfolioResult;
use crate::returns::InstrumentSummary;
use core_types::AnnualReturnRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub summary: ExportSummary,
    pub instruments: Vec<ExportInstrumentRow>,
    pub annual_returns: Vec<ExportAnnualRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub total_invested: Decimal,
    pub final_amount: Decimal,
    pub total_return_pct: Decimal,
    pub annualized_return_pct: Option<Decimal>,
    pub standard_deviation_pct: Option<Decimal>,
    pub best_year: Option<i32>,
    pub best_year_return_pct: Option<Decimal>,
    pub worst_year: Option<i32>,
    pub worst_year_return_pct: Option<Decimal>,
    pub sharpe_ratio: Option<Decimal>,
    pub sortino_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInstrumentRow {
    pub symbol: String,
    pub allocation_pct: Decimal,
    pub simple_return_pct: Option<Decimal>,
    pub annualized_return_pct: Option<Decimal>,
    pub initial_investment: Decimal,
    pub final_value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAnnualRow {
    pub year: i32,
    pub symbol: String,
    pub return_pct: Decimal,
    /// The weighted portfolio return of the same year.
    pub portfolio_return_pct: Option<Decimal>,
}

impl ExportReport {
    pub fn new(
        result: &PortfolioResult,
        instruments: &[InstrumentSummary],
        annual_returns: &[AnnualReturnRecord],
        portfolio_annual_returns: &[AnnualReturnRecord],
    ) -> Self {
        let portfolio_by_year: HashMap<i32, Decimal> = portfolio_annual_returns
            .iter()
            .map(|r| (r.year, r.return_pct))
            .collect();

        Self {
            summary: ExportSummary::from(result),
            instruments: instruments.iter().map(ExportInstrumentRow::from).collect(),
            annual_returns: annual_returns
                .iter()
                .map(|r| ExportAnnualRow {
                    year: r.year,
                    symbol: r.symbol.clone(),
                    return_pct: r.return_pct,
                    portfolio_return_pct: portfolio_by_year.get(&r.year).copied(),
                })
                .collect(),
        }
    }
}

impl From<&PortfolioResult> for ExportSummary {
    fn from(result: &PortfolioResult) -> Self {
        Self {
            total_invested: result.cumulative_investment,
            final_amount: result.final_amount,
            total_return_pct: result.total_return_pct,
            annualized_return_pct: result.annualized_return_pct,
            standard_deviation_pct: result.standard_deviation_pct,
            best_year: result.max_return_year.as_ref().map(|r| r.year),
            best_year_return_pct: result.max_return_year.as_ref().map(|r| r.return_pct),
            worst_year: result.min_return_year.as_ref().map(|r| r.year),
            worst_year_return_pct: result.min_return_year.as_ref().map(|r| r.return_pct),
            sharpe_ratio: result.sharpe_ratio,
            sortino_ratio: result.sortino_ratio,
        }
    }
}

impl From<&InstrumentSummary> for ExportInstrumentRow {
    fn from(summary: &InstrumentSummary) -> Self {
        Self {
            symbol: summary.symbol.clone(),
            allocation_pct: summary.allocation,
            simple_return_pct: summary.simple_return_pct,
            annualized_return_pct: summary.annualized_return_pct,
            initial_investment: summary.initial_investment,
            final_value: summary.final_value,
        }
    }
}
