use analytics::{InstrumentSummary, PortfolioResult};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::{AnnualReturnRecord, BacktestWarning};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn amount(value: Decimal, currency: &str) -> String {
    format!("{:.2} {}", value.round_dp(2), currency)
}

pub fn pct(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v.round_dp(2)))
}

pub fn ratio(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v.round_dp(2)))
}

fn year(record: Option<&AnnualReturnRecord>) -> String {
    record.map_or_else(
        || "-".to_string(),
        |r| format!("{} ({})", r.year, pct(Some(r.return_pct))),
    )
}

/// Headline figures, with the benchmark in a second column when present.
pub fn summary_table(
    result: &PortfolioResult,
    benchmark: Option<(&str, &PortfolioResult)>,
    currency: &str,
) -> Table {
    let mut header = vec!["Metric".to_string(), "Portfolio".to_string()];
    if let Some((symbol, _)) = benchmark {
        header.push(format!("Benchmark ({symbol})"));
    }
    let mut table = new_table(header);

    let rows: [(&str, fn(&PortfolioResult, &str) -> String); 11] = [
        ("Initial amount", |r, c| amount(r.initial_amount, c)),
        ("Total invested", |r, c| amount(r.cumulative_investment, c)),
        ("Final amount", |r, c| amount(r.final_amount, c)),
        ("Profit", |r, c| amount(r.profit(), c)),
        ("Total return", |r, _| pct(Some(r.total_return_pct))),
        ("Annualized return", |r, _| pct(r.annualized_return_pct)),
        ("Standard deviation", |r, _| pct(r.standard_deviation_pct)),
        ("Best year", |r, _| year(r.max_return_year.as_ref())),
        ("Worst year", |r, _| year(r.min_return_year.as_ref())),
        ("Sharpe ratio", |r, _| ratio(r.sharpe_ratio)),
        ("Sortino ratio", |r, _| ratio(r.sortino_ratio)),
    ];

    for (label, value) in rows {
        let mut row = vec![
            Cell::new(label),
            Cell::new(value(result, currency)).set_alignment(CellAlignment::Right),
        ];
        if let Some((_, bench)) = benchmark {
            row.push(Cell::new(value(bench, currency)).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }
    table
}

pub fn instrument_table(instruments: &[InstrumentSummary], currency: &str) -> Table {
    let mut table = new_table(
        [
            "Symbol", "Allocation", "Start", "Start price", "End", "End price", "Return",
            "Annualized", "Invested", "Final value",
        ]
        .map(String::from)
        .to_vec(),
    );

    for s in instruments {
        table.add_row(vec![
            s.symbol.clone(),
            format!("{}%", s.allocation.normalize()),
            s.start_date.to_string(),
            format!("{:.2}", s.start_price.round_dp(2)),
            s.end_date.to_string(),
            format!("{:.2}", s.end_price.round_dp(2)),
            pct(s.simple_return_pct),
            pct(s.annualized_return_pct),
            amount(s.initial_investment, currency),
            s.final_value.map_or_else(|| "-".to_string(), |v| amount(v, currency)),
        ]);
    }
    table
}

/// One row per year, one column per symbol, the weighted portfolio last.
pub fn annual_table(
    symbols: &[String],
    records: &[AnnualReturnRecord],
    portfolio: &[AnnualReturnRecord],
) -> Table {
    let mut header = vec!["Year".to_string()];
    header.extend(symbols.iter().cloned());
    header.push("Portfolio".to_string());
    let mut table = new_table(header);

    let mut by_year: BTreeMap<i32, BTreeMap<&str, Decimal>> = BTreeMap::new();
    for record in records {
        by_year
            .entry(record.year)
            .or_default()
            .insert(record.symbol.as_str(), record.return_pct);
    }
    let portfolio_by_year: BTreeMap<i32, Decimal> =
        portfolio.iter().map(|r| (r.year, r.return_pct)).collect();

    for (year, returns) in &by_year {
        let mut row = vec![year.to_string()];
        row.extend(symbols.iter().map(|s| pct(returns.get(s.as_str()).copied())));
        row.push(pct(portfolio_by_year.get(year).copied()));
        table.add_row(row);
    }
    table
}

/// Collapses per-month price fallbacks into one line per symbol.
pub fn warning_lines(warnings: &[BacktestWarning]) -> Vec<String> {
    let mut missing_months: BTreeMap<&str, usize> = BTreeMap::new();
    let mut lines = Vec::new();

    for warning in warnings {
        match warning {
            BacktestWarning::MissingPrice { symbol, .. } => {
                *missing_months.entry(symbol.as_str()).or_default() += 1;
            }
            other => lines.push(other.to_string()),
        }
    }
    lines.extend(missing_months.into_iter().map(|(symbol, months)| {
        format!("{symbol}: {months} month(s) without a usable close, growth fallback applied")
    }));
    lines
}

/// Warnings of the benchmark run, marked so they are not read as portfolio ones.
pub fn benchmark_warning_lines(symbol: &str, warnings: &[BacktestWarning]) -> Vec<String> {
    warning_lines(warnings)
        .into_iter()
        .map(|line| format!("(benchmark {symbol}) {line}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{MonthKey, PORTFOLIO_SYMBOL};
    use rust_decimal_macros::dec;

    #[test]
    fn undefined_metrics_render_as_dash() {
        assert_eq!(pct(None), "-");
        assert_eq!(ratio(None), "-");
        assert_eq!(pct(Some(dec!(12.346))), "12.35%");
        assert_eq!(amount(dec!(10000), "USD"), "10000.00 USD");
    }

    #[test]
    fn missing_price_warnings_are_grouped() {
        let month = |m| MonthKey::new(2020, m).unwrap();
        let warnings = vec![
            BacktestWarning::MissingPrice { symbol: "A".to_string(), month: month(1) },
            BacktestWarning::DataUnavailable {
                symbol: "B".to_string(),
                reason: "unknown symbol".to_string(),
            },
            BacktestWarning::MissingPrice { symbol: "A".to_string(), month: month(2) },
        ];

        let lines = warning_lines(&warnings);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("B: data unavailable"));
        assert!(lines[1].starts_with("A: 2 month(s)"));
    }

    #[test]
    fn annual_table_has_a_row_per_year() {
        let record = |year, symbol: &str, r| AnnualReturnRecord {
            year,
            symbol: symbol.to_string(),
            return_pct: r,
        };
        let table = annual_table(
            &["A".to_string()],
            &[record(2020, "A", dec!(10)), record(2021, "A", dec!(-5))],
            &[
                record(2020, PORTFOLIO_SYMBOL, dec!(10)),
                record(2021, PORTFOLIO_SYMBOL, dec!(-5)),
            ],
        );
        assert_eq!(table.row_iter().count(), 2);
    }

    #[test]
    fn benchmark_warnings_name_the_benchmark() {
        let month = |m| MonthKey::new(2020, m).unwrap();
        let warnings = vec![
            BacktestWarning::MissingPrice { symbol: "SPY".to_string(), month: month(3) },
            BacktestWarning::InsufficientHistory {
                symbol: "SPY".to_string(),
                year: 2021,
                observations: 1,
            },
        ];

        let lines = benchmark_warning_lines("SPY", &warnings);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("(benchmark SPY) SPY: ")));
        assert!(lines[1].contains("1 month(s)"));
    }
}
