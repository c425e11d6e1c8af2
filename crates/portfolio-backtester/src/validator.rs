use core_types::{CoreError, PortfolioConfig};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Rejects a malformed portfolio before anything is fetched or computed.
///
/// Allocations are raw weights and are not required to sum to 100.
pub fn validate(config: &PortfolioConfig) -> Result<(), CoreError> {
    if config.start_date >= config.end_date {
        return Err(CoreError::InvalidWindow(format!(
            "start date {} must be before end date {}",
            config.start_date, config.end_date
        )));
    }
    if config.initial_amount <= Decimal::ZERO {
        return Err(CoreError::InvalidAllocation(format!(
            "initial amount must be greater than 0, got {}",
            config.initial_amount
        )));
    }
    if config.monthly_contribution < Decimal::ZERO {
        return Err(CoreError::InvalidAllocation(format!(
            "monthly contribution must not be negative, got {}",
            config.monthly_contribution
        )));
    }
    if config.holdings.is_empty() {
        return Err(CoreError::InvalidAllocation(
            "the portfolio holds no instruments".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for holding in &config.holdings {
        if holding.symbol.trim().is_empty() {
            return Err(CoreError::InvalidAllocation(
                "every holding needs a symbol".to_string(),
            ));
        }
        if holding.allocation < Decimal::ZERO || holding.allocation > Decimal::ONE_HUNDRED {
            return Err(CoreError::InvalidAllocation(format!(
                "allocation for {} must be between 0 and 100, got {}",
                holding.symbol, holding.allocation
            )));
        }
        if !seen.insert(holding.symbol.as_str()) {
            return Err(CoreError::InvalidAllocation(format!(
                "{} is listed more than once",
                holding.symbol
            )));
        }
    }

    Ok(())
}
