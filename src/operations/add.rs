use crate::api::schema::NewTransaction;
use crate::error::{AppError, Result};
use crate::models::transaction::Category;
use rust_decimal::{Decimal, RoundingStrategy};

const MAX_NOTE_LEN: usize = 255;

/// Build a new-transaction request from `category, type, amount[, note]`.
pub fn create_transaction(user_id: i64, input: &str) -> Result<NewTransaction> {
    let parts: Vec<&str> = input.splitn(4, ',').map(|s| s.trim()).collect();
    if parts.len() < 3 {
        return Err(AppError::Validation(format!(
            "Invalid number of details provided. Expected at least 3 details separated by commas but got {}",
            parts.len()
        )));
    }

    let category = parts[0].parse::<Category>().map_err(|_| {
        AppError::Validation("Invalid category. Use 'income' or 'expense'.".to_string())
    })?;

    let kind = match category
        .allowed_types()
        .iter()
        .find(|t| t.eq_ignore_ascii_case(parts[1]))
    {
        Some(kind) => kind.to_string(),
        None => {
            return Err(AppError::Validation(format!(
                "Invalid type '{}' for {}. Choose one of: {}",
                parts[1],
                category,
                category.allowed_types().join(", ")
            )));
        }
    };

    let amount = parts[2].parse::<Decimal>().map_err(|_| {
        AppError::Validation(format!(
            "Invalid amount format {}. Please provide a valid decimal number.",
            parts[2]
        ))
    })?;
    if amount < Decimal::ZERO {
        return Err(AppError::Validation("Amount cannot be negative.".to_string()));
    }

    let notes = parts.get(3).map(|n| n.to_string()).unwrap_or_default();
    if notes.len() > MAX_NOTE_LEN {
        return Err(AppError::Validation("Note too long".to_string()));
    }

    Ok(NewTransaction {
        user_id,
        category,
        kind,
        amount: amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        notes,
    })
}
