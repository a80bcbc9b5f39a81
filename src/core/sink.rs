//! Record sink seam: where finished expenses go

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

use crate::models::errors::AppResult;
use crate::models::types::ParsedExpense;

/// Persists one expense. Awaited to completion before the user gets a reply,
/// so the reply always reflects the real outcome. Never retried.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append_expense(&self, expense: &ParsedExpense) -> AppResult<()>;
}

/// Row layout shared by every sink: `[timestamp, amount, category, actor, description]`
pub fn expense_row(expense: &ParsedExpense) -> Vec<Value> {
    // Sheets stores numbers as doubles anyway; fall back to text if out of range
    let amount = expense
        .amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(expense.amount.to_string()));

    vec![
        json!(expense.timestamp_string()),
        amount,
        json!(expense.category),
        json!(expense.actor),
        json!(expense.description),
    ]
}
