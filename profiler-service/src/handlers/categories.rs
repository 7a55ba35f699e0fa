use axum::{extract::State, Json};

use crate::models::CategoryMeta;
use crate::startup::AppState;

/// Categories that can be selected, i.e. those with questions in the bank.
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategoryMeta>> {
    Json(state.bank.categories().into_iter().copied().collect())
}
