use crate::{
    extractor::{Authorized, DeleteDrinks, GetDrinks, GetDrinksDetail, PatchDrinks, PostDrinks},
    server::ApiError,
    store::{Drink, DrinkPatch, DrinkStore, NewDrink, ShortDrink},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::instrument;

#[instrument(skip_all)]
pub async fn list_drinks(
    _auth: Authorized<GetDrinks>,
    State(store): State<DrinkStore>,
) -> Json<Value> {
    let drinks: Vec<ShortDrink> = store.list().await.iter().map(Drink::short).collect();

    Json(json!({
        "success": true,
        "drinks": drinks,
    }))
}

#[instrument(skip_all)]
pub async fn drinks_detail(
    _auth: Authorized<GetDrinksDetail>,
    State(store): State<DrinkStore>,
) -> Json<Value> {
    let drinks: Vec<Drink> = store.list().await.iter().map(Drink::long).collect();

    Json(json!({
        "success": true,
        "drinks": drinks,
    }))
}

#[instrument(skip_all)]
pub async fn create_drink(
    auth: Authorized<PostDrinks>,
    State(store): State<DrinkStore>,
    body: Result<Json<NewDrink>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(new_drink) = body.map_err(|err| ApiError::Unprocessable(err.to_string()))?;
    let drink = store.create(new_drink).await?;

    tracing::info!(
        id = drink.id,
        title = %drink.title,
        by = %auth.claims().sub,
        "drink created"
    );

    Ok(Json(json!({
        "success": true,
        "drinks": drink.long(),
    })))
}

#[instrument(skip_all)]
pub async fn update_drink(
    auth: Authorized<PatchDrinks>,
    Path(id): Path<String>,
    State(store): State<DrinkStore>,
    body: Result<Json<DrinkPatch>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    store.get(id).await?;
    let Json(patch) = body.map_err(|err| ApiError::Unprocessable(err.to_string()))?;
    let drink = store.update(id, patch).await?;

    tracing::info!(id = drink.id, by = %auth.claims().sub, "drink updated");

    Ok(Json(json!({
        "success": true,
        "updated": drink.id,
    })))
}

#[instrument(skip_all)]
pub async fn delete_drink(
    auth: Authorized<DeleteDrinks>,
    Path(id): Path<String>,
    State(store): State<DrinkStore>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    store.delete(id).await?;

    tracing::info!(id, by = %auth.claims().sub, "drink deleted");

    Ok(Json(json!({
        "success": true,
        "delete": id,
    })))
}

// Ids that cannot name a row are reported like missing rows.
fn parse_id(id: &str) -> Result<u32, ApiError> {
    id.parse().map_err(|_| ApiError::NotFound)
}
