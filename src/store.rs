use async_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;

pub const MAX_TITLE_LEN: usize = 80;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("drink {0} not found")]
    NotFound(u32),
    #[error("a drink titled `{0}` already exists")]
    DuplicateTitle(String),
    #[error("drink title must be 1 to 80 characters")]
    InvalidTitle,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Ingredient as shown to customers: the colour band and its size only.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

/// A request body may carry a single ingredient or a full recipe.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Recipe {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl From<Recipe> for Vec<Ingredient> {
    fn from(recipe: Recipe) -> Self {
        match recipe {
            Recipe::Many(ingredients) => ingredients,
            Recipe::One(ingredient) => vec![ingredient],
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Drink {
    pub id: u32,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ShortDrink {
    pub id: u32,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| ShortIngredient {
                    color: ingredient.color.clone(),
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }

    pub fn long(&self) -> Drink {
        self.clone()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Recipe,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

#[derive(Debug, Default)]
struct Table {
    next_id: u32,
    drinks: BTreeMap<u32, Drink>,
}

impl Table {
    fn title_taken(&self, title: &str, except: Option<u32>) -> bool {
        self.drinks
            .values()
            .any(|drink| drink.title == title && Some(drink.id) != except)
    }
}

/// In-memory drinks table shared by every request handler.
#[derive(Clone, Debug, Default)]
pub struct DrinkStore {
    table: Arc<RwLock<Table>>,
}

impl DrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding only the house drink.
    pub async fn seeded() -> Self {
        let store = Self::new();
        store.reset(true).await;
        store
    }

    /// Drops every drink and restarts ids at 1.
    pub async fn reset(&self, seed: bool) {
        let mut table = self.table.write().await;
        *table = Table::default();

        if seed {
            table.next_id = 1;
            table.drinks.insert(
                1,
                Drink {
                    id: 1,
                    title: "water".to_owned(),
                    recipe: vec![Ingredient {
                        name: "water".to_owned(),
                        color: "blue".to_owned(),
                        parts: 1,
                    }],
                },
            );
        }

        tracing::debug!(drinks = table.drinks.len(), "drinks table reset");
    }

    /// Every drink, ordered by title.
    pub async fn list(&self) -> Vec<Drink> {
        let mut drinks: Vec<Drink> = self.table.read().await.drinks.values().cloned().collect();
        drinks.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        drinks
    }

    pub async fn get(&self, id: u32) -> Result<Drink, StoreError> {
        self.table
            .read()
            .await
            .drinks
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    pub async fn create(&self, new_drink: NewDrink) -> Result<Drink, StoreError> {
        let title = normalize_title(new_drink.title)?;
        let mut table = self.table.write().await;

        if table.title_taken(&title, None) {
            return Err(StoreError::DuplicateTitle(title));
        }

        table.next_id += 1;
        let drink = Drink {
            id: table.next_id,
            title,
            recipe: new_drink.recipe.into(),
        };
        table.drinks.insert(drink.id, drink.clone());

        Ok(drink)
    }

    pub async fn update(&self, id: u32, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let mut table = self.table.write().await;

        if !table.drinks.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }

        let title = patch.title.map(normalize_title).transpose()?;
        if let Some(title) = &title {
            if table.title_taken(title, Some(id)) {
                return Err(StoreError::DuplicateTitle(title.clone()));
            }
        }

        let drink = table.drinks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = title {
            drink.title = title;
        }
        if let Some(recipe) = patch.recipe {
            drink.recipe = recipe.into();
        }

        Ok(drink.clone())
    }

    pub async fn delete(&self, id: u32) -> Result<Drink, StoreError> {
        self.table
            .write()
            .await
            .drinks
            .remove(&id)
            .ok_or(StoreError::NotFound(id))
    }
}

fn normalize_title(title: String) -> Result<String, StoreError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(StoreError::InvalidTitle);
    }
    Ok(title.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(name: &str, color: &str, parts: u32) -> Ingredient {
        Ingredient {
            name: name.to_owned(),
            color: color.to_owned(),
            parts,
        }
    }

    fn new_drink(title: &str) -> NewDrink {
        NewDrink {
            title: title.to_owned(),
            recipe: Recipe::Many(vec![
                ingredient("espresso", "brown", 1),
                ingredient("milk", "white", 3),
            ]),
        }
    }

    #[tokio::test]
    async fn seeded_store_holds_water() {
        let store = DrinkStore::seeded().await;
        let drinks = store.list().await;

        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].id, 1);
        assert_eq!(drinks[0].title, "water");
        assert_eq!(drinks[0].recipe, vec![ingredient("water", "blue", 1)]);
    }

    #[tokio::test]
    async fn list_is_ordered_by_title() {
        let store = DrinkStore::seeded().await;
        store.create(new_drink("latte")).await.unwrap();
        store.create(new_drink("americano")).await.unwrap();

        let titles: Vec<String> = store.list().await.into_iter().map(|d| d.title).collect();
        assert_eq!(titles, ["americano", "latte", "water"]);
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let store = DrinkStore::seeded().await;
        let latte = store.create(new_drink("latte")).await.unwrap();
        assert_eq!(latte.id, 2);

        store.delete(latte.id).await.unwrap();
        let mocha = store.create(new_drink("mocha")).await.unwrap();
        assert_eq!(mocha.id, 3);
    }

    #[tokio::test]
    async fn duplicate_titles_are_rejected() {
        let store = DrinkStore::seeded().await;
        let err = store.create(new_drink("water")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateTitle("water".to_owned()));

        let latte = store.create(new_drink("latte")).await.unwrap();
        let patch = DrinkPatch {
            title: Some(" water ".to_owned()),
            recipe: None,
        };
        let err = store.update(latte.id, patch).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateTitle("water".to_owned()));
    }

    #[tokio::test]
    async fn titles_are_validated() {
        let store = DrinkStore::new();
        assert_eq!(
            store.create(new_drink("   ")).await.unwrap_err(),
            StoreError::InvalidTitle
        );
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert_eq!(
            store.create(new_drink(&long)).await.unwrap_err(),
            StoreError::InvalidTitle
        );
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let store = DrinkStore::seeded().await;
        let renamed = store
            .update(
                1,
                DrinkPatch {
                    title: Some("still water".to_owned()),
                    recipe: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "still water");
        assert_eq!(renamed.recipe, vec![ingredient("water", "blue", 1)]);

        let refilled = store
            .update(
                1,
                DrinkPatch {
                    title: None,
                    recipe: Some(Recipe::One(ingredient("water", "clear", 2))),
                },
            )
            .await
            .unwrap();
        assert_eq!(refilled.title, "still water");
        assert_eq!(refilled.recipe, vec![ingredient("water", "clear", 2)]);
        assert_eq!(store.get(1).await.unwrap(), refilled);
    }

    #[tokio::test]
    async fn missing_drinks_are_not_found() {
        let store = DrinkStore::seeded().await;
        assert_eq!(
            store.update(42, DrinkPatch::default()).await.unwrap_err(),
            StoreError::NotFound(42)
        );
        assert_eq!(store.delete(42).await.unwrap_err(), StoreError::NotFound(42));
        assert_eq!(store.get(42).await.unwrap_err(), StoreError::NotFound(42));
    }

    #[tokio::test]
    async fn missing_drink_wins_over_invalid_title() {
        let store = DrinkStore::seeded().await;
        let patch = DrinkPatch {
            title: Some(String::new()),
            recipe: None,
        };

        assert_eq!(
            store.update(42, patch.clone()).await.unwrap_err(),
            StoreError::NotFound(42)
        );
        assert_eq!(
            store.update(1, patch).await.unwrap_err(),
            StoreError::InvalidTitle
        );
    }

    #[test]
    fn short_form_hides_ingredient_names() {
        let drink = Drink {
            id: 7,
            title: "flat white".to_owned(),
            recipe: vec![ingredient("espresso", "brown", 1), ingredient("milk", "white", 2)],
        };
        let short = serde_json::to_value(drink.short()).unwrap();

        assert_eq!(
            short,
            serde_json::json!({
                "id": 7,
                "title": "flat white",
                "recipe": [
                    {"color": "brown", "parts": 1},
                    {"color": "white", "parts": 2},
                ],
            })
        );
    }

    #[test]
    fn recipe_accepts_object_or_list() {
        let one: Recipe =
            serde_json::from_str(r#"{"name": "milk", "color": "white", "parts": 1}"#).unwrap();
        let many: Recipe =
            serde_json::from_str(r#"[{"name": "milk", "color": "white", "parts": 1}]"#).unwrap();

        assert_eq!(Vec::from(one), Vec::from(many));
    }
}
