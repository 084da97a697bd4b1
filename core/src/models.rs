use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// An ingredient row owned by exactly one recipe. `has_item` mirrors the
/// shopping list by exact name: checking an ingredient guarantees a
/// same-named shopping item exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub recipe_id: i64,
    pub name: String,
    pub has_item: bool,
}

/// A shopping-list row. No foreign key: the link back to ingredients is
/// case-sensitive name equality, and duplicate names are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: i64,
    pub name: String,
    pub has_item: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub recipe_id: i64,
    pub name: String,
    pub has_item: bool,
}

impl NewIngredient {
    pub fn unchecked(recipe_id: i64, name: &str) -> Self {
        Self {
            recipe_id,
            name: name.to_string(),
            has_item: false,
        }
    }
}

/// Validate a recipe name and ingredient list for add/replace.
/// Whitespace-only names count as empty.
pub fn validate_recipe_input(name: &str, ingredient_names: &[String]) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("recipe name must not be empty".into()));
    }
    if ingredient_names.is_empty() {
        return Err(Error::Validation(
            "a recipe needs at least one ingredient".into(),
        ));
    }
    if ingredient_names.iter().any(|n| n.trim().is_empty()) {
        return Err(Error::Validation(
            "ingredient names must not be empty".into(),
        ));
    }
    Ok(())
}

pub fn validate_item_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("item name must not be empty".into()));
    }
    Ok(())
}
