use parking_lot::Mutex;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    Ingredient, NewIngredient, NewRecipe, Recipe, ShoppingItem, validate_item_name,
    validate_recipe_input,
};

/// Starter catalog inserted on first run.
const SEED_RECIPES: &[(&str, &str, &[&str])] = &[
    (
        "Pancakes",
        "Fluffy breakfast pancakes",
        &["Flour", "Eggs", "Milk", "Butter"],
    ),
    (
        "Spaghetti Bolognese",
        "Slow-simmered meat sauce over pasta",
        &["Spaghetti", "Minced Beef", "Tomatoes", "Onion", "Garlic"],
    ),
    (
        "Chocolate Cake",
        "Rich chocolate layer cake",
        &["Flour", "Eggs", "Chocolate", "Sugar", "Butter"],
    ),
    (
        "Greek Salad",
        "Fresh salad with feta and olives",
        &["Cucumber", "Tomatoes", "Feta", "Olives", "Olive Oil"],
    ),
];

/// Sole authority for mutations spanning more than one entity kind.
///
/// The store is held behind a mutex and every operation keeps the lock for
/// its whole duration, so no reader ever observes a half-applied mutation
/// and operations on the same entity apply in issue order. The store
/// itself stays plain CRUD.
pub struct Coordinator {
    db: Mutex<Database>,
}

impl Coordinator {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Insert the starter catalog when the store holds no recipes. A store
    /// with any recipe at all is left untouched, so seeding twice never
    /// duplicates a name.
    pub fn seed_if_empty(&self) -> Result<usize> {
        let db = self.db.lock();
        if db.count_recipes()? > 0 {
            return Ok(0);
        }
        let mut inserted = 0;
        for (name, description, ingredients) in SEED_RECIPES {
            let recipe = db.insert_recipe(&NewRecipe {
                name: (*name).to_string(),
                image_url: None,
                description: Some((*description).to_string()),
            })?;
            let rows: Vec<NewIngredient> = ingredients
                .iter()
                .map(|n| NewIngredient::unchecked(recipe.id, n))
                .collect();
            db.insert_ingredients(&rows)?;
            inserted += 1;
        }
        info!(inserted, "seeded starter recipes");
        Ok(inserted)
    }

    /// Create a recipe with a fresh, unchecked ingredient list.
    pub fn add_recipe(&self, new: &NewRecipe, ingredient_names: &[String]) -> Result<Recipe> {
        validate_recipe_input(&new.name, ingredient_names)?;
        let db = self.db.lock();
        let recipe = db.insert_recipe(new)?;
        let rows: Vec<NewIngredient> = ingredient_names
            .iter()
            .map(|n| NewIngredient::unchecked(recipe.id, n))
            .collect();
        if let Err(err) = db.insert_ingredients(&rows) {
            // Keep the store consistent: a recipe never lands without its
            // ingredient list.
            let _ = db.delete_recipe(recipe.id);
            return Err(err);
        }
        debug!(id = recipe.id, name = %recipe.name, "added recipe");
        Ok(recipe)
    }

    /// Update recipe fields and atomically swap its ingredient list for a
    /// fresh, unchecked one. A failure partway through restores the fields
    /// and ingredient set snapshotted up front, so the recipe is replaced
    /// whole or not at all.
    pub fn replace_recipe(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        image_url: Option<&str>,
        ingredient_names: &[String],
    ) -> Result<Recipe> {
        validate_recipe_input(name, ingredient_names)?;
        let db = self.db.lock();
        let original = db.get_recipe(id)?.ok_or(Error::NotFound("recipe"))?;
        let mut recipe = original.clone();
        recipe.name = name.to_string();
        recipe.description = description.map(ToString::to_string);
        recipe.image_url = image_url.map(ToString::to_string);
        db.update_recipe(&recipe)?;

        let previous = db.list_ingredients_for_recipe(id)?;
        if let Err(err) = db.delete_ingredients_for_recipe(id) {
            let _ = db.update_recipe(&original);
            return Err(err);
        }
        let rows: Vec<NewIngredient> = ingredient_names
            .iter()
            .map(|n| NewIngredient::unchecked(id, n))
            .collect();
        if let Err(err) = db.insert_ingredients(&rows) {
            let restore: Vec<NewIngredient> = previous
                .iter()
                .map(|i| NewIngredient {
                    recipe_id: i.recipe_id,
                    name: i.name.clone(),
                    has_item: i.has_item,
                })
                .collect();
            let _ = db.insert_ingredients(&restore);
            let _ = db.update_recipe(&original);
            return Err(err);
        }
        debug!(id, name = %recipe.name, "replaced recipe");
        db.get_recipe(id)?.ok_or(Error::NotFound("recipe"))
    }

    /// Delete a recipe and its ingredients. Shopping-list rows are left
    /// alone. The caller decides which recipe (if any) is selected next.
    pub fn delete_recipe(&self, id: i64) -> Result<()> {
        let db = self.db.lock();
        if db.get_recipe(id)?.is_none() {
            return Err(Error::NotFound("recipe"));
        }
        db.delete_ingredients_for_recipe(id)?;
        db.delete_recipe(id)?;
        debug!(id, "deleted recipe");
        Ok(())
    }

    /// Flip an ingredient's check. Checking it guarantees a same-named
    /// shopping item exists; an item already present is left untouched,
    /// checked flag included. Unchecking has no shopping side effect.
    pub fn toggle_ingredient(&self, id: i64) -> Result<Ingredient> {
        let db = self.db.lock();
        let mut ingredient = db.get_ingredient(id)?.ok_or(Error::NotFound("ingredient"))?;
        ingredient.has_item = !ingredient.has_item;
        let needs_item =
            ingredient.has_item && db.find_shopping_item_by_name(&ingredient.name)?.is_none();
        db.update_ingredient(&ingredient)?;
        if needs_item {
            if let Err(err) = db.insert_shopping_item(&ingredient.name) {
                // Un-flip so a checked ingredient never lacks its item.
                ingredient.has_item = false;
                let _ = db.update_ingredient(&ingredient);
                return Err(err);
            }
        }
        debug!(id, has_item = ingredient.has_item, "toggled ingredient");
        Ok(ingredient)
    }

    /// Flip a shopping item's check. Unchecking resets every same-named
    /// ingredient across all recipes; checking deliberately does not check
    /// matching ingredients back (asymmetric with the ingredient side).
    pub fn toggle_shopping_item(&self, id: i64) -> Result<ShoppingItem> {
        let db = self.db.lock();
        let mut item = db
            .get_shopping_item(id)?
            .ok_or(Error::NotFound("shopping item"))?;
        item.has_item = !item.has_item;
        db.update_shopping_item(&item)?;
        if !item.has_item {
            if let Err(err) = db.reset_ingredient_checks_by_name(&item.name) {
                // Re-check the item so the uncheck applies whole or not at
                // all.
                item.has_item = true;
                let _ = db.update_shopping_item(&item);
                return Err(err);
            }
        }
        debug!(id, has_item = item.has_item, "toggled shopping item");
        Ok(item)
    }

    /// Remove a shopping row and clear the check on every ingredient
    /// sharing its name. The checks are reset before the row goes away:
    /// restoring flags on a failed delete is exact, while re-inserting a
    /// deleted row would mint a new id.
    pub fn delete_shopping_item(&self, id: i64) -> Result<()> {
        let db = self.db.lock();
        let item = db
            .get_shopping_item(id)?
            .ok_or(Error::NotFound("shopping item"))?;
        let checked = db.list_checked_ingredients_by_name(&item.name)?;
        db.reset_ingredient_checks_by_name(&item.name)?;
        if let Err(err) = db.delete_shopping_item(id) {
            for ingredient in &checked {
                let _ = db.update_ingredient(ingredient);
            }
            return Err(err);
        }
        debug!(id, name = %item.name, "deleted shopping item");
        Ok(())
    }

    /// Insert a shopping item only when no row with that exact name exists.
    /// Returns the existing row otherwise.
    pub fn add_shopping_item_if_missing(&self, name: &str) -> Result<ShoppingItem> {
        validate_item_name(name)?;
        let db = self.db.lock();
        if let Some(existing) = db.find_shopping_item_by_name(name)? {
            return Ok(existing);
        }
        let item = db.insert_shopping_item(name)?;
        debug!(id = item.id, name = %item.name, "added shopping item");
        Ok(item)
    }

    /// Delete every shopping row and clear every ingredient check. The
    /// checks go first for the same reason as in `delete_shopping_item`:
    /// flags can be restored exactly if the delete half fails.
    pub fn clear_shopping_list(&self) -> Result<()> {
        let db = self.db.lock();
        let checked = db.list_checked_ingredients()?;
        db.reset_all_ingredient_checks()?;
        if let Err(err) = db.clear_shopping_list() {
            for ingredient in &checked {
                let _ = db.update_ingredient(ingredient);
            }
            return Err(err);
        }
        debug!("cleared shopping list");
        Ok(())
    }

    /// Uncheck all shopping rows without deleting them. Ingredients are
    /// untouched.
    pub fn reset_shopping_list_checks(&self) -> Result<()> {
        let db = self.db.lock();
        db.reset_shopping_list_checks()?;
        Ok(())
    }

    /// Periodic cleanup: clear every ingredient check and every shopping
    /// check so stale state does not linger. Idempotent.
    pub fn reset_all_checks(&self) -> Result<()> {
        let db = self.db.lock();
        db.reset_all_ingredient_checks()?;
        db.reset_shopping_list_checks()?;
        debug!("reset all checks");
        Ok(())
    }

    // --- Reads (used by the projector; same lock, so reads never see a
    // half-applied mutation) ---

    pub fn recipe(&self, id: i64) -> Result<Option<Recipe>> {
        self.db.lock().get_recipe(id)
    }

    pub fn recipes(&self) -> Result<Vec<Recipe>> {
        self.db.lock().list_recipes()
    }

    pub fn ingredients_for(&self, recipe_id: i64) -> Result<Vec<Ingredient>> {
        self.db.lock().list_ingredients_for_recipe(recipe_id)
    }

    /// Read a recipe and its ingredients under one lock acquisition so the
    /// pair can never disagree. `None` id, or an id no longer present,
    /// yields an empty selection rather than an error.
    pub fn selection(&self, id: Option<i64>) -> Result<(Option<Recipe>, Vec<Ingredient>)> {
        let db = self.db.lock();
        let Some(id) = id else {
            return Ok((None, Vec::new()));
        };
        match db.get_recipe(id)? {
            Some(recipe) => {
                let ingredients = db.list_ingredients_for_recipe(id)?;
                Ok((Some(recipe), ingredients))
            }
            None => Ok((None, Vec::new())),
        }
    }

    /// First recipe in store iteration order, if any.
    pub fn first_recipe(&self) -> Result<Option<Recipe>> {
        Ok(self.db.lock().list_recipes()?.into_iter().next())
    }

    pub fn shopping_list(&self) -> Result<Vec<ShoppingItem>> {
        self.db.lock().list_shopping_items()
    }

    pub fn search(&self, query: &str) -> Result<Vec<Recipe>> {
        self.db.lock().search_recipes(query)
    }

    // --- Settings passthrough (single-entity, but kept behind the same
    // lock as everything else) ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.db.lock().set_setting(key, value)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.db.lock().get_setting(key)
    }
}

#[cfg(test)]
impl Coordinator {
    /// Arm the store to fail the next call to the named operation, to drive
    /// multi-step mutations down their rollback path.
    fn fail_next_store_op(&self, op: &'static str) {
        self.db.lock().fail_next(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> Coordinator {
        Coordinator::new(Database::open_in_memory().unwrap())
    }

    fn cake(c: &Coordinator) -> Recipe {
        c.add_recipe(
            &NewRecipe {
                name: "Cake".to_string(),
                image_url: None,
                description: None,
            },
            &["Flour".to_string(), "Eggs".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_seed_if_empty_is_idempotent() {
        let c = coordinator();
        let first = c.seed_if_empty().unwrap();
        assert!(first > 0);
        assert_eq!(c.seed_if_empty().unwrap(), 0);

        let mut seen = std::collections::HashSet::new();
        for recipe in c.recipes().unwrap() {
            assert!(seen.insert(recipe.name.clone()), "duplicate {}", recipe.name);
            assert!(!c.ingredients_for(recipe.id).unwrap().is_empty());
        }
    }

    #[test]
    fn test_seed_skips_when_any_recipe_exists() {
        let c = coordinator();
        cake(&c);
        assert_eq!(c.seed_if_empty().unwrap(), 0);
        assert_eq!(c.recipes().unwrap().len(), 1);
    }

    #[test]
    fn test_add_recipe_validates() {
        let c = coordinator();
        let err = c
            .add_recipe(&NewRecipe::default(), &["Flour".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = c
            .add_recipe(
                &NewRecipe {
                    name: "Cake".to_string(),
                    ..NewRecipe::default()
                },
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_toggle_ingredient_creates_shopping_item_once() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();

        let toggled = c.toggle_ingredient(flour.id).unwrap();
        assert!(toggled.has_item);
        let list = c.shopping_list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Flour");

        // Off then on again: no duplicate
        assert!(!c.toggle_ingredient(flour.id).unwrap().has_item);
        assert_eq!(c.shopping_list().unwrap().len(), 1);
        assert!(c.toggle_ingredient(flour.id).unwrap().has_item);
        assert_eq!(c.shopping_list().unwrap().len(), 1);
    }

    #[test]
    fn test_toggle_ingredient_keeps_existing_item_checked() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();

        let item = c.add_shopping_item_if_missing("Flour").unwrap();
        let checked = c.toggle_shopping_item(item.id).unwrap();
        assert!(checked.has_item);

        // Ensuring presence must not reset the item's own checked flag
        c.toggle_ingredient(flour.id).unwrap();
        let list = c.shopping_list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].has_item);
    }

    #[test]
    fn test_uncheck_shopping_item_resets_matching_ingredients() {
        let c = coordinator();
        let recipe = cake(&c);
        let other = c
            .add_recipe(
                &NewRecipe {
                    name: "Bread".to_string(),
                    ..NewRecipe::default()
                },
                &["Flour".to_string(), "Yeast".to_string()],
            )
            .unwrap();

        let flour_cake = c.ingredients_for(recipe.id).unwrap()[0].clone();
        let flour_bread = c.ingredients_for(other.id).unwrap()[0].clone();
        c.toggle_ingredient(flour_cake.id).unwrap();
        c.toggle_ingredient(flour_bread.id).unwrap();

        let item = c.shopping_list().unwrap()[0].clone();
        let checked = c.toggle_shopping_item(item.id).unwrap();
        assert!(checked.has_item);
        // Checking does NOT check ingredients back
        assert!(c.ingredients_for(recipe.id).unwrap()[0].has_item);

        let unchecked = c.toggle_shopping_item(item.id).unwrap();
        assert!(!unchecked.has_item);
        // Unchecking resets Flour in every recipe
        assert!(!c.ingredients_for(recipe.id).unwrap()[0].has_item);
        assert!(!c.ingredients_for(other.id).unwrap()[0].has_item);
        // Yeast untouched
        assert!(!c.ingredients_for(other.id).unwrap()[1].has_item);
    }

    #[test]
    fn test_delete_shopping_item_resets_matching_ingredients() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();

        let item = c.shopping_list().unwrap()[0].clone();
        c.delete_shopping_item(item.id).unwrap();

        assert!(c.shopping_list().unwrap().is_empty());
        assert!(!c.ingredients_for(recipe.id).unwrap()[0].has_item);
    }

    #[test]
    fn test_delete_shopping_item_missing_is_not_found() {
        let c = coordinator();
        assert!(matches!(
            c.delete_shopping_item(42),
            Err(Error::NotFound("shopping item"))
        ));
    }

    #[test]
    fn test_replace_recipe_swaps_ingredient_set() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();

        let new_names = vec!["Vanilla".to_string(), "Milk".to_string()];
        let updated = c
            .replace_recipe(
                recipe.id,
                "Cake Updated",
                Some("Updated description"),
                None,
                &new_names,
            )
            .unwrap();
        assert_eq!(updated.name, "Cake Updated");
        assert_eq!(updated.description.as_deref(), Some("Updated description"));

        let ingredients = c.ingredients_for(recipe.id).unwrap();
        let got: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(got, ["Vanilla", "Milk"]);
        assert!(ingredients.iter().all(|i| !i.has_item));

        // Idempotent: same replace, same final set
        c.replace_recipe(recipe.id, "Cake Updated", None, None, &new_names)
            .unwrap();
        let again = c.ingredients_for(recipe.id).unwrap();
        assert_eq!(again.len(), 2);
        let got: Vec<&str> = again.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(got, ["Vanilla", "Milk"]);
    }

    #[test]
    fn test_replace_recipe_missing_is_not_found() {
        let c = coordinator();
        let err = c
            .replace_recipe(999, "Nope", None, None, &["X".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("recipe")));
    }

    #[test]
    fn test_clear_shopping_list_resets_all_ingredient_checks() {
        let c = coordinator();
        let recipe = cake(&c);
        for ingredient in c.ingredients_for(recipe.id).unwrap() {
            c.toggle_ingredient(ingredient.id).unwrap();
        }
        assert_eq!(c.shopping_list().unwrap().len(), 2);

        c.clear_shopping_list().unwrap();
        assert!(c.shopping_list().unwrap().is_empty());
        assert!(
            c.ingredients_for(recipe.id)
                .unwrap()
                .iter()
                .all(|i| !i.has_item)
        );
    }

    #[test]
    fn test_reset_shopping_list_checks_leaves_ingredients() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();
        let item = c.shopping_list().unwrap()[0].clone();
        c.toggle_shopping_item(item.id).unwrap();

        c.reset_shopping_list_checks().unwrap();

        let list = c.shopping_list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(!list[0].has_item);
        // Ingredient checks are deliberately untouched here
        assert!(c.ingredients_for(recipe.id).unwrap()[0].has_item);
    }

    #[test]
    fn test_reset_all_checks_is_idempotent() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();

        c.reset_all_checks().unwrap();
        c.reset_all_checks().unwrap();

        assert!(
            c.ingredients_for(recipe.id)
                .unwrap()
                .iter()
                .all(|i| !i.has_item)
        );
        let list = c.shopping_list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(!list[0].has_item);
    }

    #[test]
    fn test_add_shopping_item_if_missing() {
        let c = coordinator();
        let first = c.add_shopping_item_if_missing("Milk").unwrap();
        let second = c.add_shopping_item_if_missing("Milk").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(c.shopping_list().unwrap().len(), 1);

        assert!(matches!(
            c.add_shopping_item_if_missing("  "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_delete_recipe_cascades_to_ingredients_only() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();

        c.delete_recipe(recipe.id).unwrap();

        assert!(c.recipe(recipe.id).unwrap().is_none());
        assert!(c.ingredients_for(recipe.id).unwrap().is_empty());
        // Shopping rows survive recipe deletion
        assert_eq!(c.shopping_list().unwrap().len(), 1);

        assert!(matches!(
            c.delete_recipe(recipe.id),
            Err(Error::NotFound("recipe"))
        ));
    }

    #[test]
    fn test_selection_of_missing_recipe_is_none() {
        let c = coordinator();
        let (recipe, ingredients) = c.selection(Some(123)).unwrap();
        assert!(recipe.is_none());
        assert!(ingredients.is_empty());

        let (recipe, _) = c.selection(None).unwrap();
        assert!(recipe.is_none());
    }

    #[test]
    fn test_cake_flour_scenario() {
        // Recipe "Cake" with ["Flour", "Eggs"]; toggling Flour puts it on
        // the list; unchecking the list item resets the ingredient.
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c
            .ingredients_for(recipe.id)
            .unwrap()
            .into_iter()
            .find(|i| i.name == "Flour")
            .unwrap();

        c.toggle_ingredient(flour.id).unwrap();
        let item = c
            .shopping_list()
            .unwrap()
            .into_iter()
            .find(|i| i.name == "Flour")
            .expect("Flour lands on the shopping list");

        c.toggle_shopping_item(item.id).unwrap(); // check
        c.toggle_shopping_item(item.id).unwrap(); // uncheck

        let flour = c
            .ingredients_for(recipe.id)
            .unwrap()
            .into_iter()
            .find(|i| i.name == "Flour")
            .unwrap();
        assert!(!flour.has_item);
    }

    fn ingredient_state(c: &Coordinator, recipe_id: i64) -> Vec<(String, bool)> {
        c.ingredients_for(recipe_id)
            .unwrap()
            .into_iter()
            .map(|i| (i.name, i.has_item))
            .collect()
    }

    #[test]
    fn test_add_recipe_rolls_back_when_ingredient_insert_fails() {
        let c = coordinator();
        c.fail_next_store_op("insert_ingredients");
        let err = c
            .add_recipe(
                &NewRecipe {
                    name: "Cake".to_string(),
                    ..NewRecipe::default()
                },
                &["Flour".to_string()],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        // No recipe lands without its ingredient list
        assert!(c.recipes().unwrap().is_empty());
    }

    #[test]
    fn test_replace_recipe_rolls_back_when_insert_fails() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();

        c.fail_next_store_op("insert_ingredients");
        let err = c
            .replace_recipe(recipe.id, "Tart", None, None, &["Vanilla".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        // Old fields, old ingredient set, old check flags
        assert_eq!(c.recipe(recipe.id).unwrap().unwrap().name, "Cake");
        assert_eq!(
            ingredient_state(&c, recipe.id),
            [("Flour".to_string(), true), ("Eggs".to_string(), false)]
        );
    }

    #[test]
    fn test_toggle_ingredient_rolls_back_when_item_insert_fails() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();

        c.fail_next_store_op("insert_shopping_item");
        let err = c.toggle_ingredient(flour.id).unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        // Neither half applied: flag still down, list still empty
        assert!(!c.ingredients_for(recipe.id).unwrap()[0].has_item);
        assert!(c.shopping_list().unwrap().is_empty());

        // Works after the failure clears
        assert!(c.toggle_ingredient(flour.id).unwrap().has_item);
        assert_eq!(c.shopping_list().unwrap().len(), 1);
    }

    #[test]
    fn test_toggle_shopping_item_rolls_back_when_reset_fails() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();
        let item = c.shopping_list().unwrap()[0].clone();
        assert!(c.toggle_shopping_item(item.id).unwrap().has_item);

        c.fail_next_store_op("reset_ingredient_checks_by_name");
        let err = c.toggle_shopping_item(item.id).unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        // The uncheck did not half-apply: item still checked, ingredient too
        assert!(c.shopping_list().unwrap()[0].has_item);
        assert!(c.ingredients_for(recipe.id).unwrap()[0].has_item);
    }

    #[test]
    fn test_delete_shopping_item_rolls_back_when_delete_fails() {
        let c = coordinator();
        let recipe = cake(&c);
        let flour = c.ingredients_for(recipe.id).unwrap()[0].clone();
        c.toggle_ingredient(flour.id).unwrap();
        let item = c.shopping_list().unwrap()[0].clone();

        c.fail_next_store_op("delete_shopping_item");
        let err = c.delete_shopping_item(item.id).unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        // Row survives and the ingredient check was put back
        assert_eq!(c.shopping_list().unwrap(), [item]);
        assert!(c.ingredients_for(recipe.id).unwrap()[0].has_item);
    }

    #[test]
    fn test_clear_shopping_list_rolls_back_when_clear_fails() {
        let c = coordinator();
        let recipe = cake(&c);
        for ingredient in c.ingredients_for(recipe.id).unwrap() {
            c.toggle_ingredient(ingredient.id).unwrap();
        }

        c.fail_next_store_op("clear_shopping_list");
        let err = c.clear_shopping_list().unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        assert_eq!(c.shopping_list().unwrap().len(), 2);
        assert_eq!(
            ingredient_state(&c, recipe.id),
            [("Flour".to_string(), true), ("Eggs".to_string(), true)]
        );

        // And the whole thing still goes through afterwards
        c.clear_shopping_list().unwrap();
        assert!(c.shopping_list().unwrap().is_empty());
        assert_eq!(
            ingredient_state(&c, recipe.id),
            [("Flour".to_string(), false), ("Eggs".to_string(), false)]
        );
    }
}
