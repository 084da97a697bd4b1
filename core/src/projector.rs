use tokio::sync::watch;

use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::models::{Ingredient, Recipe, ShoppingItem};

/// The selected recipe together with its ingredients, read under one lock
/// and published as one value — the two can never disagree in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub recipe: Option<Recipe>,
    pub ingredients: Vec<Ingredient>,
}

/// Derives read-snapshots from the store and publishes them on watch
/// channels. Every publish is a full replacement, never a delta; readers
/// hold `watch::Receiver`s and only ever see complete, internally
/// consistent values.
pub struct Projector {
    selection: watch::Sender<SelectionSnapshot>,
    shopping: watch::Sender<Vec<ShoppingItem>>,
    search: watch::Sender<Vec<Recipe>>,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new()
    }
}

impl Projector {
    #[must_use]
    pub fn new() -> Self {
        let (selection, _) = watch::channel(SelectionSnapshot::default());
        let (shopping, _) = watch::channel(Vec::new());
        let (search, _) = watch::channel(Vec::new());
        Self {
            selection,
            shopping,
            search,
        }
    }

    #[must_use]
    pub fn watch_selection(&self) -> watch::Receiver<SelectionSnapshot> {
        self.selection.subscribe()
    }

    #[must_use]
    pub fn watch_shopping(&self) -> watch::Receiver<Vec<ShoppingItem>> {
        self.shopping.subscribe()
    }

    #[must_use]
    pub fn watch_search(&self) -> watch::Receiver<Vec<Recipe>> {
        self.search.subscribe()
    }

    /// Re-read and publish the selection slice. A `None` id, or an id that
    /// no longer exists, publishes an empty selection — loading a vanished
    /// recipe is a state transition, not an error. Returns the id that is
    /// actually selected after the publish.
    pub fn publish_selection(
        &self,
        coordinator: &Coordinator,
        id: Option<i64>,
    ) -> Result<Option<i64>> {
        let (recipe, ingredients) = coordinator.selection(id)?;
        let selected = recipe.as_ref().map(|r| r.id);
        self.selection.send_replace(SelectionSnapshot {
            recipe,
            ingredients,
        });
        Ok(selected)
    }

    pub fn publish_shopping(&self, coordinator: &Coordinator) -> Result<()> {
        let items = coordinator.shopping_list()?;
        self.shopping.send_replace(items);
        Ok(())
    }

    /// Replace the search results wholesale for this query.
    pub fn publish_search(&self, coordinator: &Coordinator, query: &str) -> Result<()> {
        let results = coordinator.search(query)?;
        self.search.send_replace(results);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::NewRecipe;

    fn setup() -> (Coordinator, Projector) {
        let coordinator = Coordinator::new(Database::open_in_memory().unwrap());
        (coordinator, Projector::new())
    }

    fn add(c: &Coordinator, name: &str) -> Recipe {
        c.add_recipe(
            &NewRecipe {
                name: name.to_string(),
                ..NewRecipe::default()
            },
            &["Salt".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_selection_snapshot_pairs_recipe_and_ingredients() {
        let (c, p) = setup();
        let recipe = add(&c, "Soup");
        let mut rx = p.watch_selection();

        let selected = p.publish_selection(&c, Some(recipe.id)).unwrap();
        assert_eq!(selected, Some(recipe.id));

        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.recipe.as_ref().unwrap().id, recipe.id);
        assert!(snap.ingredients.iter().all(|i| i.recipe_id == recipe.id));
    }

    #[test]
    fn test_selection_of_vanished_recipe_publishes_none() {
        let (c, p) = setup();
        let recipe = add(&c, "Soup");
        p.publish_selection(&c, Some(recipe.id)).unwrap();

        c.delete_recipe(recipe.id).unwrap();
        let selected = p.publish_selection(&c, Some(recipe.id)).unwrap();
        assert_eq!(selected, None);

        let snap = p.watch_selection().borrow().clone();
        assert!(snap.recipe.is_none());
        assert!(snap.ingredients.is_empty());
    }

    #[test]
    fn test_search_is_replaced_wholesale() {
        let (c, p) = setup();
        add(&c, "Chocolate Cake");
        add(&c, "Carrot Cake");

        p.publish_search(&c, "cake").unwrap();
        assert_eq!(p.watch_search().borrow().len(), 2);

        p.publish_search(&c, "chocolate").unwrap();
        let results = p.watch_search().borrow().clone();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Chocolate Cake");

        p.publish_search(&c, "nothing matches this").unwrap();
        assert!(p.watch_search().borrow().is_empty());
    }

    #[test]
    fn test_shopping_snapshot() {
        let (c, p) = setup();
        c.add_shopping_item_if_missing("Milk").unwrap();
        p.publish_shopping(&c).unwrap();
        let items = p.watch_shopping().borrow().clone();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Milk");
    }
}
