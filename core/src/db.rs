use std::path::Path;

use chrono::Local;
use rusqlite::{Connection, params};

use crate::error::{Error, Result};
use crate::models::{Ingredient, NewIngredient, NewRecipe, Recipe, ShoppingItem};

/// SQLite-backed persistent store. Plain CRUD and queries only; anything
/// touching more than one entity kind goes through the coordinator.
pub struct Database {
    conn: Connection,
    #[cfg(test)]
    fail_op: std::cell::Cell<Option<&'static str>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self::wrap(conn);
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self::wrap(conn);
        db.migrate()?;
        Ok(db)
    }

    fn wrap(conn: Connection) -> Self {
        Database {
            conn,
            #[cfg(test)]
            fail_op: std::cell::Cell::new(None),
        }
    }

    /// Make the next call to the named operation fail once, so rollback
    /// paths can be exercised.
    #[cfg(test)]
    pub(crate) fn fail_next(&self, op: &'static str) {
        self.fail_op.set(Some(op));
    }

    #[cfg(test)]
    fn fault(&self, op: &str) -> Result<()> {
        if self.fail_op.get() == Some(op) {
            self.fail_op.set(None);
            return Err(Error::Store(format!("injected failure in {op}")));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    fn fault(&self, _op: &str) -> Result<()> {
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    image_url TEXT,
                    description TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    has_item INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS shopping_list (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    has_item INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_name ON recipes(name);
                CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id);
                CREATE INDEX IF NOT EXISTS idx_ingredients_name ON ingredients(name);
                CREATE INDEX IF NOT EXISTS idx_shopping_list_name ON shopping_list(name);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                );

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            image_url: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn ingredient_from_row(row: &rusqlite::Row) -> rusqlite::Result<Ingredient> {
        Ok(Ingredient {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            name: row.get(2)?,
            has_item: row.get(3)?,
        })
    }

    fn shopping_item_from_row(row: &rusqlite::Row) -> rusqlite::Result<ShoppingItem> {
        Ok(ShoppingItem {
            id: row.get(0)?,
            name: row.get(1)?,
            has_item: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    // --- Recipes ---

    pub fn insert_recipe(&self, recipe: &NewRecipe) -> Result<Recipe> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO recipes (name, image_url, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                recipe.name,
                recipe.image_url,
                recipe.description,
                now,
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_recipe(id)?.ok_or(Error::NotFound("recipe"))
    }

    pub fn update_recipe(&self, recipe: &Recipe) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE recipes SET name = ?1, image_url = ?2, description = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                recipe.name,
                recipe.image_url,
                recipe.description,
                now,
                recipe.id
            ],
        )?;
        if rows == 0 {
            return Err(Error::NotFound("recipe"));
        }
        Ok(())
    }

    pub fn delete_recipe(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, image_url, description, created_at, updated_at
             FROM recipes WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::recipe_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, image_url, description, created_at, updated_at
             FROM recipes ORDER BY id",
        )?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(recipes)
    }

    /// Case-insensitive substring search on recipe name.
    pub fn search_recipes(&self, query: &str) -> Result<Vec<Recipe>> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        let mut stmt = self.conn.prepare(
            "SELECT id, name, image_url, description, created_at, updated_at
             FROM recipes WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name",
        )?;
        let recipes = stmt
            .query_map(params![pattern], Self::recipe_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(recipes)
    }

    pub fn count_recipes(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    // --- Ingredients ---

    pub fn insert_ingredients(&self, ingredients: &[NewIngredient]) -> Result<()> {
        self.fault("insert_ingredients")?;
        let mut stmt = self.conn.prepare(
            "INSERT INTO ingredients (recipe_id, name, has_item) VALUES (?1, ?2, ?3)",
        )?;
        for ingredient in ingredients {
            stmt.execute(params![
                ingredient.recipe_id,
                ingredient.name,
                ingredient.has_item
            ])?;
        }
        Ok(())
    }

    pub fn update_ingredient(&self, ingredient: &Ingredient) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE ingredients SET recipe_id = ?1, name = ?2, has_item = ?3 WHERE id = ?4",
            params![
                ingredient.recipe_id,
                ingredient.name,
                ingredient.has_item,
                ingredient.id
            ],
        )?;
        if rows == 0 {
            return Err(Error::NotFound("ingredient"));
        }
        Ok(())
    }

    pub fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, name, has_item FROM ingredients WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::ingredient_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_ingredients_for_recipe(&self, recipe_id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM ingredients WHERE recipe_id = ?1",
            params![recipe_id],
        )?;
        Ok(())
    }

    pub fn list_ingredients_for_recipe(&self, recipe_id: i64) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, name, has_item FROM ingredients
             WHERE recipe_id = ?1 ORDER BY id",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], Self::ingredient_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ingredients)
    }

    pub fn reset_all_ingredient_checks(&self) -> Result<()> {
        self.conn
            .execute("UPDATE ingredients SET has_item = 0 WHERE has_item = 1", [])?;
        Ok(())
    }

    /// Checked ingredients across all recipes, for snapshotting before a
    /// bulk reset.
    pub fn list_checked_ingredients(&self) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, name, has_item FROM ingredients
             WHERE has_item = 1 ORDER BY id",
        )?;
        let ingredients = stmt
            .query_map([], Self::ingredient_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ingredients)
    }

    /// Checked ingredients with the exact name, across all recipes.
    pub fn list_checked_ingredients_by_name(&self, name: &str) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, name, has_item FROM ingredients
             WHERE name = ?1 AND has_item = 1 ORDER BY id",
        )?;
        let ingredients = stmt
            .query_map(params![name], Self::ingredient_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ingredients)
    }

    /// Exact, case-sensitive name match across all recipes.
    pub fn reset_ingredient_checks_by_name(&self, name: &str) -> Result<()> {
        self.fault("reset_ingredient_checks_by_name")?;
        self.conn.execute(
            "UPDATE ingredients SET has_item = 0 WHERE name = ?1 AND has_item = 1",
            params![name],
        )?;
        Ok(())
    }

    // --- Shopping list ---

    pub fn insert_shopping_item(&self, name: &str) -> Result<ShoppingItem> {
        self.fault("insert_shopping_item")?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO shopping_list (name, has_item, created_at) VALUES (?1, 0, ?2)",
            params![name, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_shopping_item(id)?
            .ok_or(Error::NotFound("shopping item"))
    }

    pub fn update_shopping_item(&self, item: &ShoppingItem) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE shopping_list SET name = ?1, has_item = ?2 WHERE id = ?3",
            params![item.name, item.has_item, item.id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound("shopping item"));
        }
        Ok(())
    }

    pub fn delete_shopping_item(&self, id: i64) -> Result<bool> {
        self.fault("delete_shopping_item")?;
        let rows = self
            .conn
            .execute("DELETE FROM shopping_list WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn get_shopping_item(&self, id: i64) -> Result<Option<ShoppingItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, has_item, created_at FROM shopping_list WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::shopping_item_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// First row with the exact name, oldest first. Names are not unique.
    pub fn find_shopping_item_by_name(&self, name: &str) -> Result<Option<ShoppingItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, has_item, created_at FROM shopping_list
             WHERE name = ?1 ORDER BY id LIMIT 1",
        )?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::shopping_item_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_shopping_items(&self) -> Result<Vec<ShoppingItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, has_item, created_at FROM shopping_list ORDER BY id",
        )?;
        let items = stmt
            .query_map([], Self::shopping_item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn clear_shopping_list(&self) -> Result<()> {
        self.fault("clear_shopping_list")?;
        self.conn.execute("DELETE FROM shopping_list", [])?;
        Ok(())
    }

    pub fn reset_shopping_list_checks(&self) -> Result<()> {
        self.conn.execute(
            "UPDATE shopping_list SET has_item = 0 WHERE has_item = 1",
            [],
        )?;
        Ok(())
    }

    // --- Settings (key-value) ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM user_settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }
}
