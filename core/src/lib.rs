//! Core library for pantry, a local-first recipe and shopping-list
//! manager.
//!
//! The pieces, in dependency order: [`db::Database`] is a plain CRUD
//! store over SQLite; [`coordinator::Coordinator`] is the sole authority
//! for mutations spanning more than one entity kind and keeps recipes,
//! ingredients, and the shopping list mutually consistent;
//! [`projector::Projector`] derives immutable read-snapshots and
//! publishes them on watch channels; [`app::App`] queues intents from the
//! presentation layer and runs them in order on a background thread.

pub mod app;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod models;
pub mod projector;

pub use app::{App, OpError};
pub use coordinator::Coordinator;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{Ingredient, NewIngredient, NewRecipe, Recipe, ShoppingItem};
pub use projector::{Projector, SelectionSnapshot};
