use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task;
use tracing::{debug, warn};

use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::models::{
    NewRecipe, Recipe, ShoppingItem, validate_item_name, validate_recipe_input,
};
use crate::projector::{Projector, SelectionSnapshot};

/// A runtime failure from an enqueued operation, surfaced to the
/// presentation layer instead of crossing it as a fault.
#[derive(Debug, Clone)]
pub struct OpError {
    pub operation: &'static str,
    pub message: String,
    pub retryable: bool,
}

enum Intent {
    Init,
    Select {
        id: i64,
    },
    AddRecipe {
        new: NewRecipe,
        ingredients: Vec<String>,
    },
    ReplaceRecipe {
        id: i64,
        name: String,
        description: Option<String>,
        image_url: Option<String>,
        ingredients: Vec<String>,
    },
    DeleteSelectedRecipe {
        done: oneshot::Sender<Result<()>>,
    },
    ToggleIngredient {
        id: i64,
    },
    ToggleShoppingItem {
        id: i64,
    },
    AddShoppingItem {
        name: String,
    },
    DeleteShoppingItem {
        id: i64,
    },
    ClearShoppingList,
    ResetShoppingChecks,
    ResetAllChecks,
    Search {
        query: String,
    },
}

/// Async front for the coordinator: intents enqueue and return
/// immediately, a single worker task applies them in issue order on a
/// blocking thread, and completion is observed through the next published
/// snapshot. The one exception is recipe deletion, which carries an
/// explicit completion signal so the caller can navigate away once
/// cleanup has finished.
pub struct App {
    intents: mpsc::UnboundedSender<Intent>,
    selection: watch::Receiver<SelectionSnapshot>,
    shopping: watch::Receiver<Vec<ShoppingItem>>,
    search: watch::Receiver<Vec<Recipe>>,
    errors: watch::Receiver<Option<OpError>>,
}

impl App {
    /// Spawn the worker, seed the catalog if the store is empty, and
    /// select the first recipe in store iteration order.
    #[must_use]
    pub fn start(coordinator: Coordinator) -> Self {
        let projector = Arc::new(Projector::new());
        let selection = projector.watch_selection();
        let shopping = projector.watch_shopping();
        let search = projector.watch_search();
        let (errors_tx, errors) = watch::channel(None);

        let (intents, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            coordinator: Arc::new(coordinator),
            projector,
            errors: errors_tx,
            selected: None,
        };
        task::spawn(worker.run(rx));

        let app = Self {
            intents,
            selection,
            shopping,
            search,
            errors,
        };
        app.send(Intent::Init);
        app
    }

    fn send(&self, intent: Intent) {
        // The worker outlives every sender; a failed send only happens
        // during shutdown, when nobody is left to observe the snapshot.
        let _ = self.intents.send(intent);
    }

    // --- Snapshot subscriptions ---

    #[must_use]
    pub fn watch_selection(&self) -> watch::Receiver<SelectionSnapshot> {
        self.selection.clone()
    }

    #[must_use]
    pub fn watch_shopping(&self) -> watch::Receiver<Vec<ShoppingItem>> {
        self.shopping.clone()
    }

    #[must_use]
    pub fn watch_search(&self) -> watch::Receiver<Vec<Recipe>> {
        self.search.clone()
    }

    #[must_use]
    pub fn watch_errors(&self) -> watch::Receiver<Option<OpError>> {
        self.errors.clone()
    }

    // --- Intents ---

    pub fn select_recipe(&self, id: i64) {
        self.send(Intent::Select { id });
    }

    /// Validation happens here, synchronously, before anything enqueues.
    pub fn add_recipe(
        &self,
        name: &str,
        ingredient_names: &[String],
        image_url: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        validate_recipe_input(name, ingredient_names)?;
        self.send(Intent::AddRecipe {
            new: NewRecipe {
                name: name.to_string(),
                image_url: image_url.map(ToString::to_string),
                description: description.map(ToString::to_string),
            },
            ingredients: ingredient_names.to_vec(),
        });
        Ok(())
    }

    pub fn replace_recipe(
        &self,
        id: i64,
        name: &str,
        ingredient_names: &[String],
        image_url: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        validate_recipe_input(name, ingredient_names)?;
        self.send(Intent::ReplaceRecipe {
            id,
            name: name.to_string(),
            description: description.map(ToString::to_string),
            image_url: image_url.map(ToString::to_string),
            ingredients: ingredient_names.to_vec(),
        });
        Ok(())
    }

    /// Delete the currently selected recipe and wait for cleanup to
    /// finish. The next selection snapshot carries the replacement recipe,
    /// or none when the store is empty.
    pub async fn delete_selected_recipe(&self) -> Result<()> {
        let (done, recv) = oneshot::channel();
        self.send(Intent::DeleteSelectedRecipe { done });
        recv.await
            .map_err(|_| Error::Store("coordinator task stopped".to_string()))?
    }

    pub fn toggle_ingredient(&self, id: i64) {
        self.send(Intent::ToggleIngredient { id });
    }

    pub fn toggle_shopping_item(&self, id: i64) {
        self.send(Intent::ToggleShoppingItem { id });
    }

    pub fn add_shopping_item(&self, name: &str) -> Result<()> {
        validate_item_name(name)?;
        self.send(Intent::AddShoppingItem {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn delete_shopping_item(&self, id: i64) {
        self.send(Intent::DeleteShoppingItem { id });
    }

    pub fn clear_shopping_list(&self) {
        self.send(Intent::ClearShoppingList);
    }

    pub fn reset_shopping_list_checks(&self) {
        self.send(Intent::ResetShoppingChecks);
    }

    /// The periodic-task entry point. Failures are logged and swallowed;
    /// the schedule just fires again later.
    pub fn reset_all_checks(&self) {
        self.send(Intent::ResetAllChecks);
    }

    pub fn search(&self, query: &str) {
        self.send(Intent::Search {
            query: query.to_string(),
        });
    }
}

struct Worker {
    coordinator: Arc<Coordinator>,
    projector: Arc<Projector>,
    errors: watch::Sender<Option<OpError>>,
    selected: Option<i64>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Intent>) {
        // One intent at a time: completion before the next is taken gives
        // issue-order serialization for everything.
        while let Some(intent) = rx.recv().await {
            self.handle(intent).await;
        }
        debug!("intent worker stopped");
    }

    /// Run a coordinator operation plus its snapshot publishes on a
    /// blocking thread, entirely off the async executor.
    async fn exec<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Coordinator, &Projector) -> Result<T> + Send + 'static,
    {
        let coordinator = Arc::clone(&self.coordinator);
        let projector = Arc::clone(&self.projector);
        match task::spawn_blocking(move || f(&coordinator, &projector)).await {
            Ok(result) => result,
            Err(err) => Err(Error::Store(format!("background task failed: {err}"))),
        }
    }

    fn report(&self, operation: &'static str, err: &Error) {
        warn!(operation, %err, "operation failed");
        self.errors.send_replace(Some(OpError {
            operation,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }));
    }

    async fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::Init => {
                let result = self
                    .exec(|c, p| {
                        c.seed_if_empty()?;
                        let first = c.first_recipe()?.map(|r| r.id);
                        let selected = p.publish_selection(c, first)?;
                        p.publish_shopping(c)?;
                        Ok(selected)
                    })
                    .await;
                match result {
                    Ok(selected) => self.selected = selected,
                    Err(err) => self.report("init", &err),
                }
            }
            Intent::Select { id } => {
                match self.exec(move |c, p| p.publish_selection(c, Some(id))).await {
                    Ok(selected) => self.selected = selected,
                    Err(err) => self.report("select_recipe", &err),
                }
            }
            Intent::AddRecipe { new, ingredients } => {
                let result = self
                    .exec(move |c, p| {
                        let recipe = c.add_recipe(&new, &ingredients)?;
                        // A freshly added recipe becomes the selection.
                        p.publish_selection(c, Some(recipe.id))
                    })
                    .await;
                match result {
                    Ok(selected) => self.selected = selected,
                    Err(err) => self.report("add_recipe", &err),
                }
            }
            Intent::ReplaceRecipe {
                id,
                name,
                description,
                image_url,
                ingredients,
            } => {
                let selected = self.selected;
                let result = self
                    .exec(move |c, p| {
                        c.replace_recipe(
                            id,
                            &name,
                            description.as_deref(),
                            image_url.as_deref(),
                            &ingredients,
                        )?;
                        if selected == Some(id) {
                            p.publish_selection(c, Some(id))?;
                        }
                        Ok(())
                    })
                    .await;
                if let Err(err) = result {
                    self.report("replace_recipe", &err);
                }
            }
            Intent::DeleteSelectedRecipe { done } => {
                let selected = self.selected;
                let result = self
                    .exec(move |c, p| {
                        let id = selected.ok_or(Error::NotFound("recipe"))?;
                        c.delete_recipe(id)?;
                        let next = c.first_recipe()?.map(|r| r.id);
                        p.publish_selection(c, next)
                    })
                    .await;
                match result {
                    Ok(selected) => {
                        self.selected = selected;
                        let _ = done.send(Ok(()));
                    }
                    Err(err) => {
                        self.report("delete_recipe", &err);
                        let _ = done.send(Err(err));
                    }
                }
            }
            Intent::ToggleIngredient { id } => {
                let selected = self.selected;
                let result = self
                    .exec(move |c, p| {
                        c.toggle_ingredient(id)?;
                        // The toggle may have inserted a shopping row, and
                        // the checked flag lives in the selection slice.
                        p.publish_selection(c, selected)?;
                        p.publish_shopping(c)
                    })
                    .await;
                if let Err(err) = result {
                    self.report("toggle_ingredient", &err);
                }
            }
            Intent::ToggleShoppingItem { id } => {
                let selected = self.selected;
                let result = self
                    .exec(move |c, p| {
                        c.toggle_shopping_item(id)?;
                        p.publish_shopping(c)?;
                        // Unchecking may have reset ingredient checks.
                        p.publish_selection(c, selected)?;
                        Ok(())
                    })
                    .await;
                if let Err(err) = result {
                    self.report("toggle_shopping_item", &err);
                }
            }
            Intent::AddShoppingItem { name } => {
                let result = self
                    .exec(move |c, p| {
                        c.add_shopping_item_if_missing(&name)?;
                        p.publish_shopping(c)
                    })
                    .await;
                if let Err(err) = result {
                    self.report("add_shopping_item", &err);
                }
            }
            Intent::DeleteShoppingItem { id } => {
                let selected = self.selected;
                let result = self
                    .exec(move |c, p| {
                        c.delete_shopping_item(id)?;
                        p.publish_shopping(c)?;
                        p.publish_selection(c, selected)?;
                        Ok(())
                    })
                    .await;
                if let Err(err) = result {
                    self.report("delete_shopping_item", &err);
                }
            }
            Intent::ClearShoppingList => {
                let selected = self.selected;
                let result = self
                    .exec(move |c, p| {
                        c.clear_shopping_list()?;
                        p.publish_shopping(c)?;
                        p.publish_selection(c, selected)?;
                        Ok(())
                    })
                    .await;
                if let Err(err) = result {
                    self.report("clear_shopping_list", &err);
                }
            }
            Intent::ResetShoppingChecks => {
                let result = self
                    .exec(|c, p| {
                        c.reset_shopping_list_checks()?;
                        p.publish_shopping(c)
                    })
                    .await;
                if let Err(err) = result {
                    self.report("reset_shopping_list_checks", &err);
                }
            }
            Intent::ResetAllChecks => {
                let selected = self.selected;
                let result = self
                    .exec(move |c, p| {
                        c.reset_all_checks()?;
                        p.publish_shopping(c)?;
                        p.publish_selection(c, selected)?;
                        Ok(())
                    })
                    .await;
                // Scheduled cleanup failure is swallowed; the next run of
                // the schedule retries it.
                if let Err(err) = result {
                    warn!(%err, "periodic check reset failed");
                }
            }
            Intent::Search { query } => {
                let result = self.exec(move |c, p| p.publish_search(c, &query)).await;
                if let Err(err) = result {
                    self.report("search", &err);
                }
            }
        }
    }
}
