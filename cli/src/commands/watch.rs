use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use pantry_core::{App, Coordinator, Database};

use super::helpers::{print_ingredient_table, print_shopping_table};

/// Live view: subscribe to the snapshot slices and reprint whichever one
/// changed. Optionally runs the periodic check-reset on an interval, the
/// way a background scheduler would.
pub(crate) async fn cmd_watch(db: Database, reset_every: Option<u64>) -> Result<()> {
    let app = Arc::new(App::start(Coordinator::new(db)));

    if let Some(secs) = reset_every {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                // Failures are swallowed inside the worker; the next tick
                // tries again.
                app.reset_all_checks();
            }
        });
    }

    let mut selection = app.watch_selection();
    let mut shopping = app.watch_shopping();
    let mut errors = app.watch_errors();

    println!("Watching for changes (ctrl-c to stop)...\n");
    loop {
        tokio::select! {
            changed = selection.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = selection.borrow_and_update().clone();
                match &snap.recipe {
                    Some(recipe) => {
                        println!("Selected: {} (id: {})", recipe.name, recipe.id);
                        print_ingredient_table(&snap.ingredients);
                    }
                    None => println!("No recipe selected"),
                }
                println!();
            }
            changed = shopping.changed() => {
                if changed.is_err() {
                    break;
                }
                let items = shopping.borrow_and_update().clone();
                if items.is_empty() {
                    println!("Shopping list is empty\n");
                } else {
                    print_shopping_table(&items);
                    println!();
                }
            }
            changed = errors.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(err) = errors.borrow_and_update().clone() {
                    let retry = if err.retryable { " (retryable)" } else { "" };
                    eprintln!("{} failed: {}{retry}", err.operation, err.message);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped");
                break;
            }
        }
    }

    Ok(())
}
