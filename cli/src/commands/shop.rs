use anyhow::Result;
use std::process;

use pantry_core::{Coordinator, Error};

use super::helpers::{json_error, print_shopping_table};

pub(crate) fn cmd_shop_list(coordinator: &Coordinator, json: bool) -> Result<()> {
    let items = coordinator.shopping_list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("Shopping list is empty");
    } else {
        print_shopping_table(&items);
    }
    Ok(())
}

pub(crate) fn cmd_shop_add(coordinator: &Coordinator, name: &str, json: bool) -> Result<()> {
    let item = coordinator.add_shopping_item_if_missing(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        let id = item.id;
        println!("{name} is on the list (id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_shop_toggle(coordinator: &Coordinator, id: i64, json: bool) -> Result<()> {
    match coordinator.toggle_shopping_item(id) {
        Ok(item) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                let name = &item.name;
                if item.has_item {
                    println!("Got {name}");
                } else {
                    println!("Unchecked {name} (matching recipe ingredients reset)");
                }
            }
            Ok(())
        }
        Err(Error::NotFound(_)) => {
            if json {
                println!("{}", json_error(&format!("shopping item {id} not found")));
            } else {
                eprintln!("Shopping item {id} not found");
            }
            process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn cmd_shop_delete(coordinator: &Coordinator, id: i64, json: bool) -> Result<()> {
    match coordinator.delete_shopping_item(id) {
        Ok(()) => {
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("Removed item {id}");
            }
            Ok(())
        }
        Err(Error::NotFound(_)) => {
            if json {
                println!("{}", json_error(&format!("shopping item {id} not found")));
            } else {
                eprintln!("Shopping item {id} not found");
            }
            process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn cmd_shop_clear(coordinator: &Coordinator, json: bool) -> Result<()> {
    coordinator.clear_shopping_list()?;
    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("Shopping list cleared; all ingredient checks reset");
    }
    Ok(())
}

pub(crate) fn cmd_shop_reset(coordinator: &Coordinator, json: bool) -> Result<()> {
    coordinator.reset_shopping_list_checks()?;
    if json {
        println!("{}", serde_json::json!({ "reset": true }));
    } else {
        println!("Unchecked every shopping item");
    }
    Ok(())
}
