use anyhow::Result;
use std::process;

use pantry_core::models::NewRecipe;
use pantry_core::{Coordinator, Error};

use super::helpers::{json_error, print_ingredient_table, print_recipe_table};

pub(crate) fn cmd_recipe_list(coordinator: &Coordinator, json: bool) -> Result<()> {
    let recipes = coordinator.recipes()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
    } else if recipes.is_empty() {
        println!("No recipes yet. Try: pantry seed, or pantry recipe add");
    } else {
        print_recipe_table(&recipes);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_show(coordinator: &Coordinator, id: i64, json: bool) -> Result<()> {
    let (recipe, ingredients) = coordinator.selection(Some(id))?;
    let Some(recipe) = recipe else {
        if json {
            println!("{}", json_error(&format!("recipe {id} not found")));
        } else {
            eprintln!("Recipe {id} not found");
        }
        process::exit(2);
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "recipe": recipe,
                "ingredients": ingredients,
            }))?
        );
    } else {
        println!("{} (id: {})", recipe.name, recipe.id);
        if let Some(description) = &recipe.description {
            println!("{description}");
        }
        if let Some(image_url) = &recipe.image_url {
            println!("Image: {image_url}");
        }
        println!();
        print_ingredient_table(&ingredients);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_add(
    coordinator: &Coordinator,
    name: &str,
    ingredients: &[String],
    description: Option<&str>,
    image: Option<&str>,
    json: bool,
) -> Result<()> {
    let recipe = coordinator.add_recipe(
        &NewRecipe {
            name: name.to_string(),
            image_url: image.map(ToString::to_string),
            description: description.map(ToString::to_string),
        },
        ingredients,
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let id = recipe.id;
        let count = ingredients.len();
        println!("Added recipe: {name} (id: {id}, {count} ingredients)");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_edit(
    coordinator: &Coordinator,
    id: i64,
    name: &str,
    ingredients: &[String],
    description: Option<&str>,
    image: Option<&str>,
    json: bool,
) -> Result<()> {
    match coordinator.replace_recipe(id, name, description, image, ingredients) {
        Ok(recipe) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&recipe)?);
            } else {
                println!("Updated recipe {id}: {name}");
            }
            Ok(())
        }
        Err(Error::NotFound(_)) => {
            if json {
                println!("{}", json_error(&format!("recipe {id} not found")));
            } else {
                eprintln!("Recipe {id} not found");
            }
            process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn cmd_recipe_delete(coordinator: &Coordinator, id: i64, json: bool) -> Result<()> {
    match coordinator.delete_recipe(id) {
        Ok(()) => {
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("Deleted recipe {id}");
            }
            Ok(())
        }
        Err(Error::NotFound(_)) => {
            if json {
                println!("{}", json_error(&format!("recipe {id} not found")));
            } else {
                eprintln!("Recipe {id} not found");
            }
            process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn cmd_search(coordinator: &Coordinator, query: &str, json: bool) -> Result<()> {
    let results = coordinator.search(query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No recipes matching '{query}'");
    } else {
        print_recipe_table(&results);
    }
    Ok(())
}

pub(crate) fn cmd_toggle_ingredient(coordinator: &Coordinator, id: i64, json: bool) -> Result<()> {
    match coordinator.toggle_ingredient(id) {
        Ok(ingredient) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ingredient)?);
            } else {
                let name = &ingredient.name;
                if ingredient.has_item {
                    println!("Checked {name} (now on the shopping list)");
                } else {
                    println!("Unchecked {name}");
                }
            }
            Ok(())
        }
        Err(Error::NotFound(_)) => {
            if json {
                println!("{}", json_error(&format!("ingredient {id} not found")));
            } else {
                eprintln!("Ingredient {id} not found");
            }
            process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn cmd_seed(coordinator: &Coordinator, json: bool) -> Result<()> {
    let inserted = coordinator.seed_if_empty()?;
    if json {
        println!("{}", serde_json::json!({ "seeded": inserted }));
    } else if inserted == 0 {
        println!("Store already has recipes; nothing seeded");
    } else {
        println!("Seeded {inserted} starter recipes");
    }
    Ok(())
}
