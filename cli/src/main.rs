mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_config_get, cmd_config_set, cmd_recipe_add, cmd_recipe_delete, cmd_recipe_edit,
    cmd_recipe_list, cmd_recipe_show, cmd_search, cmd_seed, cmd_shop_add, cmd_shop_clear,
    cmd_shop_delete, cmd_shop_list, cmd_shop_reset, cmd_shop_toggle, cmd_toggle_ingredient,
    cmd_watch,
};
use crate::config::Config;
use pantry_core::{Coordinator, Database};

#[derive(Parser)]
#[command(
    name = "pantry",
    version,
    about = "A local-first recipe and shopping-list manager",
    long_about = "Keep recipes, their ingredients, and your shopping list in one place,\n\
                  and in sync: check an ingredient and it lands on the list; tick it\n\
                  off at the store and the recipe knows."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage the shopping list
    Shop {
        #[command(subcommand)]
        command: ShopCommands,
    },
    /// Search recipes by name (substring, case-insensitive)
    Search {
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle an ingredient's "have it" check by ingredient ID
    Toggle {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Insert the starter catalog if no recipes exist yet
    Seed {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read or change app settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Live view of the selected recipe and shopping list
    Watch {
        /// Also reset all checks every N seconds (the periodic cleanup)
        #[arg(long, value_name = "SECS")]
        reset_every: Option<u64>,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// List all recipes
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe with its ingredients
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Add a recipe with its ingredient names
    Add {
        name: String,
        /// Ingredient name (repeatable)
        #[arg(short, long = "ingredient", required = true)]
        ingredients: Vec<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Image URL
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Replace a recipe's fields and its whole ingredient list
    Edit {
        id: i64,
        #[arg(long)]
        name: String,
        /// Ingredient name (repeatable); replaces the old list entirely
        #[arg(short, long = "ingredient", required = true)]
        ingredients: Vec<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe and its ingredients
    Delete {
        id: i64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ShopCommands {
    /// Show the shopping list
    List {
        #[arg(long)]
        json: bool,
    },
    /// Add an item (no-op if an item with that exact name exists)
    Add {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Toggle an item's "got it" check; unchecking resets matching
    /// recipe ingredients
    Toggle {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Delete an item and reset matching recipe ingredients
    Delete {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Delete everything and reset all ingredient checks
    Clear {
        #[arg(long)]
        json: bool,
    },
    /// Uncheck every item without deleting anything
    Reset {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show one setting, or all of them
    Get {
        key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Change a setting (dark-mode, notifications, default-servings)
    Set {
        key: String,
        value: String,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;

    let command = match cli.command {
        Commands::Watch { reset_every } => return cmd_watch(db, reset_every).await,
        command => command,
    };

    let coordinator = Coordinator::new(db);
    match command {
        Commands::Recipe { command } => match command {
            RecipeCommands::List { json } => cmd_recipe_list(&coordinator, json),
            RecipeCommands::Show { id, json } => cmd_recipe_show(&coordinator, id, json),
            RecipeCommands::Add {
                name,
                ingredients,
                description,
                image,
                json,
            } => cmd_recipe_add(
                &coordinator,
                &name,
                &ingredients,
                description.as_deref(),
                image.as_deref(),
                json,
            ),
            RecipeCommands::Edit {
                id,
                name,
                ingredients,
                description,
                image,
                json,
            } => cmd_recipe_edit(
                &coordinator,
                id,
                &name,
                &ingredients,
                description.as_deref(),
                image.as_deref(),
                json,
            ),
            RecipeCommands::Delete { id, json } => cmd_recipe_delete(&coordinator, id, json),
        },
        Commands::Shop { command } => match command {
            ShopCommands::List { json } => cmd_shop_list(&coordinator, json),
            ShopCommands::Add { name, json } => cmd_shop_add(&coordinator, &name, json),
            ShopCommands::Toggle { id, json } => cmd_shop_toggle(&coordinator, id, json),
            ShopCommands::Delete { id, json } => cmd_shop_delete(&coordinator, id, json),
            ShopCommands::Clear { json } => cmd_shop_clear(&coordinator, json),
            ShopCommands::Reset { json } => cmd_shop_reset(&coordinator, json),
        },
        Commands::Search { query, json } => cmd_search(&coordinator, &query, json),
        Commands::Toggle { id, json } => cmd_toggle_ingredient(&coordinator, id, json),
        Commands::Seed { json } => cmd_seed(&coordinator, json),
        Commands::Config { command } => match command {
            ConfigCommands::Get { key, json } => cmd_config_get(&coordinator, key.as_deref(), json),
            ConfigCommands::Set { key, value, json } => {
                cmd_config_set(&coordinator, &key, &value, json)
            }
        },
        Commands::Watch { .. } => Ok(()),
    }
}
