mod commands;
mod config;
mod keepalive;
mod mealapi;
mod server;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{
    cmd_favorites_add, cmd_favorites_list, cmd_favorites_remove, cmd_meals_categories,
    cmd_meals_category, cmd_meals_ingredient, cmd_meals_random, cmd_meals_search, cmd_meals_show,
};
use crate::config::{Config, MealsConfig};
use crate::mealapi::MealApiClient;
use mealbook_core::cache::SystemClock;
use mealbook_core::db::Database;
use mealbook_core::models::{RecipeIdInput, ServingsInput, validate_new_favorite};
use mealbook_core::service::MealCatalog;

#[derive(Parser)]
#[command(
    name = "mealbook",
    version,
    about = "Recipe favorites API and meal catalog browser"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on (default: $PORT or 5001)
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to (default: $HOST or 0.0.0.0)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Manage a user's saved recipes
    Favorites {
        #[command(subcommand)]
        command: FavoriteCommands,
    },
    /// Browse the remote meal catalog
    Meals {
        #[command(subcommand)]
        command: MealCommands,
    },
}

#[derive(Subcommand)]
enum FavoriteCommands {
    /// List a user's favorites
    List {
        /// User ID
        user_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a recipe as a favorite
    Add {
        /// User ID
        user_id: String,
        /// Recipe ID (from the meal catalog)
        recipe_id: String,
        /// Recipe title
        title: String,
        /// Image URL
        #[arg(long)]
        image: Option<String>,
        /// Cook time, e.g. "30 minutes"
        #[arg(long)]
        cook_time: Option<String>,
        /// Servings, e.g. "4"
        #[arg(long)]
        servings: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a recipe from a user's favorites
    Remove {
        /// User ID
        user_id: String,
        /// Recipe ID
        recipe_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Search meals by name
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one meal with ingredients and instructions
    Show {
        /// Meal ID (`idMeal` or catalog id)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pick random meals (one, shown in full, unless --count is given)
    Random {
        /// Number of meals to pick
        #[arg(short, long)]
        count: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meal categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals in a category (exact match)
    Category {
        /// Category name, e.g. "Seafood"
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals that use an ingredient
    Ingredient {
        /// Ingredient name (substring match)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mealbook=info,mealbook_core=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn build_catalog(meals: &MealsConfig) -> Result<MealCatalog> {
    let client = MealApiClient::new(meals.api_url.clone())?;
    tracing::debug!(url = client.url(), ttl = ?meals.cache_ttl, "meal catalog configured");
    Ok(MealCatalog::with_clock(
        Arc::new(client),
        Arc::new(SystemClock),
        meals.cache_ttl,
    ))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            let db = Database::open_url(&config.database_url)?;
            let catalog = build_catalog(&config.meals)?;

            if config.environment.is_production() {
                if let Some(url) = config.api_url.clone() {
                    tracing::info!(%url, "starting keep-alive job");
                    let _pinger = keepalive::spawn(url, keepalive::PING_INTERVAL)?;
                }
            }

            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or_else(|| config.host.clone());
            server::start_server(db, catalog, &bind, port, &config.host).await
        }
        Commands::Favorites { command } => {
            let config = Config::load()?;
            let db = Database::open_url(&config.database_url)?;
            match command {
                FavoriteCommands::List { user_id, json } => {
                    cmd_favorites_list(&db, &user_id, json)
                }
                FavoriteCommands::Add {
                    user_id,
                    recipe_id,
                    title,
                    image,
                    cook_time,
                    servings,
                    json,
                } => {
                    let new_favorite = validate_new_favorite(
                        Some(user_id),
                        Some(&RecipeIdInput::Text(recipe_id)),
                        Some(title),
                        image,
                        cook_time,
                        servings.map(ServingsInput::Text),
                    )?;
                    cmd_favorites_add(&db, &new_favorite, json)
                }
                FavoriteCommands::Remove {
                    user_id,
                    recipe_id,
                    json,
                } => cmd_favorites_remove(&db, &user_id, &recipe_id, json),
            }
        }
        Commands::Meals { command } => {
            let meals = MealsConfig::load()?;
            let catalog = build_catalog(&meals)?;
            match command {
                MealCommands::Search { query, json } => {
                    cmd_meals_search(&catalog, &query, json).await
                }
                MealCommands::Show { id, json } => cmd_meals_show(&catalog, &id, json).await,
                MealCommands::Random { count, json } => {
                    cmd_meals_random(&catalog, count, json).await
                }
                MealCommands::Categories { json } => cmd_meals_categories(&catalog, json).await,
                MealCommands::Category { name, json } => {
                    cmd_meals_category(&catalog, &name, json).await
                }
                MealCommands::Ingredient { name, json } => {
                    cmd_meals_ingredient(&catalog, &name, json).await
                }
            }
        }
    }
}
