use anyhow::Result;
use std::process;

use mealbook_core::db::Database;
use mealbook_core::models::{NewFavorite, parse_recipe_id};

use super::helpers::{print_favorite_table, print_json};

pub(crate) fn cmd_favorites_list(db: &Database, user_id: &str, json: bool) -> Result<()> {
    let favorites = db.list_favorites(user_id)?;

    if favorites.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No favorites saved for '{user_id}'");
        }
        process::exit(2);
    }

    if json {
        print_json(&favorites)
    } else {
        print_favorite_table(&favorites);
        Ok(())
    }
}

pub(crate) fn cmd_favorites_add(
    db: &Database,
    new_favorite: &NewFavorite,
    json: bool,
) -> Result<()> {
    let favorite = db.insert_favorite(new_favorite)?;

    if json {
        print_json(&favorite)
    } else {
        let title = &favorite.title;
        let id = favorite.id;
        println!("Saved favorite: {title} (id: {id})");
        Ok(())
    }
}

pub(crate) fn cmd_favorites_remove(
    db: &Database,
    user_id: &str,
    recipe_id: &str,
    json: bool,
) -> Result<()> {
    let recipe_id = parse_recipe_id(recipe_id)?;
    let removed = db.delete_favorite(user_id, recipe_id)?;

    if json {
        print_json(&serde_json::json!({
            "message": "Favorite removed successfully",
            "removed": removed,
        }))
    } else {
        if removed == 0 {
            println!("Recipe {recipe_id} was not in the favorites of '{user_id}'");
        } else {
            println!("Removed recipe {recipe_id} from the favorites of '{user_id}'");
        }
        Ok(())
    }
}
