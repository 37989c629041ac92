use anyhow::Result;
use std::process;

use mealbook_core::mealdb::{RawMeal, transform_meal};
use mealbook_core::models::Meal;
use mealbook_core::service::MealCatalog;

use super::helpers::{print_category_table, print_json, print_meal_detail, print_meal_table};

fn print_meals(raw: &[RawMeal], empty_message: &str, json: bool) -> Result<()> {
    if raw.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("{empty_message}");
        }
        process::exit(2);
    }

    let meals: Vec<Meal> = raw.iter().map(transform_meal).collect();
    if json {
        print_json(&meals)
    } else {
        print_meal_table(&meals);
        Ok(())
    }
}

fn print_one(raw: Option<RawMeal>, empty_message: &str, json: bool) -> Result<()> {
    let Some(raw) = raw else {
        if json {
            println!("null");
        } else {
            eprintln!("{empty_message}");
        }
        process::exit(2);
    };

    let meal = transform_meal(&raw);
    if json {
        print_json(&meal)
    } else {
        print_meal_detail(&meal);
        Ok(())
    }
}

pub(crate) async fn cmd_meals_search(catalog: &MealCatalog, query: &str, json: bool) -> Result<()> {
    let results = catalog.search_by_name(query).await;
    print_meals(&results, &format!("No meals found for '{query}'"), json)
}

pub(crate) async fn cmd_meals_show(catalog: &MealCatalog, id: &str, json: bool) -> Result<()> {
    let meal = catalog.get_by_id(id).await;
    print_one(meal, &format!("No meal found with id '{id}'"), json)
}

pub(crate) async fn cmd_meals_random(
    catalog: &MealCatalog,
    count: Option<usize>,
    json: bool,
) -> Result<()> {
    match count {
        Some(count) => {
            let meals = catalog.random_meals(count).await;
            print_meals(&meals, "No meals available", json)
        }
        None => {
            let meal = catalog.random_meal().await;
            print_one(meal, "No meals available", json)
        }
    }
}

pub(crate) async fn cmd_meals_categories(catalog: &MealCatalog, json: bool) -> Result<()> {
    let categories = catalog.categories().await;

    if categories.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No categories available");
        }
        process::exit(2);
    }

    if json {
        print_json(&categories)
    } else {
        print_category_table(&categories);
        Ok(())
    }
}

pub(crate) async fn cmd_meals_category(
    catalog: &MealCatalog,
    category: &str,
    json: bool,
) -> Result<()> {
    let meals = catalog.filter_by_category(category).await;
    print_meals(&meals, &format!("No meals in category '{category}'"), json)
}

pub(crate) async fn cmd_meals_ingredient(
    catalog: &MealCatalog,
    ingredient: &str,
    json: bool,
) -> Result<()> {
    let meals = catalog.filter_by_ingredient(ingredient).await;
    print_meals(&meals, &format!("No meals use '{ingredient}'"), json)
}
