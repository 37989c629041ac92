use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealbook_core::models::{Favorite, Meal, MealCategory};

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_favorite_table(favorites: &[Favorite]) {
    #[derive(Tabled)]
    struct FavoriteRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Recipe")]
        recipe_id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Cook time")]
        cook_time: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Saved")]
        created_at: String,
    }

    let rows: Vec<FavoriteRow> = favorites
        .iter()
        .map(|f| FavoriteRow {
            id: f.id,
            recipe_id: f.recipe_id,
            title: truncate(&f.title, 40),
            cook_time: f.cook_time.clone().unwrap_or_else(|| "-".into()),
            servings: f.servings.clone().unwrap_or_else(|| "-".into()),
            created_at: f.created_at.chars().take(10).collect(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(0..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_meal_table(meals: &[Meal]) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Area")]
        area: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .enumerate()
        .map(|(i, m)| MealRow {
            idx: i + 1,
            id: m.id.clone().unwrap_or_else(|| "-".into()),
            title: truncate(&m.title, 40),
            category: m.category.clone(),
            area: m.area.clone().unwrap_or_default(),
            ingredients: m.ingredients.len(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_category_table(categories: &[MealCategory]) {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "#")]
        id: usize,
        #[tabled(rename = "Category")]
        name: String,
    }

    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id,
            name: c.name.clone(),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn print_meal_detail(meal: &Meal) {
    let id = meal.id.as_deref().unwrap_or("-");
    println!("{} (id: {id})", meal.title);
    match &meal.area {
        Some(area) => println!("{} · {area}", meal.category),
        None => println!("{}", meal.category),
    }
    println!(
        "Cook time: {} · Servings: {}",
        meal.cook_time, meal.servings
    );
    if let Some(image) = &meal.image {
        println!("Image: {image}");
    }
    if let Some(video) = &meal.youtube_url {
        println!("Video: {video}");
    }

    if !meal.ingredients.is_empty() {
        println!("\nIngredients:");
        for ingredient in &meal.ingredients {
            println!("  - {ingredient}");
        }
    }

    if !meal.instructions.is_empty() {
        println!("\nInstructions:");
        for (i, step) in meal.instructions.iter().enumerate() {
            println!("  {}. {}", i + 1, step.trim());
        }
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s
            .char_indices()
            .nth(max.saturating_sub(3))
            .map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Teriyaki Chicken Casserole", 10), "Teriyak...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème brûlée tart", 10), "Crème b...");
        assert_eq!(truncate("Pão", 10), "Pão");
        assert_eq!(truncate("親子丼と味噌汁のセット", 8), "親子丼と味...");
    }

    #[test]
    fn test_truncate_tiny_width() {
        assert_eq!(truncate("Teriyaki", 2), "...");
        assert_eq!(truncate("Teriyaki", 0), "...");
    }
}
