use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::mealdb::RawMeal;

/// A user's saved reference to an external recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i64,
    pub user_id: String,
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub user_id: String,
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
}

/// A recipe id as clients send it: mobile clients post either the integer or
/// the id string they got from the meal API.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeIdInput {
    Int(i64),
    Text(String),
}

impl RecipeIdInput {
    #[must_use]
    pub fn as_id(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Servings arrive as `4` or `"4 people"`; both are stored as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServingsInput {
    Number(serde_json::Number),
    Text(String),
}

impl ServingsInput {
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Build a [`NewFavorite`] from loosely-typed request fields.
///
/// `user_id`, `recipe_id` and `title` are required; empty strings and a zero
/// recipe id count as missing.
pub fn validate_new_favorite(
    user_id: Option<String>,
    recipe_id: Option<&RecipeIdInput>,
    title: Option<String>,
    image: Option<String>,
    cook_time: Option<String>,
    servings: Option<ServingsInput>,
) -> Result<NewFavorite> {
    let user_id = user_id.filter(|u| !u.is_empty());
    let title = title.filter(|t| !t.is_empty());
    let recipe_id = recipe_id.and_then(RecipeIdInput::as_id).filter(|id| *id != 0);

    let (Some(user_id), Some(recipe_id), Some(title)) = (user_id, recipe_id, title) else {
        bail!("Missing required fields");
    };

    Ok(NewFavorite {
        user_id,
        recipe_id,
        title,
        image,
        cook_time,
        servings: servings.map(ServingsInput::into_text),
    })
}

/// Parse the `recipeId` path segment of a delete request.
pub fn parse_recipe_id(raw: &str) -> Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) => Ok(id),
        Err(_) => bail!("Invalid recipe id '{raw}'. Must be an integer"),
    }
}

pub const DEFAULT_COOK_TIME: &str = "30 minutes";
pub const DEFAULT_SERVINGS: u32 = 4;
pub const DEFAULT_CATEGORY: &str = "Main Course";
pub const DEFAULT_DESCRIPTION: &str = "Delicious meal from TheMealDB";

/// A meal normalized from the remote collection into the shape the app renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub cook_time: String,
    pub servings: u32,
    pub category: String,
    pub area: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub youtube_url: Option<String>,
    pub original_data: RawMeal,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MealCategory {
    pub id: usize,
    #[serde(rename = "strCategory")]
    pub name: String,
    #[serde(rename = "strCategoryThumb")]
    pub thumbnail: Option<String>,
    #[serde(rename = "strCategoryDescription")]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_favorite_complete() {
        let fav = validate_new_favorite(
            Some("user_1".to_string()),
            Some(&RecipeIdInput::Int(52772)),
            Some("Teriyaki Chicken".to_string()),
            Some("https://example.com/t.jpg".to_string()),
            Some("30 minutes".to_string()),
            Some(ServingsInput::Number(4.into())),
        )
        .unwrap();
        assert_eq!(fav.user_id, "user_1");
        assert_eq!(fav.recipe_id, 52772);
        assert_eq!(fav.title, "Teriyaki Chicken");
        assert_eq!(fav.servings.as_deref(), Some("4"));
    }

    #[test]
    fn test_validate_new_favorite_missing_fields() {
        let id = RecipeIdInput::Int(1);
        assert!(
            validate_new_favorite(None, Some(&id), Some("T".to_string()), None, None, None)
                .is_err()
        );
        assert!(
            validate_new_favorite(Some("u".to_string()), None, Some("T".to_string()), None, None, None)
                .is_err()
        );
        assert!(validate_new_favorite(Some("u".to_string()), Some(&id), None, None, None, None).is_err());

        // Empty strings and a zero id count as missing
        assert!(
            validate_new_favorite(Some(String::new()), Some(&id), Some("T".to_string()), None, None, None)
                .is_err()
        );
        assert!(
            validate_new_favorite(
                Some("u".to_string()),
                Some(&RecipeIdInput::Int(0)),
                Some("T".to_string()),
                None,
                None,
                None
            )
            .is_err()
        );
    }

    #[test]
    fn test_recipe_id_from_string() {
        assert_eq!(RecipeIdInput::Text("52772".to_string()).as_id(), Some(52772));
        assert_eq!(RecipeIdInput::Text("abc".to_string()).as_id(), None);

        let parsed: RecipeIdInput = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(parsed.as_id(), Some(42));
        let parsed: RecipeIdInput = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.as_id(), Some(42));
    }

    #[test]
    fn test_servings_text_passthrough() {
        let s: ServingsInput = serde_json::from_str("\"2-3 people\"").unwrap();
        assert_eq!(s.into_text(), "2-3 people");
    }

    #[test]
    fn test_parse_recipe_id() {
        assert_eq!(parse_recipe_id("52772").unwrap(), 52772);
        assert!(parse_recipe_id("not-a-number").is_err());
    }

    #[test]
    fn test_favorite_serializes_camel_case() {
        let fav = Favorite {
            id: 1,
            user_id: "u".to_string(),
            recipe_id: 7,
            title: "Soup".to_string(),
            image: None,
            cook_time: Some("10 minutes".to_string()),
            servings: None,
            created_at: "2024-06-15T10:00:00+00:00".to_string(),
        };
        let json = serde_json::to_value(&fav).unwrap();
        assert_eq!(json["userId"], "u");
        assert_eq!(json["recipeId"], 7);
        assert_eq!(json["cookTime"], "10 minutes");
        assert!(json["createdAt"].is_string());
    }
}
