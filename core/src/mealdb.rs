use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{
    DEFAULT_CATEGORY, DEFAULT_COOK_TIME, DEFAULT_DESCRIPTION, DEFAULT_SERVINGS, Meal,
};

/// Number of indexed `strIngredientN` / `strMeasureN` slots a meal carries.
pub const INGREDIENT_SLOTS: usize = 20;

const DESCRIPTION_CHARS: usize = 120;

/// One meal object exactly as the remote collection returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMeal(pub Map<String, Value>);

impl RawMeal {
    /// A field rendered as text. Numbers are rendered in decimal, with whole
    /// floats losing their fraction (`52772.0` reads as `52772`). Everything
    /// else that is not a string is treated as absent.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(match n.as_f64() {
                Some(f) if n.is_f64() && f.is_finite() && f.fract().abs() < f64::EPSILON => {
                    format!("{f:.0}")
                }
                _ => n.to_string(),
            }),
            _ => None,
        }
    }

    /// Like [`RawMeal::text`] but empty strings count as absent.
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.text(key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.non_empty("strMeal")
    }

    #[must_use]
    pub fn category(&self) -> Option<String> {
        self.non_empty("strCategory")
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        self.non_empty("strMealThumb")
    }

    #[must_use]
    pub fn ingredient(&self, slot: usize) -> Option<String> {
        self.text(&format!("strIngredient{slot}"))
    }

    #[must_use]
    pub fn measure(&self, slot: usize) -> Option<String> {
        self.text(&format!("strMeasure{slot}"))
    }

    /// Whether either identifier field equals `id` when both are compared as strings.
    #[must_use]
    pub fn has_id(&self, id: &str) -> bool {
        self.text("idMeal").as_deref() == Some(id) || self.text("id").as_deref() == Some(id)
    }

    /// Case-insensitive substring match over every ingredient slot.
    #[must_use]
    pub fn uses_ingredient(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        (1..=INGREDIENT_SLOTS).any(|slot| {
            self.ingredient(slot)
                .is_some_and(|ing| !ing.is_empty() && ing.to_lowercase().contains(&needle))
        })
    }
}

#[derive(Debug, Deserialize)]
struct MealsEnvelope {
    meals: Vec<RawMeal>,
}

/// Every response shape the meal collection has been seen to return.
///
/// Variant order matters: an array of envelopes is tried before a bare array
/// so `[{ "meals": [...] }]` unwraps instead of being read as one meal.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MealResponse {
    Envelopes(Vec<MealsEnvelope>),
    Bare(Vec<RawMeal>),
    Meals { meals: Vec<RawMeal> },
    Data { data: Vec<RawMeal> },
}

impl MealResponse {
    fn into_meals(self) -> Vec<RawMeal> {
        match self {
            Self::Envelopes(envelopes) => envelopes.into_iter().flat_map(|e| e.meals).collect(),
            Self::Bare(meals) | Self::Meals { meals } | Self::Data { data: meals } => meals,
        }
    }
}

/// Decode a response body into its list of meals.
///
/// Fails when the body is not one of the recognized shapes instead of
/// pretending the collection is empty.
pub fn decode_meals(body: Value) -> Result<Vec<RawMeal>> {
    let response: MealResponse = serde_json::from_value(body).context(
        "Unrecognized meal response shape: expected an array of meals, an array of \
         {meals} envelopes, {meals: [...]} or {data: [...]}",
    )?;
    Ok(response.into_meals())
}

/// Normalize one raw meal into the app's [`Meal`] shape.
#[must_use]
pub fn transform_meal(raw: &RawMeal) -> Meal {
    let ingredients = (1..=INGREDIENT_SLOTS)
        .filter_map(|slot| {
            let ingredient = raw.ingredient(slot)?;
            let ingredient = ingredient.trim();
            if ingredient.is_empty() {
                return None;
            }
            let measure = raw.measure(slot).unwrap_or_default();
            let measure = measure.trim();
            if measure.is_empty() {
                Some(ingredient.to_string())
            } else {
                Some(format!("{measure} {ingredient}"))
            }
        })
        .collect();

    let raw_instructions = raw.non_empty("strInstructions");
    let instructions = raw_instructions
        .as_deref()
        .map(|text| {
            text.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line))
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let description = raw_instructions.as_deref().map_or_else(
        || DEFAULT_DESCRIPTION.to_string(),
        |text| {
            let head: String = text.chars().take(DESCRIPTION_CHARS).collect();
            format!("{head}...")
        },
    );

    let image = raw
        .thumbnail()
        .or_else(|| raw.non_empty("image"))
        .or_else(|| raw.non_empty("thumbnail"));
    let title = raw.title();

    if title.is_none() || image.is_none() {
        tracing::warn!(
            meal = %serde_json::Value::Object(raw.0.clone()),
            "meal is missing a title or image"
        );
    }

    Meal {
        id: raw.text("idMeal").or_else(|| raw.text("id")),
        title: title.unwrap_or_default(),
        description,
        image,
        cook_time: DEFAULT_COOK_TIME.to_string(),
        servings: DEFAULT_SERVINGS,
        category: raw
            .category()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        area: raw.non_empty("strArea"),
        ingredients,
        instructions,
        youtube_url: raw.non_empty("strYoutube"),
        original_data: raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn raw(value: Value) -> RawMeal {
        serde_json::from_value(value).unwrap()
    }

    fn teriyaki() -> RawMeal {
        raw(json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strCategory": "Chicken",
            "strArea": "Japanese",
            "strInstructions": "Preheat oven to 350.\r\nCombine soy sauce.\r\n\r\nServe.",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
            "strYoutube": "https://www.youtube.com/watch?v=4aZr5hZXP_s",
            "strIngredient1": "soy sauce",
            "strMeasure1": "3/4 cup",
            "strIngredient2": "water",
            "strMeasure2": "1/2 cup",
            "strIngredient3": "",
            "strMeasure3": "",
            "strIngredient4": null,
            "id": "1"
        }))
    }

    #[test]
    fn test_transform_ingredients_skip_empty_slots() {
        let meal = transform_meal(&raw(json!({
            "strMeal": "Salted",
            "strMealThumb": "x.jpg",
            "strIngredient1": "Salt",
            "strMeasure1": "1 tsp",
            "strIngredient2": ""
        })));
        assert_eq!(meal.ingredients, vec!["1 tsp Salt"]);
    }

    #[test]
    fn test_transform_ingredient_without_measure() {
        let meal = transform_meal(&raw(json!({
            "strIngredient1": "  Pepper ",
            "strMeasure1": "   ",
            "strIngredient5": "Oil",
        })));
        assert_eq!(meal.ingredients, vec!["Pepper", "Oil"]);
    }

    #[test]
    fn test_transform_instructions_split_lines() {
        let meal = transform_meal(&raw(json!({ "strInstructions": "Step one.\nStep two." })));
        assert_eq!(meal.instructions, vec!["Step one.", "Step two."]);

        let meal = transform_meal(&teriyaki());
        assert_eq!(
            meal.instructions,
            vec!["Preheat oven to 350.", "Combine soy sauce.", "Serve."]
        );
    }

    #[test]
    fn test_transform_complete() {
        let meal = transform_meal(&teriyaki());
        assert_eq!(meal.id.as_deref(), Some("52772"));
        assert_eq!(meal.title, "Teriyaki Chicken Casserole");
        assert_eq!(meal.category, "Chicken");
        assert_eq!(meal.area.as_deref(), Some("Japanese"));
        assert_eq!(meal.cook_time, "30 minutes");
        assert_eq!(meal.servings, 4);
        assert_eq!(meal.ingredients, vec!["3/4 cup soy sauce", "1/2 cup water"]);
        assert!(meal.image.unwrap().ends_with("wvpsxx1468256321.jpg"));
        assert_eq!(
            meal.youtube_url.as_deref(),
            Some("https://www.youtube.com/watch?v=4aZr5hZXP_s")
        );
        assert_eq!(meal.original_data, teriyaki());
    }

    #[test]
    fn test_transform_defaults() {
        let meal = transform_meal(&raw(json!({ "id": 9 })));
        assert_eq!(meal.id.as_deref(), Some("9"));
        assert_eq!(meal.title, "");
        assert!(meal.image.is_none());
        assert_eq!(meal.category, "Main Course");
        assert_eq!(meal.description, "Delicious meal from TheMealDB");
        assert!(meal.ingredients.is_empty());
        assert!(meal.instructions.is_empty());
    }

    #[test]
    fn test_transform_warns_on_missing_title_or_image() {
        let logs = capture_logs(|| {
            let _ = transform_meal(&raw(json!({ "idMeal": "77", "strMealThumb": "x.png" })));
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("meal is missing a title or image"));
        assert!(logs.contains("\"idMeal\":\"77\""));

        let logs = capture_logs(|| {
            let _ = transform_meal(&teriyaki());
        });
        assert!(!logs.contains("missing a title or image"));
    }

    #[test]
    fn test_transform_image_fallbacks() {
        let meal = transform_meal(&raw(json!({ "strMeal": "A", "image": "a.png" })));
        assert_eq!(meal.image.as_deref(), Some("a.png"));

        let meal = transform_meal(&raw(json!({ "strMeal": "B", "strMealThumb": "", "thumbnail": "b.png" })));
        assert_eq!(meal.image.as_deref(), Some("b.png"));
    }

    #[test]
    fn test_transform_description_truncates() {
        let long = "a".repeat(200);
        let meal = transform_meal(&raw(json!({ "strInstructions": long })));
        assert_eq!(meal.description.len(), 123);
        assert!(meal.description.ends_with("..."));
    }

    #[test]
    fn test_decode_bare_array() {
        let meals = decode_meals(json!([{ "strMeal": "A" }, { "strMeal": "B" }])).unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[1].title().as_deref(), Some("B"));
    }

    #[test]
    fn test_decode_meals_object() {
        let meals = decode_meals(json!({ "meals": [{ "strMeal": "A" }] })).unwrap();
        assert_eq!(meals.len(), 1);
    }

    #[test]
    fn test_decode_data_object() {
        let meals = decode_meals(json!({ "data": [{ "strMeal": "A" }, { "strMeal": "B" }] })).unwrap();
        assert_eq!(meals.len(), 2);
    }

    #[test]
    fn test_decode_single_envelope_array() {
        let meals = decode_meals(json!([{ "meals": [{ "strMeal": "A" }, { "strMeal": "B" }] }])).unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].title().as_deref(), Some("A"));
    }

    #[test]
    fn test_decode_many_envelopes_flatten() {
        let meals = decode_meals(json!([
            { "meals": [{ "strMeal": "A" }] },
            { "meals": [{ "strMeal": "B" }, { "strMeal": "C" }] }
        ]))
        .unwrap();
        let titles: Vec<_> = meals.iter().filter_map(RawMeal::title).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode_meals(json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_decode_unrecognized_shape() {
        assert!(decode_meals(json!({ "results": [] })).is_err());
        assert!(decode_meals(json!("nope")).is_err());
        assert!(decode_meals(json!({ "meals": null })).is_err());
        assert!(decode_meals(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_has_id_matches_either_field() {
        let meal = teriyaki();
        assert!(meal.has_id("52772"));
        assert!(meal.has_id("1"));
        assert!(!meal.has_id("2"));

        let numeric = raw(json!({ "idMeal": 52772 }));
        assert!(numeric.has_id("52772"));
    }

    #[test]
    fn test_whole_float_id_renders_without_fraction() {
        let meal = raw(json!({ "idMeal": 52772.0, "strMeal": "Teriyaki" }));
        assert_eq!(meal.text("idMeal").as_deref(), Some("52772"));
        assert!(meal.has_id("52772"));
        assert_eq!(transform_meal(&meal).id.as_deref(), Some("52772"));

        let fractional = raw(json!({ "idMeal": 1.5 }));
        assert_eq!(fractional.text("idMeal").as_deref(), Some("1.5"));
    }

    #[test]
    fn test_uses_ingredient_case_insensitive() {
        let meal = teriyaki();
        assert!(meal.uses_ingredient("SOY"));
        assert!(meal.uses_ingredient("wat"));
        assert!(!meal.uses_ingredient("beef"));
    }
}
