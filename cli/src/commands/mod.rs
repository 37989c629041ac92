mod favorites;
mod helpers;
mod meals;

pub(crate) use favorites::{cmd_favorites_add, cmd_favorites_list, cmd_favorites_remove};
pub(crate) use meals::{
    cmd_meals_categories, cmd_meals_category, cmd_meals_ingredient, cmd_meals_random,
    cmd_meals_search, cmd_meals_show,
};
