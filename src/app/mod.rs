//! Application use cases: one function per query-layer operation.

mod admin;
mod ingredient;
mod meal_plan;
mod recipe;
mod seed;
mod user;

pub use admin::{check_connection, schema_reset, table_count, table_counts, TableCountDto};
pub use ingredient::{
    ingredient_create, ingredient_delete, ingredient_list, nutrition_projection,
    IngredientCreateReq, IngredientDto, NutritionFactsReq, ProjectionDto,
};
pub use meal_plan::{
    grocery_list_add_ingredient, grocery_list_create, meal_plan_add_creator,
    meal_plan_add_recipe, meal_plan_create, meal_plan_delete, meal_plan_get,
    meal_plan_grocery_ingredients, meal_plan_nutrition, meal_plans_created_by,
    GroceryListCreateReq, GroceryListDto, MealPlanCreateReq, MealPlanDto,
};
pub use recipe::{
    rating_create, recipe_add_ingredient, recipe_create, recipe_get, recipe_ingredient_list,
    recipe_list, recipe_nutrition, recipe_total_calories, recipes_rated_at_least,
    recipes_with_calories_over, NutritionTotalsDto, RatingCreateReq, RatingDto,
    RecipeCaloriesDto, RecipeCreateReq, RecipeDto, RecipeIngredientAddReq, RecipeIngredientDto,
};
pub use seed::seed_demo_data;
pub use user::{
    allergy_create, allergy_list, user_add_allergy, user_allergies, user_create, user_get,
    user_list, user_update, users_allergic_to_all, users_with_meal_plans_over, UserAllergyAddReq,
    UserAllergyDto, UserCreateReq, UserDto, UserMealPlanCountDto, UserUpdateReq,
};
