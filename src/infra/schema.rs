//! Table catalog and schema (re)initialization.

use crate::error::AppError;
use crate::infra::db::run_migrations;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Every table of the data model, parents before children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Allergies,
    UserHasAllergy,
    Recipes,
    Ingredients,
    IngredientNutritionalInfo,
    RecipeHasIngredient,
    GroceryLists,
    GroceryListContainsIngredient,
    MealPlans,
    MealPlanContainsRecipe,
    UserCreatesMealPlan,
    Ratings,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Allergies => "allergies",
            Self::UserHasAllergy => "user_has_allergy",
            Self::Recipes => "recipes",
            Self::Ingredients => "ingredients",
            Self::IngredientNutritionalInfo => "ingredient_nutritional_info",
            Self::RecipeHasIngredient => "recipe_has_ingredient",
            Self::GroceryLists => "grocery_lists",
            Self::GroceryListContainsIngredient => "grocery_list_contains_ingredient",
            Self::MealPlans => "meal_plans",
            Self::MealPlanContainsRecipe => "meal_plan_contains_recipe",
            Self::UserCreatesMealPlan => "user_creates_meal_plan",
            Self::Ratings => "ratings",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == s)
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Users,
            Self::Allergies,
            Self::UserHasAllergy,
            Self::Recipes,
            Self::Ingredients,
            Self::IngredientNutritionalInfo,
            Self::RecipeHasIngredient,
            Self::GroceryLists,
            Self::GroceryListContainsIngredient,
            Self::MealPlans,
            Self::MealPlanContainsRecipe,
            Self::UserCreatesMealPlan,
            Self::Ratings,
        ]
    }
}

/// Drop every table (children first, missing tables ignored) and re-apply migrations.
pub fn reset(conn: &Connection) -> Result<(), AppError> {
    {
        let tx = conn.unchecked_transaction()?;
        for table in Table::all().iter().rev() {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", table.as_str()), [])?;
        }
        tx.execute("DROP TABLE IF EXISTS schema_migrations", [])?;
        tx.commit()?;
    }
    run_migrations(conn)
}

/// Row count of one table. The table name comes from the fixed catalog only.
pub fn count_rows(conn: &Connection, table: Table) -> Result<i64, AppError> {
    let n = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.as_str()),
        [],
        |r| r.get(0),
    )?;
    Ok(n)
}
