//! Meal plan use cases: plans, their recipes and creators, grocery lists.

use crate::app::recipe::{map_nutrition_totals, NutritionTotalsDto};
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryListCreateReq {
    pub grocery_list_id: i64,
    pub total_price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroceryListDto {
    pub grocery_list_id: i64,
    pub total_price: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanCreateReq {
    pub meal_plan_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub grocery_list_id: Option<i64>,
    /// User recorded as the plan's creator, in the same transaction.
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealPlanDto {
    pub meal_plan_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub grocery_list_id: Option<i64>,
}

fn map_meal_plan(row: &Row<'_>) -> rusqlite::Result<MealPlanDto> {
    Ok(MealPlanDto {
        meal_plan_id: row.get(0)?,
        start_date: row.get(1)?,
        end_date: row.get(2)?,
        grocery_list_id: row.get(3)?,
    })
}

pub fn grocery_list_create(
    pool: &DbPool,
    req: GroceryListCreateReq,
) -> Result<GroceryListDto, AppError> {
    let conn = get_connection(pool)?;
    insert_grocery_list(&conn, req)
}

pub(crate) fn insert_grocery_list(
    conn: &Connection,
    req: GroceryListCreateReq,
) -> Result<GroceryListDto, AppError> {
    let total_price = req.total_price.unwrap_or(0);
    if total_price < 0 {
        return Err(AppError::Validation("total_price must not be negative".into()));
    }
    conn.execute(
        "INSERT INTO grocery_lists (grocery_list_id, total_price) VALUES (?1, ?2)",
        params![req.grocery_list_id, total_price],
    )?;
    log::info!("Created grocery list {}", req.grocery_list_id);
    Ok(GroceryListDto {
        grocery_list_id: req.grocery_list_id,
        total_price,
    })
}

pub fn grocery_list_add_ingredient(
    pool: &DbPool,
    grocery_list_id: i64,
    ingredient_name: &str,
) -> Result<(), AppError> {
    let conn = get_connection(pool)?;
    insert_grocery_list_item(&conn, grocery_list_id, ingredient_name)
}

pub(crate) fn insert_grocery_list_item(
    conn: &Connection,
    grocery_list_id: i64,
    ingredient_name: &str,
) -> Result<(), AppError> {
    let ingredient_name = ingredient_name.trim();
    if ingredient_name.is_empty() {
        return Err(AppError::Validation("ingredient_name is required".into()));
    }
    conn.execute(
        "INSERT INTO grocery_list_contains_ingredient (grocery_list_id, ingredient_name) VALUES (?1, ?2)",
        params![grocery_list_id, ingredient_name],
    )?;
    log::info!("Added {} to grocery list {}", ingredient_name, grocery_list_id);
    Ok(())
}

pub fn meal_plan_create(pool: &DbPool, req: MealPlanCreateReq) -> Result<MealPlanDto, AppError> {
    let conn = get_connection(pool)?;
    let tx = conn.unchecked_transaction()?;
    let dto = insert_meal_plan(&tx, req)?;
    tx.commit()?;
    Ok(dto)
}

/// Plan row plus the optional creator link; the caller owns the transaction.
pub(crate) fn insert_meal_plan(conn: &Connection, req: MealPlanCreateReq) -> Result<MealPlanDto, AppError> {
    if let Some(end) = req.end_date {
        if end < req.start_date {
            return Err(AppError::Validation("end_date is before start_date".into()));
        }
    }

    conn.execute(
        "INSERT INTO meal_plans (meal_plan_id, start_date, end_date, grocery_list_id) VALUES (?1, ?2, ?3, ?4)",
        params![req.meal_plan_id, req.start_date, req.end_date, req.grocery_list_id],
    )?;
    if let Some(user_id) = req.created_by {
        conn.execute(
            "INSERT INTO user_creates_meal_plan (user_id, meal_plan_id) VALUES (?1, ?2)",
            params![user_id, req.meal_plan_id],
        )?;
    }
    log::info!("Created meal plan {}", req.meal_plan_id);

    Ok(MealPlanDto {
        meal_plan_id: req.meal_plan_id,
        start_date: req.start_date,
        end_date: req.end_date,
        grocery_list_id: req.grocery_list_id,
    })
}

/// Record an additional creator of an existing meal plan.
pub fn meal_plan_add_creator(pool: &DbPool, meal_plan_id: i64, user_id: i64) -> Result<(), AppError> {
    let conn = get_connection(pool)?;
    conn.execute(
        "INSERT INTO user_creates_meal_plan (user_id, meal_plan_id) VALUES (?1, ?2)",
        params![user_id, meal_plan_id],
    )?;
    Ok(())
}

pub fn meal_plan_add_recipe(pool: &DbPool, meal_plan_id: i64, recipe_id: i64) -> Result<(), AppError> {
    let conn = get_connection(pool)?;
    insert_meal_plan_recipe(&conn, meal_plan_id, recipe_id)
}

pub(crate) fn insert_meal_plan_recipe(
    conn: &Connection,
    meal_plan_id: i64,
    recipe_id: i64,
) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO meal_plan_contains_recipe (meal_plan_id, recipe_id) VALUES (?1, ?2)",
        params![meal_plan_id, recipe_id],
    )?;
    log::info!("Added recipe {} to meal plan {}", recipe_id, meal_plan_id);
    Ok(())
}

pub fn meal_plan_get(pool: &DbPool, meal_plan_id: i64) -> Result<MealPlanDto, AppError> {
    let conn = get_connection(pool)?;
    conn.query_row(
        "SELECT meal_plan_id, start_date, end_date, grocery_list_id FROM meal_plans WHERE meal_plan_id = ?1",
        [meal_plan_id],
        map_meal_plan,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("meal plan {}", meal_plan_id)))
}

pub fn meal_plans_created_by(pool: &DbPool, user_id: i64) -> Result<Vec<MealPlanDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT mp.meal_plan_id, mp.start_date, mp.end_date, mp.grocery_list_id
         FROM meal_plans mp
         JOIN user_creates_meal_plan ucmp ON ucmp.meal_plan_id = mp.meal_plan_id
         WHERE ucmp.user_id = ?1
         ORDER BY mp.start_date, mp.meal_plan_id",
    )?;
    let rows = stmt.query_map([user_id], map_meal_plan)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Ingredient names on the grocery list attached to a meal plan.
/// Empty when the plan has no list or does not exist.
pub fn meal_plan_grocery_ingredients(
    pool: &DbPool,
    meal_plan_id: i64,
) -> Result<Vec<String>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT gci.ingredient_name
         FROM meal_plans mp
         JOIN grocery_list_contains_ingredient gci ON gci.grocery_list_id = mp.grocery_list_id
         WHERE mp.meal_plan_id = ?1
         ORDER BY gci.ingredient_name",
    )?;
    let rows = stmt.query_map([meal_plan_id], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Per-recipe nutrition totals for every recipe in a meal plan.
pub fn meal_plan_nutrition(
    pool: &DbPool,
    meal_plan_id: i64,
) -> Result<Vec<NutritionTotalsDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name,
                SUM(rhi.quantity * ini.calories) AS total_calories,
                SUM(rhi.quantity * ini.fat) AS total_fat,
                SUM(rhi.quantity * ini.protein) AS total_protein
         FROM meal_plan_contains_recipe mpr
         JOIN recipes r ON r.id = mpr.recipe_id
         JOIN recipe_has_ingredient rhi ON rhi.recipe_id = r.id
         JOIN ingredient_nutritional_info ini ON ini.name = rhi.ingredient_name
         WHERE mpr.meal_plan_id = ?1
         GROUP BY r.id, r.name
         ORDER BY r.id",
    )?;
    let rows = stmt.query_map([meal_plan_id], map_nutrition_totals)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Delete a meal plan; creator and recipe links cascade.
/// Returns rows affected, 0 for an unknown id.
pub fn meal_plan_delete(pool: &DbPool, meal_plan_id: i64) -> Result<usize, AppError> {
    let conn = get_connection(pool)?;
    let affected = conn.execute("DELETE FROM meal_plans WHERE meal_plan_id = ?1", [meal_plan_id])?;
    if affected == 0 {
        log::debug!("Meal plan {} not present, nothing deleted", meal_plan_id);
    } else {
        log::info!("Deleted meal plan {}", meal_plan_id);
    }
    Ok(affected)
}
