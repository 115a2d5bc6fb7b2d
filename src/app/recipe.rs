//! Recipe use cases: recipes, their ingredients, ratings and calorie reports.

use crate::domain::input::check_rating;
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCreateReq {
    pub id: i64,
    pub name: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDto {
    pub id: i64,
    pub name: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredientAddReq {
    pub recipe_id: i64,
    pub ingredient_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredientDto {
    pub recipe_id: i64,
    pub ingredient_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeCaloriesDto {
    pub recipe_id: i64,
    pub name: String,
    pub total_calories: i64,
}

/// Quantity-weighted nutrition totals of one recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NutritionTotalsDto {
    pub recipe_id: i64,
    pub name: String,
    pub total_calories: i64,
    pub total_fat: i64,
    pub total_protein: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCreateReq {
    pub rating_id: i64,
    pub overall_rating: i64,
    pub difficulty_rating: i64,
    pub user_id: i64,
    pub recipe_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingDto {
    pub rating_id: i64,
    pub overall_rating: i64,
    pub difficulty_rating: i64,
    pub user_id: i64,
    pub recipe_id: i64,
}

fn map_recipe(row: &Row<'_>) -> rusqlite::Result<RecipeDto> {
    Ok(RecipeDto {
        id: row.get(0)?,
        name: row.get(1)?,
        author: row.get(2)?,
    })
}

pub(crate) fn map_nutrition_totals(row: &Row<'_>) -> rusqlite::Result<NutritionTotalsDto> {
    Ok(NutritionTotalsDto {
        recipe_id: row.get(0)?,
        name: row.get(1)?,
        total_calories: row.get(2)?,
        total_fat: row.get(3)?,
        total_protein: row.get(4)?,
    })
}

fn map_calories(row: &Row<'_>) -> rusqlite::Result<RecipeCaloriesDto> {
    Ok(RecipeCaloriesDto {
        recipe_id: row.get(0)?,
        name: row.get(1)?,
        total_calories: row.get(2)?,
    })
}

pub fn recipe_create(pool: &DbPool, req: RecipeCreateReq) -> Result<RecipeDto, AppError> {
    let conn = get_connection(pool)?;
    insert_recipe(&conn, req)
}

pub(crate) fn insert_recipe(conn: &Connection, req: RecipeCreateReq) -> Result<RecipeDto, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    let author = req.author.unwrap_or_default();

    conn.execute(
        "INSERT INTO recipes (id, name, author) VALUES (?1, ?2, ?3)",
        params![req.id, name, &author],
    )?;
    log::info!("Created recipe {} ({})", req.id, name);

    Ok(RecipeDto {
        id: req.id,
        name: name.to_string(),
        author,
    })
}

pub fn recipe_get(pool: &DbPool, id: i64) -> Result<RecipeDto, AppError> {
    let conn = get_connection(pool)?;
    conn.query_row(
        "SELECT id, name, author FROM recipes WHERE id = ?1",
        [id],
        map_recipe,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("recipe {}", id)))
}

pub fn recipe_list(pool: &DbPool) -> Result<Vec<RecipeDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare("SELECT id, name, author FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], map_recipe)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Add an ingredient to a recipe. Recipe and ingredient must both exist.
pub fn recipe_add_ingredient(
    pool: &DbPool,
    req: RecipeIngredientAddReq,
) -> Result<RecipeIngredientDto, AppError> {
    let conn = get_connection(pool)?;
    insert_recipe_ingredient(&conn, req)
}

pub(crate) fn insert_recipe_ingredient(
    conn: &Connection,
    req: RecipeIngredientAddReq,
) -> Result<RecipeIngredientDto, AppError> {
    if req.quantity < 0 {
        return Err(AppError::Validation("quantity must not be negative".into()));
    }
    let ingredient_name = req.ingredient_name.trim().to_string();
    if ingredient_name.is_empty() {
        return Err(AppError::Validation("ingredient_name is required".into()));
    }

    conn.execute(
        "INSERT INTO recipe_has_ingredient (recipe_id, ingredient_name, quantity) VALUES (?1, ?2, ?3)",
        params![req.recipe_id, &ingredient_name, req.quantity],
    )?;
    log::info!(
        "Added {} x {} to recipe {}",
        req.quantity,
        ingredient_name,
        req.recipe_id
    );

    Ok(RecipeIngredientDto {
        recipe_id: req.recipe_id,
        ingredient_name,
        quantity: req.quantity,
    })
}

pub fn recipe_ingredient_list(pool: &DbPool) -> Result<Vec<RecipeIngredientDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT recipe_id, ingredient_name, quantity FROM recipe_has_ingredient ORDER BY recipe_id, ingredient_name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(RecipeIngredientDto {
            recipe_id: r.get(0)?,
            ingredient_name: r.get(1)?,
            quantity: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Total calories of every recipe that has at least one ingredient with nutrition facts.
pub fn recipe_total_calories(pool: &DbPool) -> Result<Vec<RecipeCaloriesDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name, SUM(rhi.quantity * ini.calories) AS total_calories
         FROM recipes r
         JOIN recipe_has_ingredient rhi ON rhi.recipe_id = r.id
         JOIN ingredients i ON i.name = rhi.ingredient_name
         JOIN ingredient_nutritional_info ini ON ini.name = i.name
         GROUP BY r.id, r.name
         ORDER BY r.id",
    )?;
    let rows = stmt.query_map([], map_calories)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Recipes whose total calories are strictly above `threshold`.
pub fn recipes_with_calories_over(
    pool: &DbPool,
    threshold: f64,
) -> Result<Vec<RecipeCaloriesDto>, AppError> {
    if !threshold.is_finite() {
        return Err(AppError::Validation("calorie threshold must be a finite number".into()));
    }
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name, SUM(rhi.quantity * ini.calories) AS total_calories
         FROM recipes r
         JOIN recipe_has_ingredient rhi ON rhi.recipe_id = r.id
         JOIN ingredients i ON i.name = rhi.ingredient_name
         JOIN ingredient_nutritional_info ini ON ini.name = i.name
         GROUP BY r.id, r.name
         HAVING SUM(rhi.quantity * ini.calories) > ?1
         ORDER BY r.id",
    )?;
    let rows = stmt.query_map([threshold], map_calories)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Nutrition totals of one recipe; zeros when it has no ingredients yet.
pub fn recipe_nutrition(pool: &DbPool, recipe_id: i64) -> Result<NutritionTotalsDto, AppError> {
    let conn = get_connection(pool)?;
    conn.query_row(
        "SELECT r.id, r.name,
                COALESCE(SUM(rhi.quantity * ini.calories), 0),
                COALESCE(SUM(rhi.quantity * ini.fat), 0),
                COALESCE(SUM(rhi.quantity * ini.protein), 0)
         FROM recipes r
         LEFT JOIN recipe_has_ingredient rhi ON rhi.recipe_id = r.id
         LEFT JOIN ingredient_nutritional_info ini ON ini.name = rhi.ingredient_name
         WHERE r.id = ?1
         GROUP BY r.id, r.name",
        [recipe_id],
        map_nutrition_totals,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("recipe {}", recipe_id)))
}

pub fn rating_create(pool: &DbPool, req: RatingCreateReq) -> Result<RatingDto, AppError> {
    let conn = get_connection(pool)?;
    insert_rating(&conn, req)
}

pub(crate) fn insert_rating(conn: &Connection, req: RatingCreateReq) -> Result<RatingDto, AppError> {
    check_rating("overall_rating", req.overall_rating)?;
    check_rating("difficulty_rating", req.difficulty_rating)?;

    conn.execute(
        "INSERT INTO ratings (rating_id, overall_rating, difficulty_rating, user_id, recipe_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            req.rating_id,
            req.overall_rating,
            req.difficulty_rating,
            req.user_id,
            req.recipe_id
        ],
    )?;
    log::info!("User {} rated recipe {}", req.user_id, req.recipe_id);

    Ok(RatingDto {
        rating_id: req.rating_id,
        overall_rating: req.overall_rating,
        difficulty_rating: req.difficulty_rating,
        user_id: req.user_id,
        recipe_id: req.recipe_id,
    })
}

/// Recipes with at least one rating of `min_rating` or better.
pub fn recipes_rated_at_least(pool: &DbPool, min_rating: i64) -> Result<Vec<RecipeDto>, AppError> {
    check_rating("overall_rating", min_rating)?;
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT DISTINCT r.id, r.name, r.author
         FROM recipes r
         JOIN ratings ra ON ra.recipe_id = r.id
         WHERE ra.overall_rating >= ?1
         ORDER BY r.id",
    )?;
    let rows = stmt.query_map([min_rating], map_recipe)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
