//! Ingredient use cases: catalog, nutrition facts and column projection.

use crate::domain::Nutrient;
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFactsReq {
    pub calories: i64,
    pub fat: i64,
    pub protein: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCreateReq {
    pub name: String,
    pub food_group: Option<String>,
    pub nutrition: Option<NutritionFactsReq>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientDto {
    pub name: String,
    pub food_group: String,
    pub calories: Option<i64>,
    pub fat: Option<i64>,
    pub protein: Option<i64>,
}

/// Tabular result of a projection: `columns[i]` names `rows[_][i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionDto {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Create an ingredient and, when given, its nutrition facts in one transaction.
pub fn ingredient_create(pool: &DbPool, req: IngredientCreateReq) -> Result<IngredientDto, AppError> {
    let conn = get_connection(pool)?;
    let tx = conn.unchecked_transaction()?;
    let dto = insert_ingredient(&tx, req)?;
    tx.commit()?;
    Ok(dto)
}

/// Both inserts of an ingredient; the caller owns the transaction.
pub(crate) fn insert_ingredient(
    conn: &Connection,
    req: IngredientCreateReq,
) -> Result<IngredientDto, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if let Some(n) = req.nutrition {
        if n.calories < 0 || n.fat < 0 || n.protein < 0 {
            return Err(AppError::Validation("nutrition facts must not be negative".into()));
        }
    }
    let food_group = req.food_group.unwrap_or_default();

    conn.execute(
        "INSERT INTO ingredients (name, food_group) VALUES (?1, ?2)",
        params![name, &food_group],
    )?;
    if let Some(n) = req.nutrition {
        conn.execute(
            "INSERT INTO ingredient_nutritional_info (name, calories, fat, protein) VALUES (?1, ?2, ?3, ?4)",
            params![name, n.calories, n.fat, n.protein],
        )?;
    }
    log::info!("Created ingredient {}", name);

    Ok(IngredientDto {
        name: name.to_string(),
        food_group,
        calories: req.nutrition.map(|n| n.calories),
        fat: req.nutrition.map(|n| n.fat),
        protein: req.nutrition.map(|n| n.protein),
    })
}

pub fn ingredient_list(pool: &DbPool) -> Result<Vec<IngredientDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT i.name, i.food_group, ini.calories, ini.fat, ini.protein
         FROM ingredients i
         LEFT JOIN ingredient_nutritional_info ini ON ini.name = i.name
         ORDER BY i.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(IngredientDto {
            name: r.get(0)?,
            food_group: r.get(1)?,
            calories: r.get(2)?,
            fat: r.get(3)?,
            protein: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Delete an ingredient; recipe, grocery-list and nutrition rows cascade.
/// Returns rows affected (0 when the ingredient does not exist).
pub fn ingredient_delete(pool: &DbPool, name: &str) -> Result<usize, AppError> {
    let conn = get_connection(pool)?;
    let affected = conn.execute("DELETE FROM ingredients WHERE name = ?1", [name.trim()])?;
    log::info!("Deleted ingredient {} ({} row(s))", name.trim(), affected);
    Ok(affected)
}

/// Ingredient names plus the selected nutrition columns.
///
/// Column identifiers only ever come from [`Nutrient::as_str`]; nothing the
/// caller supplies is spliced into the statement.
pub fn nutrition_projection(pool: &DbPool, fields: &[Nutrient]) -> Result<ProjectionDto, AppError> {
    let fields = Nutrient::normalize(fields);
    let mut columns = vec!["name"];
    columns.extend(fields.iter().map(Nutrient::as_str));
    let sql = format!(
        "SELECT {} FROM ingredient_nutritional_info ORDER BY name",
        columns.join(", ")
    );

    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |r| {
        let mut row = Vec::with_capacity(columns.len());
        row.push(Value::from(r.get::<_, String>(0)?));
        for i in 1..columns.len() {
            row.push(Value::from(r.get::<_, i64>(i)?));
        }
        Ok(row)
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }

    Ok(ProjectionDto {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: out,
    })
}
