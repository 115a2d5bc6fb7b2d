//! User use cases: profiles, allergies, and the user-centric reports.

use crate::domain::input::non_blank;
use crate::error::AppError;
use crate::infra::get_connection;
use crate::infra::DbPool;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateReq {
    pub user_id: i64,
    pub full_name: String,
    pub country: Option<String>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub grocery_store: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDto {
    pub user_id: i64,
    pub full_name: String,
    pub country: String,
    pub cuisine: String,
    pub diet: String,
    pub grocery_store: String,
}

/// Profile update; `None` or blank fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateReq {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub grocery_store: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAllergyAddReq {
    pub user_id: i64,
    pub allergy_type: String,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAllergyDto {
    pub user_id: i64,
    pub allergy_type: String,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMealPlanCountDto {
    pub user_id: i64,
    pub full_name: String,
    pub meal_plan_count: i64,
}

const USER_COLUMNS: &str = "user_id, full_name, country, cuisine, diet, grocery_store";

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserDto> {
    Ok(UserDto {
        user_id: row.get(0)?,
        full_name: row.get(1)?,
        country: row.get(2)?,
        cuisine: row.get(3)?,
        diet: row.get(4)?,
        grocery_store: row.get(5)?,
    })
}

pub fn user_create(pool: &DbPool, req: UserCreateReq) -> Result<UserDto, AppError> {
    let conn = get_connection(pool)?;
    insert_user(&conn, req)
}

pub(crate) fn insert_user(conn: &Connection, req: UserCreateReq) -> Result<UserDto, AppError> {
    let full_name = req.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("full_name is required".into()));
    }
    let dto = UserDto {
        user_id: req.user_id,
        full_name: full_name.to_string(),
        country: req.country.unwrap_or_default(),
        cuisine: req.cuisine.unwrap_or_default(),
        diet: req.diet.unwrap_or_default(),
        grocery_store: req.grocery_store.unwrap_or_default(),
    };

    conn.execute(
        "INSERT INTO users (user_id, full_name, country, cuisine, diet, grocery_store) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            dto.user_id,
            &dto.full_name,
            &dto.country,
            &dto.cuisine,
            &dto.diet,
            &dto.grocery_store
        ],
    )?;
    log::info!("Created user {}", dto.user_id);
    Ok(dto)
}

pub fn user_get(pool: &DbPool, user_id: i64) -> Result<UserDto, AppError> {
    let conn = get_connection(pool)?;
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
        [user_id],
        map_user,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
}

pub fn user_list(pool: &DbPool) -> Result<Vec<UserDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id"))?;
    let rows = stmt.query_map([], map_user)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn user_update(pool: &DbPool, req: UserUpdateReq) -> Result<UserDto, AppError> {
    {
        let conn = get_connection(pool)?;

        let current = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
                [req.user_id],
                map_user,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("user {}", req.user_id)))?;

        let full_name = non_blank(req.full_name).unwrap_or(current.full_name);
        let country = non_blank(req.country).unwrap_or(current.country);
        let cuisine = non_blank(req.cuisine).unwrap_or(current.cuisine);
        let diet = non_blank(req.diet).unwrap_or(current.diet);
        let grocery_store = non_blank(req.grocery_store).unwrap_or(current.grocery_store);

        conn.execute(
            "UPDATE users SET full_name = ?1, country = ?2, cuisine = ?3, diet = ?4, grocery_store = ?5 WHERE user_id = ?6",
            params![&full_name, &country, &cuisine, &diet, &grocery_store, req.user_id],
        )?;
        log::info!("Updated profile of user {}", req.user_id);
    } // conn returned before user_get borrows one

    user_get(pool, req.user_id)
}

pub fn allergy_create(pool: &DbPool, allergy_type: &str) -> Result<String, AppError> {
    let conn = get_connection(pool)?;
    insert_allergy(&conn, allergy_type)
}

pub(crate) fn insert_allergy(conn: &Connection, allergy_type: &str) -> Result<String, AppError> {
    let allergy_type = allergy_type.trim();
    if allergy_type.is_empty() {
        return Err(AppError::Validation("allergy type is required".into()));
    }
    conn.execute("INSERT INTO allergies (type) VALUES (?1)", [allergy_type])?;
    log::info!("Created allergy {}", allergy_type);
    Ok(allergy_type.to_string())
}

pub fn allergy_list(pool: &DbPool) -> Result<Vec<String>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare("SELECT type FROM allergies ORDER BY type")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Record that a user has an allergy. Both the user and the allergy type must exist.
pub fn user_add_allergy(pool: &DbPool, req: UserAllergyAddReq) -> Result<UserAllergyDto, AppError> {
    let conn = get_connection(pool)?;
    insert_user_allergy(&conn, req)
}

pub(crate) fn insert_user_allergy(
    conn: &Connection,
    req: UserAllergyAddReq,
) -> Result<UserAllergyDto, AppError> {
    let allergy_type = req.allergy_type.trim().to_string();
    if allergy_type.is_empty() {
        return Err(AppError::Validation("allergy type is required".into()));
    }
    let severity = req.severity.unwrap_or_default();

    conn.execute(
        "INSERT INTO user_has_allergy (allergy_type, user_id, severity) VALUES (?1, ?2, ?3)",
        params![&allergy_type, req.user_id, &severity],
    )?;
    log::info!("User {} now has allergy {}", req.user_id, allergy_type);
    Ok(UserAllergyDto {
        user_id: req.user_id,
        allergy_type,
        severity,
    })
}

pub fn user_allergies(pool: &DbPool, user_id: i64) -> Result<Vec<UserAllergyDto>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT user_id, allergy_type, severity FROM user_has_allergy WHERE user_id = ?1 ORDER BY allergy_type",
    )?;
    let rows = stmt.query_map([user_id], |r| {
        Ok(UserAllergyDto {
            user_id: r.get(0)?,
            allergy_type: r.get(1)?,
            severity: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Full names of users allergic to every known allergy type.
///
/// Relational division: a user qualifies when the set of all allergy types
/// minus that user's allergy types is empty.
pub fn users_allergic_to_all(pool: &DbPool) -> Result<Vec<String>, AppError> {
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT u.full_name
         FROM users u
         WHERE NOT EXISTS (
             SELECT a.type FROM allergies a
             EXCEPT
             SELECT uha.allergy_type FROM user_has_allergy uha WHERE uha.user_id = u.user_id
         )
         ORDER BY u.user_id",
    )?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    log::debug!("{} user(s) allergic to every allergy type", out.len());
    Ok(out)
}

/// Users who created strictly more than `min_exclusive` meal plans.
pub fn users_with_meal_plans_over(
    pool: &DbPool,
    min_exclusive: i64,
) -> Result<Vec<UserMealPlanCountDto>, AppError> {
    if min_exclusive < 0 {
        return Err(AppError::Validation("meal plan count must not be negative".into()));
    }
    let conn = get_connection(pool)?;
    let mut stmt = conn.prepare(
        "SELECT u.user_id, u.full_name, COUNT(*) AS meal_plan_count
         FROM user_creates_meal_plan ucmp
         JOIN users u ON u.user_id = ucmp.user_id
         GROUP BY u.user_id, u.full_name
         HAVING COUNT(*) > ?1
         ORDER BY u.user_id",
    )?;
    let rows = stmt.query_map([min_exclusive], |r| {
        Ok(UserMealPlanCountDto {
            user_id: r.get(0)?,
            full_name: r.get(1)?,
            meal_plan_count: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
