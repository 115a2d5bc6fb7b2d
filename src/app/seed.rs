//! Demo data for a freshly reset store.

use crate::app::admin::{table_counts, TableCountDto};
use crate::app::ingredient::{insert_ingredient, IngredientCreateReq, NutritionFactsReq};
use crate::app::meal_plan::{
    insert_grocery_list, insert_grocery_list_item, insert_meal_plan, insert_meal_plan_recipe,
    GroceryListCreateReq, MealPlanCreateReq,
};
use crate::app::recipe::{
    insert_rating, insert_recipe, insert_recipe_ingredient, RatingCreateReq, RecipeCreateReq,
    RecipeIngredientAddReq,
};
use crate::app::user::{
    insert_allergy, insert_user, insert_user_allergy, UserAllergyAddReq, UserCreateReq,
};
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use chrono::NaiveDate;
use rusqlite::Connection;

const ALLERGIES: &[&str] = &["dairy", "gluten", "peanut"];

// (user_id, full_name, country, cuisine, diet, grocery_store, allergies)
const USERS: &[(i64, &str, &str, &str, &str, &str, &[&str])] = &[
    (1, "Ada Lovelace", "UK", "British", "omnivore", "Tesco", &["dairy", "gluten", "peanut"]),
    (2, "Ben Okafor", "Nigeria", "West African", "vegetarian", "Shoprite", &["peanut"]),
    (3, "Chen Wei", "Canada", "Cantonese", "pescatarian", "T&T", &[]),
];

// (name, food_group, calories, fat, protein)
const INGREDIENTS: &[(&str, &str, i64, i64, i64)] = &[
    ("egg", "protein", 70, 5, 6),
    ("flour", "grain", 110, 0, 3),
    ("milk", "dairy", 100, 2, 8),
    ("rice", "grain", 200, 0, 4),
    ("salmon", "protein", 250, 12, 25),
    ("spinach", "vegetable", 7, 0, 1),
];

// (id, name, author, [(ingredient, quantity)])
const RECIPES: &[(i64, &str, &str, &[(&str, i64)])] = &[
    (1, "Pancakes", "Ada Lovelace", &[("egg", 2), ("flour", 1), ("milk", 1)]),
    (2, "Salmon Rice Bowl", "Chen Wei", &[("salmon", 1), ("rice", 2), ("spinach", 3)]),
    (3, "Plain Rice", "Ben Okafor", &[("rice", 1)]),
    (4, "Mystery Stew", "Ben Okafor", &[]),
];

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| AppError::Validation(format!("invalid date {y}-{m}-{d}")))
}

/// Insert a small, internally consistent data set and return the resulting row counts.
/// All or nothing: any failed insert leaves the store as it was.
pub fn seed_demo_data(pool: &DbPool) -> Result<Vec<TableCountDto>, AppError> {
    {
        let conn = get_connection(pool)?;
        let tx = conn.unchecked_transaction()?;
        insert_demo_rows(&tx)?;
        tx.commit()?;
    }
    log::info!("Seeded demo data");
    table_counts(pool)
}

fn insert_demo_rows(conn: &Connection) -> Result<(), AppError> {
    for allergy in ALLERGIES {
        insert_allergy(conn, allergy)?;
    }

    for &(user_id, full_name, country, cuisine, diet, store, allergies) in USERS {
        insert_user(
            conn,
            UserCreateReq {
                user_id,
                full_name: full_name.to_string(),
                country: Some(country.to_string()),
                cuisine: Some(cuisine.to_string()),
                diet: Some(diet.to_string()),
                grocery_store: Some(store.to_string()),
            },
        )?;
        for allergy in allergies {
            insert_user_allergy(
                conn,
                UserAllergyAddReq {
                    user_id,
                    allergy_type: allergy.to_string(),
                    severity: Some("moderate".to_string()),
                },
            )?;
        }
    }

    for &(name, food_group, calories, fat, protein) in INGREDIENTS {
        insert_ingredient(
            conn,
            IngredientCreateReq {
                name: name.to_string(),
                food_group: Some(food_group.to_string()),
                nutrition: Some(NutritionFactsReq {
                    calories,
                    fat,
                    protein,
                }),
            },
        )?;
    }

    for &(id, name, author, ingredients) in RECIPES {
        insert_recipe(
            conn,
            RecipeCreateReq {
                id,
                name: name.to_string(),
                author: Some(author.to_string()),
            },
        )?;
        for &(ingredient_name, quantity) in ingredients {
            insert_recipe_ingredient(
                conn,
                RecipeIngredientAddReq {
                    recipe_id: id,
                    ingredient_name: ingredient_name.to_string(),
                    quantity,
                },
            )?;
        }
    }

    insert_grocery_list(
        conn,
        GroceryListCreateReq {
            grocery_list_id: 1,
            total_price: Some(42),
        },
    )?;
    for ingredient in ["egg", "flour", "milk"] {
        insert_grocery_list_item(conn, 1, ingredient)?;
    }

    let plans = [
        (1, date(2024, 3, 4)?, Some(date(2024, 3, 10)?), Some(1), 1, &[1, 2][..]),
        (2, date(2024, 3, 11)?, Some(date(2024, 3, 17)?), None, 1, &[3][..]),
        (3, date(2024, 3, 18)?, None, None, 2, &[2, 3][..]),
    ];
    for (meal_plan_id, start_date, end_date, grocery_list_id, creator, recipes) in plans {
        insert_meal_plan(
            conn,
            MealPlanCreateReq {
                meal_plan_id,
                start_date,
                end_date,
                grocery_list_id,
                created_by: Some(creator),
            },
        )?;
        for &recipe_id in recipes {
            insert_meal_plan_recipe(conn, meal_plan_id, recipe_id)?;
        }
    }

    for (rating_id, overall_rating, difficulty_rating, user_id, recipe_id) in
        [(1, 5, 2, 1, 1), (2, 3, 3, 2, 2), (3, 4, 1, 3, 2), (4, 2, 1, 2, 3)]
    {
        insert_rating(
            conn,
            RatingCreateReq {
                rating_id,
                overall_rating,
                difficulty_rating,
                user_id,
                recipe_id,
            },
        )?;
    }

    Ok(())
}
