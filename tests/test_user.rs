//! User, allergy and profile integration tests

use meal_planner::app::{
    allergy_create, allergy_list, meal_plan_create, table_count, user_add_allergy,
    user_allergies, user_create, user_get, user_list, user_update, users_allergic_to_all,
    users_with_meal_plans_over, MealPlanCreateReq, UserAllergyAddReq, UserCreateReq,
    UserUpdateReq,
};
use meal_planner::infra::db::init_test_db;
use meal_planner::infra::{DbPool, Table};

// ──────────────────────── Helper ────────────────────────

fn make_user(pool: &DbPool, user_id: i64, name: &str) {
    user_create(
        pool,
        UserCreateReq {
            user_id,
            full_name: name.to_string(),
            country: Some("Canada".to_string()),
            cuisine: Some("Italian".to_string()),
            diet: Some("vegan".to_string()),
            grocery_store: Some("Safeway".to_string()),
        },
    )
    .unwrap();
}

fn add_allergy(pool: &DbPool, user_id: i64, allergy: &str) {
    user_add_allergy(
        pool,
        UserAllergyAddReq {
            user_id,
            allergy_type: allergy.to_string(),
            severity: Some("high".to_string()),
        },
    )
    .unwrap();
}

fn make_plans(pool: &DbPool, user_id: i64, ids: &[i64]) {
    for &meal_plan_id in ids {
        meal_plan_create(
            pool,
            MealPlanCreateReq {
                meal_plan_id,
                start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: None,
                grocery_list_id: None,
                created_by: Some(user_id),
            },
        )
        .unwrap();
    }
}

// ══════════════════════════════════════════════════════════
//  user_create / user_get
// ══════════════════════════════════════════════════════════

#[test]
fn create_then_get_returns_same_row() {
    let pool = init_test_db();
    make_user(&pool, 1, "Alice");
    let fetched = user_get(&pool, 1).unwrap();
    assert_eq!(fetched.user_id, 1);
    assert_eq!(fetched.full_name, "Alice");
    assert_eq!(fetched.country, "Canada");
    assert_eq!(fetched.grocery_store, "Safeway");
}

#[test]
fn create_user_trims_and_requires_name() {
    let pool = init_test_db();
    let err = user_create(
        &pool,
        UserCreateReq {
            user_id: 1,
            full_name: "   ".to_string(),
            country: None,
            cuisine: None,
            diet: None,
            grocery_store: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert_eq!(table_count(&pool, Table::Users).unwrap(), 0);
}

#[test]
fn create_user_defaults_optional_fields() {
    let pool = init_test_db();
    let dto = user_create(
        &pool,
        UserCreateReq {
            user_id: 9,
            full_name: "  Bob ".to_string(),
            country: None,
            cuisine: None,
            diet: None,
            grocery_store: None,
        },
    )
    .unwrap();
    assert_eq!(dto.full_name, "Bob");
    assert_eq!(dto.country, "");
    assert_eq!(user_get(&pool, 9).unwrap(), dto);
}

#[test]
fn duplicate_user_id_fails_and_count_unchanged() {
    let pool = init_test_db();
    make_user(&pool, 1, "Alice");
    let err = user_create(
        &pool,
        UserCreateReq {
            user_id: 1,
            full_name: "Impostor".to_string(),
            country: None,
            cuisine: None,
            diet: None,
            grocery_store: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
    assert_eq!(table_count(&pool, Table::Users).unwrap(), 1);
    assert_eq!(user_get(&pool, 1).unwrap().full_name, "Alice");
}

#[test]
fn get_unknown_user_is_not_found() {
    let pool = init_test_db();
    assert_eq!(user_get(&pool, 404).unwrap_err().code(), "NOT_FOUND");
}

#[test]
fn list_users_ordered_by_id() {
    let pool = init_test_db();
    make_user(&pool, 3, "C");
    make_user(&pool, 1, "A");
    make_user(&pool, 2, "B");
    let ids: Vec<i64> = user_list(&pool).unwrap().iter().map(|u| u.user_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

// ══════════════════════════════════════════════════════════
//  user_update
// ══════════════════════════════════════════════════════════

#[test]
fn update_only_full_name_keeps_other_fields() {
    let pool = init_test_db();
    make_user(&pool, 1, "Alice");
    let updated = user_update(
        &pool,
        UserUpdateReq {
            user_id: 1,
            full_name: Some("Alice Smith".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.full_name, "Alice Smith");
    assert_eq!(updated.country, "Canada");
    assert_eq!(updated.cuisine, "Italian");
    assert_eq!(updated.diet, "vegan");
    assert_eq!(updated.grocery_store, "Safeway");
    assert_eq!(user_get(&pool, 1).unwrap(), updated);
}

#[test]
fn update_blank_values_keep_existing() {
    let pool = init_test_db();
    make_user(&pool, 1, "Alice");
    let updated = user_update(
        &pool,
        UserUpdateReq {
            user_id: 1,
            full_name: Some("  ".to_string()),
            country: Some("".to_string()),
            diet: Some("keto".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.full_name, "Alice");
    assert_eq!(updated.country, "Canada");
    assert_eq!(updated.diet, "keto");
}

#[test]
fn update_unknown_user_fails_without_mutation() {
    let pool = init_test_db();
    make_user(&pool, 1, "Alice");
    let before = user_list(&pool).unwrap();
    let err = user_update(
        &pool,
        UserUpdateReq {
            user_id: 2,
            full_name: Some("Ghost".to_string()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(user_list(&pool).unwrap(), before);
}

#[test]
fn update_works_on_single_connection_pool() {
    let pool = meal_planner::infra::db::init_test_db_with(meal_planner::infra::PoolOptions {
        min: 1,
        max: 1,
        acquire_timeout: std::time::Duration::from_secs(1),
    });
    make_user(&pool, 1, "Alice");
    let updated = user_update(
        &pool,
        UserUpdateReq {
            user_id: 1,
            cuisine: Some("Thai".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.cuisine, "Thai");
}

// ══════════════════════════════════════════════════════════
//  allergies
// ══════════════════════════════════════════════════════════

#[test]
fn allergy_requires_existing_user_and_type() {
    let pool = init_test_db();
    allergy_create(&pool, "peanut").unwrap();
    make_user(&pool, 1, "Alice");

    let unknown_type = user_add_allergy(
        &pool,
        UserAllergyAddReq {
            user_id: 1,
            allergy_type: "shellfish".to_string(),
            severity: None,
        },
    )
    .unwrap_err();
    assert_eq!(unknown_type.code(), "CONSTRAINT_VIOLATION");

    let unknown_user = user_add_allergy(
        &pool,
        UserAllergyAddReq {
            user_id: 2,
            allergy_type: "peanut".to_string(),
            severity: None,
        },
    )
    .unwrap_err();
    assert_eq!(unknown_user.code(), "CONSTRAINT_VIOLATION");
    assert_eq!(table_count(&pool, Table::UserHasAllergy).unwrap(), 0);
}

#[test]
fn duplicate_allergy_type_rejected() {
    let pool = init_test_db();
    allergy_create(&pool, "gluten").unwrap();
    assert_eq!(
        allergy_create(&pool, "gluten").unwrap_err().code(),
        "CONSTRAINT_VIOLATION"
    );
    assert_eq!(allergy_list(&pool).unwrap(), vec!["gluten".to_string()]);
}

#[test]
fn user_allergies_lists_severity() {
    let pool = init_test_db();
    allergy_create(&pool, "dairy").unwrap();
    allergy_create(&pool, "peanut").unwrap();
    make_user(&pool, 1, "Alice");
    add_allergy(&pool, 1, "peanut");
    add_allergy(&pool, 1, "dairy");
    let list = user_allergies(&pool, 1).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].allergy_type, "dairy");
    assert_eq!(list[1].severity, "high");
}

// ══════════════════════════════════════════════════════════
//  users_allergic_to_all (division)
// ══════════════════════════════════════════════════════════

#[test]
fn user_covering_every_allergy_is_returned() {
    let pool = init_test_db();
    for a in ["dairy", "gluten", "peanut"] {
        allergy_create(&pool, a).unwrap();
    }
    make_user(&pool, 1, "Everything");
    make_user(&pool, 2, "AlmostEverything");
    make_user(&pool, 3, "Nothing");
    for a in ["dairy", "gluten", "peanut"] {
        add_allergy(&pool, 1, a);
    }
    add_allergy(&pool, 2, "dairy");
    add_allergy(&pool, 2, "gluten");

    assert_eq!(
        users_allergic_to_all(&pool).unwrap(),
        vec!["Everything".to_string()]
    );
}

#[test]
fn new_allergy_type_removes_user_from_division() {
    let pool = init_test_db();
    allergy_create(&pool, "dairy").unwrap();
    make_user(&pool, 1, "Alice");
    add_allergy(&pool, 1, "dairy");
    assert_eq!(users_allergic_to_all(&pool).unwrap().len(), 1);

    allergy_create(&pool, "soy").unwrap();
    assert!(users_allergic_to_all(&pool).unwrap().is_empty());
}

#[test]
fn no_allergy_types_means_every_user_qualifies() {
    let pool = init_test_db();
    make_user(&pool, 1, "A");
    make_user(&pool, 2, "B");
    assert_eq!(users_allergic_to_all(&pool).unwrap().len(), 2);
}

// ══════════════════════════════════════════════════════════
//  users_with_meal_plans_over (HAVING)
// ══════════════════════════════════════════════════════════

#[test]
fn having_filter_returns_only_users_above_count() {
    let pool = init_test_db();
    make_user(&pool, 1, "u1");
    make_user(&pool, 2, "u2");
    make_plans(&pool, 1, &[10, 11, 12]);
    make_plans(&pool, 2, &[20]);

    let result = users_with_meal_plans_over(&pool, 1).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].user_id, 1);
    assert_eq!(result[0].meal_plan_count, 3);

    assert_eq!(users_with_meal_plans_over(&pool, 0).unwrap().len(), 2);
    assert!(users_with_meal_plans_over(&pool, 3).unwrap().is_empty());
}

#[test]
fn having_filter_rejects_negative_count() {
    let pool = init_test_db();
    assert_eq!(
        users_with_meal_plans_over(&pool, -1).unwrap_err().code(),
        "VALIDATION_ERROR"
    );
}
