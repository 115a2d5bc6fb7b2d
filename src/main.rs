use clap::{Parser, Subcommand};
use meal_planner::app;
use meal_planner::config::AppConfig;
use meal_planner::domain::input::{
    parse_count, parse_date, parse_id, parse_quantity, parse_rating, parse_threshold,
};
use meal_planner::domain::Nutrient;
use meal_planner::error::AppError;
use meal_planner::infra::{DbPool, Table};
use serde_json::{json, Value};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "meal-planner",
    about = "Query users, recipes and meal plans",
    long_about = "Runs one query-layer operation against the configured SQLite store and prints the result as JSON"
)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drop and recreate every table
    Init,
    /// Check that the store answers
    Check,
    /// Insert demo data
    Seed,
    /// Row count of one table, or of all tables
    Count { table: Option<String> },
    /// Total calories per recipe
    Calories,
    /// Recipes whose total calories exceed a threshold
    CaloriesOver { threshold: String },
    /// Users allergic to every allergy type
    AllergicToAll,
    /// Meal plans created by a user
    MealPlans { user_id: String },
    /// Ingredients on a meal plan's grocery list
    GroceryList { meal_plan_id: String },
    /// Nutrition totals per recipe within a meal plan
    MealPlanNutrition { meal_plan_id: String },
    /// Nutrition totals of one recipe
    RecipeNutrition { recipe_id: String },
    /// Add an ingredient to a recipe
    AddRecipeIngredient {
        recipe_id: String,
        ingredient: String,
        quantity: String,
    },
    /// Create a meal plan (dates as YYYY-MM-DD)
    CreateMealPlan {
        meal_plan_id: String,
        start_date: String,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        grocery_list_id: Option<String>,
        #[arg(long)]
        created_by: Option<String>,
    },
    /// Ingredient names with the selected nutrition columns
    Nutrients {
        /// Every nutrition column
        #[arg(long)]
        all: bool,
        #[arg(long)]
        calories: bool,
        #[arg(long)]
        fat: bool,
        #[arg(long)]
        protein: bool,
    },
    /// Users with more than N meal plans
    ActiveUsers { more_than: String },
    /// Recipes rated at least this well
    RatedAtLeast { rating: String },
    /// Update a user's profile; omitted fields keep their value
    UpdateUser {
        user_id: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        cuisine: Option<String>,
        #[arg(long)]
        diet: Option<String>,
        #[arg(long)]
        grocery_store: Option<String>,
    },
    /// Delete a meal plan (no-op for unknown ids)
    DeleteMealPlan { meal_plan_id: String },
}

fn execute(pool: &DbPool, command: Command) -> Result<Value, AppError> {
    let data = match command {
        Command::Init => {
            app::schema_reset(pool)?;
            json!(true)
        }
        Command::Check => {
            if app::check_connection(pool) {
                json!("connected")
            } else {
                return Err(AppError::Pool("unable to connect".into()));
            }
        }
        Command::Seed => json!(app::seed_demo_data(pool)?),
        Command::Count { table: Some(name) } => {
            let table = Table::from_str(name.trim())
                .ok_or_else(|| AppError::Validation(format!("unknown table '{}'", name)))?;
            json!({ "table": table, "count": app::table_count(pool, table)? })
        }
        Command::Count { table: None } => json!(app::table_counts(pool)?),
        Command::Calories => json!(app::recipe_total_calories(pool)?),
        Command::CaloriesOver { threshold } => {
            let threshold = parse_threshold("calories", &threshold)?;
            json!(app::recipes_with_calories_over(pool, threshold)?)
        }
        Command::AllergicToAll => json!(app::users_allergic_to_all(pool)?),
        Command::MealPlans { user_id } => {
            let user_id = parse_id("userID", &user_id)?;
            json!(app::meal_plans_created_by(pool, user_id)?)
        }
        Command::GroceryList { meal_plan_id } => {
            let meal_plan_id = parse_id("mealPlanID", &meal_plan_id)?;
            json!(app::meal_plan_grocery_ingredients(pool, meal_plan_id)?)
        }
        Command::MealPlanNutrition { meal_plan_id } => {
            let meal_plan_id = parse_id("mealPlanID", &meal_plan_id)?;
            json!(app::meal_plan_nutrition(pool, meal_plan_id)?)
        }
        Command::RecipeNutrition { recipe_id } => {
            let recipe_id = parse_id("recipeID", &recipe_id)?;
            json!(app::recipe_nutrition(pool, recipe_id)?)
        }
        Command::AddRecipeIngredient {
            recipe_id,
            ingredient,
            quantity,
        } => {
            let req = app::RecipeIngredientAddReq {
                recipe_id: parse_id("recipeID", &recipe_id)?,
                ingredient_name: ingredient,
                quantity: parse_quantity(&quantity)?,
            };
            json!(app::recipe_add_ingredient(pool, req)?)
        }
        Command::CreateMealPlan {
            meal_plan_id,
            start_date,
            end_date,
            grocery_list_id,
            created_by,
        } => {
            let req = app::MealPlanCreateReq {
                meal_plan_id: parse_id("mealPlanID", &meal_plan_id)?,
                start_date: parse_date("startDate", &start_date)?,
                end_date: end_date
                    .map(|d| parse_date("endDate", &d))
                    .transpose()?,
                grocery_list_id: grocery_list_id
                    .map(|id| parse_id("groceryListID", &id))
                    .transpose()?,
                created_by: created_by
                    .map(|id| parse_id("userID", &id))
                    .transpose()?,
            };
            json!(app::meal_plan_create(pool, req)?)
        }
        Command::Nutrients { all: true, .. } => {
            json!(app::nutrition_projection(pool, Nutrient::all())?)
        }
        Command::Nutrients {
            all: false,
            calories,
            fat,
            protein,
        } => {
            let fields: Vec<Nutrient> = [
                (calories, Nutrient::Calories),
                (fat, Nutrient::Fat),
                (protein, Nutrient::Protein),
            ]
            .into_iter()
            .filter_map(|(on, field)| on.then_some(field))
            .collect();
            json!(app::nutrition_projection(pool, &fields)?)
        }
        Command::ActiveUsers { more_than } => {
            let n = parse_count("count", &more_than)?;
            json!(app::users_with_meal_plans_over(pool, n)?)
        }
        Command::RatedAtLeast { rating } => {
            let rating = parse_rating("overallRating", &rating)?;
            json!(app::recipes_rated_at_least(pool, rating)?)
        }
        Command::UpdateUser {
            user_id,
            full_name,
            country,
            cuisine,
            diet,
            grocery_store,
        } => {
            let user_id = parse_id("userID", &user_id)?;
            json!(app::user_update(
                pool,
                app::UserUpdateReq {
                    user_id,
                    full_name,
                    country,
                    cuisine,
                    diet,
                    grocery_store,
                },
            )?)
        }
        Command::DeleteMealPlan { meal_plan_id } => {
            let meal_plan_id = parse_id("mealPlanID", &meal_plan_id)?;
            json!({ "deleted": app::meal_plan_delete(pool, meal_plan_id)? })
        }
    };
    Ok(data)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run the command on a blocking thread; a termination signal cuts it short.
async fn run(pool: DbPool, command: Command, grace: Duration) -> ExitCode {
    let worker = {
        let pool = pool.clone();
        tokio::task::spawn_blocking(move || execute(&pool, command))
    };

    let outcome = tokio::select! {
        joined = worker => Some(joined),
        _ = shutdown_signal() => {
            log::info!("Terminating");
            None
        }
    };

    let outstanding = tokio::task::spawn_blocking(move || pool.close(grace))
        .await
        .unwrap_or(0);

    match outcome {
        Some(Ok(Ok(data))) => {
            println!("{}", json!({ "success": true, "data": data }));
            ExitCode::SUCCESS
        }
        Some(Ok(Err(e))) => {
            log::error!("{}", e);
            println!("{}", json!({ "success": false, "error": e }));
            ExitCode::FAILURE
        }
        Some(Err(e)) => {
            log::error!("operation aborted: {}", e);
            ExitCode::FAILURE
        }
        None if outstanding == 0 => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config;
    let grace = config.close_grace();

    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(config.log_level)
        .init()
    {
        eprintln!("logger init failed: {}", e);
    }

    let pool = match meal_planner::start(&config) {
        Ok(pool) => pool,
        Err(e) => {
            println!("{}", json!({ "success": false, "error": e }));
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to start runtime: {}", e);
            pool.close(grace);
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(run(pool, cli.command, grace));
    // Abandon an operation still running after the grace period.
    runtime.shutdown_timeout(grace);
    code
}
