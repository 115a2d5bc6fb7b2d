//! Connection pool integration tests: bounds, waiting, release and shutdown

use meal_planner::app::{recipe_create, table_count, RecipeCreateReq};
use meal_planner::infra::db::{init_test_db, init_test_db_with};
use meal_planner::infra::{PoolOptions, Table};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

fn options(min: u32, max: u32, timeout_ms: u64) -> PoolOptions {
    PoolOptions {
        min,
        max,
        acquire_timeout: Duration::from_millis(timeout_ms),
    }
}

// ══════════════════════════════════════════════════════════
//  PoolOptions
// ══════════════════════════════════════════════════════════

#[test]
fn default_options_match_documented_sizes() {
    let o = PoolOptions::default();
    assert_eq!((o.min, o.max), (1, 3));
    assert_eq!(o.acquire_timeout, Duration::from_secs(60));
    assert!(o.validate().is_ok());
}

#[test]
fn invalid_options_rejected() {
    assert_eq!(options(0, 0, 10).validate().unwrap_err().code(), "CONFIG_ERROR");
    assert_eq!(options(4, 2, 10).validate().unwrap_err().code(), "CONFIG_ERROR");
    assert_eq!(options(1, 2, 0).validate().unwrap_err().code(), "CONFIG_ERROR");
    assert!(options(0, 1, 10).validate().is_ok());
}

// ══════════════════════════════════════════════════════════
//  sizing
// ══════════════════════════════════════════════════════════

#[test]
fn warms_min_connections_at_init() {
    let pool = init_test_db_with(options(2, 4, 100));
    let status = pool.status();
    assert!(status.open >= 2);
    assert!(status.open <= 4);
    assert_eq!(status.in_use, 0);
    assert!(!status.closed);
}

#[test]
fn grows_up_to_max_then_times_out() {
    let pool = init_test_db_with(options(1, 2, 100));
    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    assert_eq!(pool.status().in_use, 2);

    let started = Instant::now();
    let err = pool.acquire().err().unwrap();
    assert_eq!(err.code(), "POOL_ERROR");
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(pool.status().open, 2);

    drop(a);
    drop(b);
    assert_eq!(pool.status().idle, 2);
}

#[test]
fn waiting_caller_gets_released_connection() {
    let pool = init_test_db_with(options(1, 1, 2_000));
    let held = pool.acquire().unwrap();

    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || {
            let conn = pool.acquire().unwrap();
            conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0)).unwrap()
        })
    };
    thread::sleep(Duration::from_millis(50));
    drop(held);
    assert_eq!(waiter.join().unwrap(), 1);
    assert_eq!(pool.status().open, 1);
}

#[test]
fn concurrent_callers_never_exceed_max() {
    let pool = init_test_db_with(options(1, 3, 5_000));
    let in_use = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let in_use = Arc::clone(&in_use);
            let peak = Arc::clone(&peak);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let conn = pool.acquire().unwrap();
                let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0)).unwrap();
                thread::sleep(Duration::from_millis(20));
                in_use.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(pool.status().open <= 3);
    assert_eq!(pool.status().in_use, 0);
}

// ══════════════════════════════════════════════════════════
//  release
// ══════════════════════════════════════════════════════════

#[test]
fn connection_returned_after_failed_operation() {
    let pool = init_test_db_with(options(1, 1, 200));
    let req = || RecipeCreateReq {
        id: 1,
        name: "Soup".to_string(),
        author: None,
    };
    recipe_create(&pool, req()).unwrap();
    for _ in 0..5 {
        assert_eq!(
            recipe_create(&pool, req()).unwrap_err().code(),
            "CONSTRAINT_VIOLATION"
        );
    }
    assert_eq!(pool.status().idle, 1);
    assert_eq!(table_count(&pool, Table::Recipes).unwrap(), 1);
}

// ══════════════════════════════════════════════════════════
//  close
// ══════════════════════════════════════════════════════════

#[test]
fn close_idle_pool_reports_nothing_outstanding() {
    let pool = init_test_db();
    assert_eq!(pool.close(Duration::from_millis(50)), 0);
    let status = pool.status();
    assert!(status.closed);
    assert_eq!(status.in_use, 0);
}

#[test]
fn acquire_after_close_fails() {
    let pool = init_test_db();
    pool.close(Duration::ZERO);
    assert_eq!(pool.acquire().err().unwrap().code(), "POOL_ERROR");
}

#[test]
fn close_reports_connection_held_past_grace() {
    let pool = init_test_db_with(options(1, 2, 100));
    let held = pool.acquire().unwrap();
    assert_eq!(pool.close(Duration::from_millis(50)), 1);

    drop(held);
    assert_eq!(pool.status().in_use, 0);
    assert!(pool.acquire().is_err());
}

#[test]
fn close_waits_for_connection_returned_within_grace() {
    let pool = init_test_db_with(options(1, 2, 100));
    let held = pool.acquire().unwrap();
    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        drop(held);
    });
    assert_eq!(pool.close(Duration::from_secs(2)), 0);
    releaser.join().unwrap();
}
