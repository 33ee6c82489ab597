//! Round-trip tests over an in-memory sqlite database.

use qharvest_core::{AnswerStore, NewAnswer, NewProblem, ProblemStore};
use qharvest_db::{run_migrations, SqliteAnswerStore, SqliteProblemStore};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// An in-memory database pinned to a single connection — each sqlite
/// `:memory:` connection is otherwise its own database.
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool should connect");
    run_migrations(&pool).await.expect("migrations should apply");
    pool
}

fn sample_problem(title: &str) -> NewProblem {
    NewProblem {
        title: title.to_string(),
        content: "问题内容".to_string(),
        category: "finance".to_string(),
        tags: vec!["股票".to_string(), "入门".to_string()],
        related_book_ids: vec![3, 5],
    }
}

#[tokio::test]
async fn problem_round_trip_preserves_json_columns() {
    let pool = test_pool().await;
    let store = SqliteProblemStore::new(pool);

    let id = store
        .insert(sample_problem("股票怎么入门？"))
        .await
        .expect("insert should succeed");
    assert!(id > 0);

    let all = store.list_all().await.expect("list should succeed");
    assert_eq!(all.len(), 1);
    let record = &all[0];
    assert_eq!(record.id, id);
    assert_eq!(record.title, "股票怎么入门？");
    assert_eq!(record.category, "finance");
    assert_eq!(record.tags, vec!["股票".to_string(), "入门".to_string()]);
    assert_eq!(record.related_book_ids, vec![3, 5]);
}

#[tokio::test]
async fn list_returns_newest_first() {
    let pool = test_pool().await;
    let store = SqliteProblemStore::new(pool);

    store.insert(sample_problem("第一个？")).await.unwrap();
    store.insert(sample_problem("第二个？")).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all[0].title, "第二个？");
    assert_eq!(all[1].title, "第一个？");
}

#[tokio::test]
async fn answers_attach_to_their_problem_and_sort_by_quality() {
    let pool = test_pool().await;
    let problems = SqliteProblemStore::new(pool.clone());
    let answers = SqliteAnswerStore::new(pool);

    let problem_id = problems.insert(sample_problem("股票怎么入门？")).await.unwrap();

    for (content, upvotes, score) in [("一般回答", 20_u32, 0.4_f64), ("好回答", 80, 0.9)] {
        answers
            .insert(NewAnswer {
                problem_id,
                content: content.to_string(),
                author: Some("答主".to_string()),
                upvotes,
                downvotes: 1,
                quality_score: score,
                source_url: Some("https://example.com/a/1".to_string()),
            })
            .await
            .expect("insert should succeed");
    }

    let rows = answers
        .list_for_problem(problem_id)
        .await
        .expect("list should succeed");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].content, "好回答");
    assert!(rows[0].quality_score > rows[1].quality_score);
    assert_eq!(rows[0].problem_id, problem_id);
}
