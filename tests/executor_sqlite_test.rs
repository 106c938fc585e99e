use rowcast::{
    BindingRegistry, DbError, DbPool, MappingMode, PoolConfig, QueryExecutor, SqlParam, SqlValue,
};
use std::sync::Arc;
use tempfile::NamedTempFile;

async fn executor_for(temp_file: &NamedTempFile) -> QueryExecutor {
    let db_path = temp_file.path().to_str().unwrap().to_string();
    let conn_url = format!("sqlite:{}?mode=rwc", db_path);
    let pool = DbPool::connect(&conn_url, &PoolConfig::default())
        .await
        .unwrap();
    QueryExecutor::new(pool, Arc::new(BindingRegistry::new()))
}

async fn create_users(executor: &QueryExecutor) {
    executor
        .execute_update(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, user_name TEXT, active BOOLEAN, score REAL)",
            &[],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_check_connection() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    executor.check_connection().await.unwrap();
}

#[tokio::test]
async fn test_insert_update_delete_counts() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    create_users(&executor).await;

    let inserted = executor
        .execute_update(
            "INSERT INTO users (id, user_name, active, score) VALUES (?, ?, ?, ?)",
            &[
                SqlParam::Int(1),
                SqlParam::from("ada"),
                SqlParam::Bool(true),
                SqlParam::Float(9.5),
            ],
        )
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let updated = executor
        .execute_update(
            "UPDATE users SET score = ? WHERE id = ?",
            &[SqlParam::Float(10.0), SqlParam::Int(1)],
        )
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let deleted = executor
        .execute_update("DELETE FROM users WHERE id = ?", &[SqlParam::Int(99)])
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn test_empty_string_parameter_binds_null() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    create_users(&executor).await;

    executor
        .execute_update(
            "INSERT INTO users (id, user_name) VALUES (?, ?)",
            &[SqlParam::Int(1), SqlParam::Text(String::new())],
        )
        .await
        .unwrap();
    executor
        .execute_update(
            "INSERT INTO users (id, user_name) VALUES (?, ?)",
            &[SqlParam::Int(2), SqlParam::Null],
        )
        .await
        .unwrap();

    // Both parameters land as SQL NULL.
    let record = executor
        .query_to_record(
            "SELECT COUNT(*) AS n FROM users WHERE user_name IS NULL",
            &[],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.get("n"), Some(&SqlValue::Int(2)));
}

#[tokio::test]
async fn test_query_streams_rows_in_cursor_order() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    create_users(&executor).await;

    for (id, name) in [(1, "ada"), (2, "grace"), (3, "edsger")] {
        executor
            .execute_update(
                "INSERT INTO users (id, user_name) VALUES (?, ?)",
                &[SqlParam::Int(id), SqlParam::from(name)],
            )
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    executor
        .query(
            "SELECT id, user_name FROM users ORDER BY id",
            &[],
            |row| {
                seen.push(row.value_by_label("id")?.clone());
                Ok(())
            },
        )
        .await
        .unwrap();
    assert_eq!(
        seen,
        vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
    );
}

#[tokio::test]
async fn test_callback_error_aborts_scan() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    create_users(&executor).await;

    for id in 1..=5 {
        executor
            .execute_update("INSERT INTO users (id) VALUES (?)", &[SqlParam::Int(id)])
            .await
            .unwrap();
    }

    let mut visited = 0;
    let result = executor
        .query("SELECT id FROM users ORDER BY id", &[], |_row| {
            visited += 1;
            if visited == 2 {
                return Err(DbError::mapping("stop"));
            }
            Ok(())
        })
        .await;
    assert!(matches!(result, Err(DbError::Mapping { .. })));
    assert_eq!(visited, 2);
}

#[tokio::test]
async fn test_query_to_records_preserves_column_order() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    create_users(&executor).await;

    executor
        .execute_update(
            "INSERT INTO users (id, user_name, active) VALUES (?, ?, ?)",
            &[SqlParam::Int(1), SqlParam::from("ada"), SqlParam::Bool(true)],
        )
        .await
        .unwrap();

    let records = executor
        .query_to_records("SELECT user_name, id, active FROM users", &[])
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    let keys: Vec<&str> = records[0].keys().collect();
    assert_eq!(keys, vec!["user_name", "id", "active"]);
    assert_eq!(records[0].get("id"), Some(&SqlValue::Int(1)));
    assert_eq!(
        records[0].get("user_name"),
        Some(&SqlValue::Text("ada".to_string()))
    );
}

#[tokio::test]
async fn test_query_to_record_takes_first_row_only() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    create_users(&executor).await;

    for id in [3, 1, 2] {
        executor
            .execute_update("INSERT INTO users (id) VALUES (?)", &[SqlParam::Int(id)])
            .await
            .unwrap();
    }

    let record = executor
        .query_to_record("SELECT id FROM users ORDER BY id", &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.get("id"), Some(&SqlValue::Int(1)));

    let missing = executor
        .query_to_record("SELECT id FROM users WHERE id = ?", &[SqlParam::Int(42)])
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_camel_case_record_keys() {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap().to_string();
    let conn_url = format!("sqlite:{}?mode=rwc", db_path);
    let pool = DbPool::connect(&conn_url, &PoolConfig::default())
        .await
        .unwrap();
    let executor = QueryExecutor::with_mapping_mode(
        pool,
        Arc::new(BindingRegistry::new()),
        MappingMode::CamelCase,
    );
    assert!(executor.camel_case());
    create_users(&executor).await;

    executor
        .execute_update(
            "INSERT INTO users (id, user_name) VALUES (?, ?)",
            &[SqlParam::Int(1), SqlParam::from("ada")],
        )
        .await
        .unwrap();

    let record = executor
        .query_to_record("SELECT id, user_name FROM users", &[])
        .await
        .unwrap()
        .unwrap();
    assert!(record.contains_key("userName"));
    assert!(!record.contains_key("user_name"));
}

#[tokio::test]
async fn test_execution_error_surfaces() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;

    let result = executor
        .query_to_records("SELECT * FROM no_such_table", &[])
        .await;
    assert!(matches!(result, Err(DbError::Execution { .. })));
}

#[tokio::test]
async fn test_shared_connection_sequence() {
    let temp_file = NamedTempFile::new().unwrap();
    let executor = executor_for(&temp_file).await;
    create_users(&executor).await;

    let mut conn = executor.acquire().await.unwrap();
    executor
        .execute_update_on(
            &mut conn,
            "INSERT INTO users (id, user_name) VALUES (?, ?)",
            &[SqlParam::Int(1), SqlParam::from("ada")],
        )
        .await
        .unwrap();
    let record = executor
        .query_to_record_on(&mut conn, "SELECT user_name FROM users WHERE id = ?", &[
            SqlParam::Int(1),
        ])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        record.get("user_name"),
        Some(&SqlValue::Text("ada".to_string()))
    );
}
