use sqlx::SqlitePool;

const MIGRATIONS: &[(&str, &str)] = &[
    ("001_init_schema", include_str!("../../sql/001_init_schema.sql")),
    (
        "002_syllabus_and_tests",
        include_str!("../../sql/002_syllabus_and_tests.sql"),
    ),
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrationError> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "_migrations" (
            "id" INTEGER PRIMARY KEY AUTOINCREMENT,
            "name" TEXT NOT NULL UNIQUE,
            "applied_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(MigrationError::Sqlx)?;

    let applied: Vec<String> =
        sqlx::query_scalar(r#"SELECT "name" FROM "_migrations" ORDER BY "id""#)
            .fetch_all(pool)
            .await
            .map_err(MigrationError::Sqlx)?;

    let mut applied_count = 0;

    for (name, sql) in MIGRATIONS {
        if applied.iter().any(|done| done == name) {
            tracing::debug!(migration = name, "Already applied, skipping");
            continue;
        }

        tracing::info!(migration = name, "Applying migration...");

        let mut tx = pool.begin().await.map_err(MigrationError::Sqlx)?;
        for stmt in split_sql_statements(sql) {
            let body = strip_comment_lines(&stmt);
            if body.is_empty() {
                continue;
            }
            sqlx::query(&body)
                .execute(&mut *tx)
                .await
                .map_err(|e| MigrationError::Migration {
                    name: name.to_string(),
                    source: e,
                })?;
        }

        sqlx::query(r#"INSERT INTO "_migrations" ("name") VALUES (?)"#)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(MigrationError::Sqlx)?;
        tx.commit().await.map_err(MigrationError::Sqlx)?;

        applied_count += 1;
        tracing::info!(migration = name, "Migration applied successfully");
    }

    if applied_count > 0 {
        tracing::info!(count = applied_count, "Database migrations completed");
    } else {
        tracing::info!("Database is up to date, no migrations needed");
    }

    Ok(())
}

pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

fn strip_comment_lines(stmt: &str) -> String {
    stmt.lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Migration '{name}' failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
