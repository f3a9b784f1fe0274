use sqlx::{Executor, Row, Sqlite, SqlitePool};

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub user_id: String,
    pub expires_at: i64,
}

pub async fn insert_session<'e, E>(
    executor: E,
    user_id: &str,
    token_hash: &str,
    expires_at_ms: i64,
    now_ms: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO "sessions" ("id", "userId", "token", "expiresAt", "createdAt")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at_ms)
    .bind(now_ms)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_session(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<SessionRow>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT "userId", "expiresAt" FROM "sessions" WHERE "token" = ?"#)
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

    row.map(|row| {
        Ok(SessionRow {
            user_id: row.try_get("userId")?,
            expires_at: row.try_get("expiresAt")?,
        })
    })
    .transpose()
}

pub async fn delete_session_by_token_hash(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM "sessions" WHERE "token" = ?"#)
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_expired_sessions(pool: &SqlitePool, now_ms: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "sessions" WHERE "expiresAt" < ?"#)
        .bind(now_ms)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
