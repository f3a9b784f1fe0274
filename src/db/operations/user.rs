use serde::{Deserialize, Serialize};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct LoginUserRow {
    pub user: UserRecord,
    pub password_hash: String,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
}

pub async fn get_user_id_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT "id" FROM "users" WHERE "email" = ? LIMIT 1"#)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_id(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id", "email", "name", "createdAt", "updatedAt" FROM "users" WHERE "id" = ?"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| map_user(&row)).transpose()
}

pub async fn select_user_for_login(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<LoginUserRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id", "email", "name", "passwordHash", "createdAt", "updatedAt"
        FROM "users"
        WHERE "email" = ?
        LIMIT 1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(LoginUserRow {
        user: map_user(&row)?,
        password_hash: row.try_get("passwordHash")?,
    }))
}

pub async fn insert_user(
    tx: &mut Transaction<'_, Sqlite>,
    user: NewUser<'_>,
    now_ms: i64,
) -> Result<UserRecord, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "users" ("id", "email", "passwordHash", "name", "createdAt", "updatedAt")
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.name)
    .bind(now_ms)
    .bind(now_ms)
    .execute(&mut **tx)
    .await?;

    Ok(UserRecord {
        id: user.id.to_string(),
        email: user.email.to_string(),
        name: user.name.to_string(),
        created_at: now_ms,
        updated_at: now_ms,
    })
}

fn map_user(row: &sqlx::sqlite::SqliteRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

/// UNIQUE constraint violations surface as database errors with SQLite code 2067.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("2067")
                || db_err.code().as_deref() == Some("1555")
                || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}
