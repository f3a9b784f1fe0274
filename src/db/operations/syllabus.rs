use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{Executor, Row, Sqlite, SqlitePool, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub revision1: bool,
    #[serde(default)]
    pub revision2: bool,
    #[serde(default)]
    pub pyq_solved: bool,
}

impl Chapter {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_completed: false,
            revision1: false,
            revision2: false,
            pyq_solved: false,
        }
    }

    pub fn flag(&self, flag: ChapterFlag) -> bool {
        match flag {
            ChapterFlag::IsCompleted => self.is_completed,
            ChapterFlag::Revision1 => self.revision1,
            ChapterFlag::Revision2 => self.revision2,
            ChapterFlag::PyqSolved => self.pyq_solved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// The four independent progress flags a chapter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChapterFlag {
    IsCompleted,
    Revision1,
    Revision2,
    PyqSolved,
}

impl ChapterFlag {
    pub const ALL: [ChapterFlag; 4] = [
        ChapterFlag::IsCompleted,
        ChapterFlag::Revision1,
        ChapterFlag::Revision2,
        ChapterFlag::PyqSolved,
    ];

    pub fn column(self) -> &'static str {
        match self {
            ChapterFlag::IsCompleted => "isCompleted",
            ChapterFlag::Revision1 => "revision1",
            ChapterFlag::Revision2 => "revision2",
            ChapterFlag::PyqSolved => "pyqSolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.column() == value)
    }
}

pub async fn count_subjects<'e, E>(executor: E, user_id: &str) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "subjects" WHERE "userId" = ?"#)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

pub async fn list_subjects(pool: &SqlitePool, user_id: &str) -> Result<Vec<Subject>, sqlx::Error> {
    let subject_rows = sqlx::query(
        r#"SELECT "id", "name" FROM "subjects" WHERE "userId" = ? ORDER BY "position""#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let chapter_rows = sqlx::query(
        r#"
        SELECT "subjectId", "id", "name", "isCompleted", "revision1", "revision2", "pyqSolved"
        FROM "chapters"
        WHERE "userId" = ?
        ORDER BY "subjectId", "position"
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut chapters_by_subject: HashMap<String, Vec<Chapter>> = HashMap::new();
    for row in chapter_rows {
        let subject_id: String = row.try_get("subjectId")?;
        chapters_by_subject.entry(subject_id).or_default().push(Chapter {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_completed: row.try_get("isCompleted")?,
            revision1: row.try_get("revision1")?,
            revision2: row.try_get("revision2")?,
            pyq_solved: row.try_get("pyqSolved")?,
        });
    }

    subject_rows
        .into_iter()
        .map(|row| {
            let id: String = row.try_get("id")?;
            let chapters = chapters_by_subject.remove(&id).unwrap_or_default();
            Ok(Subject {
                name: row.try_get("name")?,
                id,
                chapters,
            })
        })
        .collect()
}

pub async fn insert_subjects(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    subjects: &[Subject],
) -> Result<(), sqlx::Error> {
    for (subject_pos, subject) in subjects.iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO "subjects" ("userId", "id", "name", "position") VALUES (?, ?, ?, ?)"#,
        )
        .bind(user_id)
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(subject_pos as i64)
        .execute(&mut **tx)
        .await?;

        for (chapter_pos, chapter) in subject.chapters.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO "chapters"
                    ("userId", "subjectId", "id", "name", "position",
                     "isCompleted", "revision1", "revision2", "pyqSolved")
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(&subject.id)
            .bind(&chapter.id)
            .bind(&chapter.name)
            .bind(chapter_pos as i64)
            .bind(chapter.is_completed)
            .bind(chapter.revision1)
            .bind(chapter.revision2)
            .bind(chapter.pyq_solved)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}

/// Returns the number of chapters touched; zero means no such chapter for this user.
pub async fn set_chapter_flag(
    pool: &SqlitePool,
    user_id: &str,
    subject_id: &str,
    chapter_id: &str,
    flag: ChapterFlag,
    value: bool,
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        r#"UPDATE "chapters" SET "{}" = ? WHERE "userId" = ? AND "subjectId" = ? AND "id" = ?"#,
        flag.column()
    );
    let result = sqlx::query(&sql)
        .bind(value)
        .bind(user_id)
        .bind(subject_id)
        .bind(chapter_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
