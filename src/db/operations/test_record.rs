use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

pub const ALL_SUBJECTS: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "Topic Wise")]
    TopicWise,
    #[serde(rename = "Subject Wise")]
    SubjectWise,
    #[serde(rename = "Full Length")]
    FullLength,
}

impl TestType {
    pub fn as_str(self) -> &'static str {
        match self {
            TestType::TopicWise => "Topic Wise",
            TestType::SubjectWise => "Subject Wise",
            TestType::FullLength => "Full Length",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Topic Wise" => Some(TestType::TopicWise),
            "Subject Wise" => Some(TestType::SubjectWise),
            "Full Length" => Some(TestType::FullLength),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    pub name: String,
    pub subject_id: Option<String>,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub date: String,
}

impl TestRecord {
    pub fn percentage(&self) -> f64 {
        if self.total_marks <= 0.0 {
            return 0.0;
        }
        self.marks_obtained / self.total_marks * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestRecordFilter {
    pub subject_id: Option<String>,
    pub test_type: Option<TestType>,
}

pub async fn list_test_records(
    pool: &SqlitePool,
    user_id: &str,
    filter: &TestRecordFilter,
) -> Result<Vec<TestRecord>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"SELECT "id", "name", "subjectId", "type", "marksObtained", "totalMarks", "date"
           FROM "test_records" WHERE "userId" = "#,
    );
    qb.push_bind(user_id);

    if let Some(subject_id) = filter.subject_id.as_deref() {
        qb.push(r#" AND "subjectId" = "#).push_bind(subject_id);
    }
    if let Some(test_type) = filter.test_type {
        qb.push(r#" AND "type" = "#).push_bind(test_type.as_str());
    }
    qb.push(r#" ORDER BY "date", "createdAt", "rowid""#);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(map_test_record).collect()
}

pub async fn insert_test_record(
    pool: &SqlitePool,
    user_id: &str,
    record: &TestRecord,
    now_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "test_records"
            ("userId", "id", "name", "subjectId", "type", "marksObtained", "totalMarks", "date", "createdAt")
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&record.id)
    .bind(&record.name)
    .bind(record.subject_id.as_deref())
    .bind(record.test_type.as_str())
    .bind(record.marks_obtained)
    .bind(record.total_marks)
    .bind(&record.date)
    .bind(now_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_test_record(
    pool: &SqlitePool,
    user_id: &str,
    record_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "test_records" WHERE "userId" = ? AND "id" = ?"#)
        .bind(user_id)
        .bind(record_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn map_test_record(row: &sqlx::sqlite::SqliteRow) -> Result<TestRecord, sqlx::Error> {
    let raw_type: String = row.try_get("type")?;
    let test_type = TestType::parse(&raw_type).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "type".to_string(),
        source: format!("unknown test type: {raw_type}").into(),
    })?;

    Ok(TestRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        subject_id: row.try_get("subjectId")?,
        test_type,
        marks_obtained: row.try_get("marksObtained")?,
        total_marks: row.try_get("totalMarks")?,
        date: row.try_get("date")?,
    })
}
