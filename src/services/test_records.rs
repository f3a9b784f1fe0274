use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::operations::now_ms;
use crate::db::operations::test_record::{
    self as store, TestRecord, TestRecordFilter, TestType, ALL_SUBJECTS,
};
use crate::db::operations::user::is_unique_violation;

/// Incoming test record. Everything is optional so validation can report what is wrong.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecordInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub subject_id: Option<String>,
    #[serde(rename = "type")]
    pub test_type: Option<String>,
    pub marks_obtained: Option<f64>,
    pub total_marks: Option<f64>,
    pub date: Option<String>,
}

#[derive(Debug, Error)]
pub enum TestRecordError {
    #[error("{0}")]
    Invalid(String),
    #[error("A test with this id already exists")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn invalid(message: &str) -> TestRecordError {
    TestRecordError::Invalid(message.to_string())
}

pub fn parse_filter(subject_id: Option<String>, test_type: Option<String>) -> Result<TestRecordFilter, TestRecordError> {
    let test_type = match test_type.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Some(TestType::parse(raw).ok_or_else(|| invalid("Unknown test type"))?),
        None => None,
    };
    Ok(TestRecordFilter {
        subject_id: subject_id.filter(|v| !v.trim().is_empty()),
        test_type,
    })
}

/// Checks every field and normalizes the record for storage.
pub fn validate(input: TestRecordInput) -> Result<TestRecord, TestRecordError> {
    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| invalid("Test name is required"))?;

    let test_type = input
        .test_type
        .as_deref()
        .and_then(TestType::parse)
        .ok_or_else(|| invalid("type must be one of Topic Wise, Subject Wise, Full Length"))?;

    let total_marks = input
        .total_marks
        .filter(|t| t.is_finite() && *t > 0.0)
        .ok_or_else(|| invalid("totalMarks must be greater than 0"))?;

    let marks_obtained = input
        .marks_obtained
        .filter(|m| m.is_finite())
        .ok_or_else(|| invalid("marksObtained is required"))?;
    if marks_obtained > total_marks || marks_obtained < -total_marks {
        return Err(invalid("marksObtained must be between -totalMarks and totalMarks"));
    }

    let date = input
        .date
        .as_deref()
        .map(str::trim)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| invalid("date must be a valid YYYY-MM-DD date"))?;

    let subject_id = match test_type {
        TestType::FullLength => Some(ALL_SUBJECTS.to_string()),
        _ => input.subject_id.filter(|s| !s.trim().is_empty()),
    };

    let id = input
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(TestRecord {
        id,
        name,
        subject_id,
        test_type,
        marks_obtained,
        total_marks,
        date: date.format("%Y-%m-%d").to_string(),
    })
}

pub async fn list(
    pool: &SqlitePool,
    user_id: &str,
    filter: &TestRecordFilter,
) -> Result<Vec<TestRecord>, TestRecordError> {
    Ok(store::list_test_records(pool, user_id, filter).await?)
}

pub async fn create(
    pool: &SqlitePool,
    user_id: &str,
    input: TestRecordInput,
) -> Result<TestRecord, TestRecordError> {
    let record = validate(input)?;
    match store::insert_test_record(pool, user_id, &record, now_ms()).await {
        Ok(()) => Ok(record),
        Err(err) if is_unique_violation(&err) => Err(TestRecordError::Duplicate),
        Err(err) => Err(err.into()),
    }
}

/// Deleting an id the user does not own is a no-op.
pub async fn delete(pool: &SqlitePool, user_id: &str, record_id: &str) -> Result<(), TestRecordError> {
    let removed = store::delete_test_record(pool, user_id, record_id).await?;
    tracing::debug!(user_id, record_id, removed, "test record delete");
    Ok(())
}
