use std::collections::HashSet;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::operations::syllabus::{self as store, Chapter, ChapterFlag, Subject};
use crate::db::operations::user::is_unique_violation;

const DEFAULT_SYLLABUS: &[(&str, &str, &[&str])] = &[
    (
        "em",
        "Engineering Mathematics",
        &["Discrete Mathematics", "Linear Algebra", "Calculus", "Probability & Statistics"],
    ),
    (
        "dl",
        "Digital Logic",
        &[
            "Boolean Algebra",
            "Combinational Circuits",
            "Sequential Circuits",
            "Number Representations",
        ],
    ),
    (
        "coa",
        "Computer Organization & Architecture",
        &[
            "Machine Instructions & Addressing Modes",
            "ALU, Data Path & Control Unit",
            "Instruction Pipelining",
            "Memory Hierarchy (Cache, Main, Secondary)",
            "I/O Interface",
        ],
    ),
    (
        "pds",
        "Programming & Data Structures",
        &[
            "C Programming",
            "Recursion",
            "Arrays, Stacks, Queues",
            "Linked Lists",
            "Trees",
            "Binary Search Trees",
            "Binary Heaps",
            "Graphs",
        ],
    ),
    (
        "algo",
        "Algorithms",
        &[
            "Asymptotic Analysis",
            "Divide & Conquer",
            "Greedy Algorithms",
            "Dynamic Programming",
            "Graph Algorithms (BFS/DFS/Shortest Path/MST)",
            "Hashing",
        ],
    ),
    (
        "toc",
        "Theory of Computation",
        &[
            "Regular Languages & Finite Automata",
            "Context-Free Languages & Pushdown Automata",
            "Recursive & Recursively Enumerable Languages",
            "Turing Machines & Undecidability",
        ],
    ),
    (
        "cd",
        "Compiler Design",
        &[
            "Lexical Analysis",
            "Parsing (Top-down & Bottom-up)",
            "Syntax Directed Translation",
            "Intermediate Code Generation",
            "Code Optimization",
        ],
    ),
    (
        "os",
        "Operating Systems",
        &[
            "Processes & Threads",
            "CPU Scheduling",
            "Synchronization & Deadlocks",
            "Memory Management & Virtual Memory",
            "File Systems",
        ],
    ),
    (
        "dbms",
        "Database Management Systems",
        &[
            "ER Model",
            "Relational Model & Algebra",
            "SQL",
            "Normalization",
            "Transactions & Concurrency Control",
            "File Organization & Indexing (B/B+ Trees)",
        ],
    ),
    (
        "cn",
        "Computer Networks",
        &[
            "OSI & TCP/IP Stack",
            "Data Link Layer (Flow/Error Control, MAC)",
            "Network Layer (IP, Routing)",
            "Transport Layer (TCP/UDP, Congestion)",
            "Application Layer (HTTP, DNS, SMTP)",
        ],
    ),
    (
        "ga",
        "General Aptitude",
        &[
            "Quantitative Aptitude",
            "Analytical Aptitude",
            "Spatial Aptitude",
            "Verbal Aptitude",
        ],
    ),
];

#[derive(Debug, Error)]
pub enum SyllabusError {
    #[error("{0}")]
    Invalid(String),
    #[error("Chapter not found")]
    ChapterNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadyExists,
    Seeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializeOutcome {
    AlreadyInitialized(Vec<Subject>),
    Initialized(Vec<Subject>),
}

/// The full GATE CSE syllabus with every flag cleared.
pub fn default_syllabus() -> Vec<Subject> {
    DEFAULT_SYLLABUS
        .iter()
        .map(|(subject_id, name, chapters)| Subject {
            id: (*subject_id).to_string(),
            name: (*name).to_string(),
            chapters: chapters
                .iter()
                .enumerate()
                .map(|(idx, chapter)| Chapter::new(format!("{subject_id}-{}", idx + 1), *chapter))
                .collect(),
        })
        .collect()
}

pub fn validate_subjects(subjects: &[Subject]) -> Result<(), SyllabusError> {
    let mut subject_ids = HashSet::new();
    for subject in subjects {
        if subject.id.trim().is_empty() {
            return Err(SyllabusError::Invalid("Subject id is required".to_string()));
        }
        if !subject_ids.insert(subject.id.as_str()) {
            return Err(SyllabusError::Invalid(format!(
                "Duplicate subject id: {}",
                subject.id
            )));
        }

        let mut chapter_ids = HashSet::new();
        for chapter in &subject.chapters {
            if chapter.id.trim().is_empty() {
                return Err(SyllabusError::Invalid(format!(
                    "Chapter id is required in subject {}",
                    subject.id
                )));
            }
            if !chapter_ids.insert(chapter.id.as_str()) {
                return Err(SyllabusError::Invalid(format!(
                    "Duplicate chapter id {} in subject {}",
                    chapter.id, subject.id
                )));
            }
        }
    }
    Ok(())
}

pub async fn get_syllabus(pool: &SqlitePool, user_id: &str) -> Result<Vec<Subject>, SyllabusError> {
    Ok(store::list_subjects(pool, user_id).await?)
}

/// Returns `false` when another request stored a syllabus for this user first.
/// The first insert takes the write lock, so the recount inside the transaction sees every commit.
async fn insert_all(pool: &SqlitePool, user_id: &str, subjects: &[Subject]) -> Result<bool, SyllabusError> {
    let mut tx = pool.begin().await?;
    match store::insert_subjects(&mut tx, user_id, subjects).await {
        Ok(()) => {}
        Err(err) if is_unique_violation(&err) => return Ok(false),
        Err(err) => return Err(err.into()),
    }
    let stored = store::count_subjects(&mut *tx, user_id).await?;
    if stored != subjects.len() as i64 {
        return Ok(false);
    }
    tx.commit().await?;
    Ok(true)
}

pub async fn seed(
    pool: &SqlitePool,
    user_id: &str,
    subjects: &[Subject],
) -> Result<SeedOutcome, SyllabusError> {
    if store::count_subjects(pool, user_id).await? > 0 {
        return Ok(SeedOutcome::AlreadyExists);
    }
    validate_subjects(subjects)?;
    if !insert_all(pool, user_id, subjects).await? {
        return Ok(SeedOutcome::AlreadyExists);
    }
    tracing::info!(user_id, subjects = subjects.len(), "syllabus seeded");
    Ok(SeedOutcome::Seeded)
}

/// Inserts `subjects`, or the default syllabus when none are given, unless the user already has one.
pub async fn initialize(
    pool: &SqlitePool,
    user_id: &str,
    subjects: Option<Vec<Subject>>,
) -> Result<InitializeOutcome, SyllabusError> {
    if store::count_subjects(pool, user_id).await? > 0 {
        let existing = store::list_subjects(pool, user_id).await?;
        return Ok(InitializeOutcome::AlreadyInitialized(existing));
    }

    let subjects = subjects
        .filter(|subjects| !subjects.is_empty())
        .unwrap_or_else(default_syllabus);
    validate_subjects(&subjects)?;
    let inserted = insert_all(pool, user_id, &subjects).await?;
    let stored = store::list_subjects(pool, user_id).await?;
    if !inserted {
        tracing::debug!(user_id, "syllabus initialized concurrently");
        return Ok(InitializeOutcome::AlreadyInitialized(stored));
    }
    tracing::info!(user_id, subjects = subjects.len(), "syllabus initialized");
    Ok(InitializeOutcome::Initialized(stored))
}

pub async fn update_chapter(
    pool: &SqlitePool,
    user_id: &str,
    subject_id: &str,
    chapter_id: &str,
    field: &str,
    value: &serde_json::Value,
) -> Result<(), SyllabusError> {
    let flag = ChapterFlag::parse(field).ok_or_else(|| {
        SyllabusError::Invalid(
            "field must be one of isCompleted, revision1, revision2, pyqSolved".to_string(),
        )
    })?;
    let value = value
        .as_bool()
        .ok_or_else(|| SyllabusError::Invalid("value must be a boolean".to_string()))?;

    let touched = store::set_chapter_flag(pool, user_id, subject_id, chapter_id, flag, value).await?;
    if touched == 0 {
        return Err(SyllabusError::ChapterNotFound);
    }
    Ok(())
}
