use serde::Serialize;

use crate::db::operations::syllabus::{ChapterFlag, Subject};
use crate::db::operations::test_record::{TestRecord, TestType};

pub const RECENT_PERFORMANCE_LIMIT: usize = 10;
const SHORT_NAME_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_chapters: u32,
    pub completed: u32,
    pub revision1: u32,
    pub revision2: u32,
    pub pyq_solved: u32,
    pub completion_percent: u32,
    pub subjects: Vec<SubjectProgress>,
    pub tests_taken: u32,
    pub average_percent: Option<f64>,
    pub recent_performance: Vec<RecentTest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub id: String,
    pub name: String,
    pub total_chapters: u32,
    pub completed: u32,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentTest {
    pub name: String,
    pub percentage: f64,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub date: String,
}

pub fn compute_dashboard(subjects: &[Subject], tests: &[TestRecord]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_chapters: 0,
        completed: 0,
        revision1: 0,
        revision2: 0,
        pyq_solved: 0,
        completion_percent: 0,
        subjects: Vec::with_capacity(subjects.len()),
        tests_taken: tests.len() as u32,
        average_percent: None,
        recent_performance: Vec::new(),
    };

    for subject in subjects {
        let total = subject.chapters.len() as u32;
        let count = |flag: ChapterFlag| {
            subject.chapters.iter().filter(|chapter| chapter.flag(flag)).count() as u32
        };
        let completed = count(ChapterFlag::IsCompleted);
        stats.revision1 += count(ChapterFlag::Revision1);
        stats.revision2 += count(ChapterFlag::Revision2);
        stats.pyq_solved += count(ChapterFlag::PyqSolved);
        stats.total_chapters += total;
        stats.completed += completed;
        stats.subjects.push(SubjectProgress {
            id: subject.id.clone(),
            name: subject.name.clone(),
            total_chapters: total,
            completed,
            percent: rounded_percent(completed, total),
        });
    }
    stats.completion_percent = rounded_percent(stats.completed, stats.total_chapters.max(1));

    if !tests.is_empty() {
        let sum: f64 = tests.iter().map(TestRecord::percentage).sum();
        stats.average_percent = Some(round1(sum / tests.len() as f64));
    }

    let mut by_date: Vec<&TestRecord> = tests.iter().collect();
    by_date.sort_by(|a, b| a.date.cmp(&b.date));
    let skip = by_date.len().saturating_sub(RECENT_PERFORMANCE_LIMIT);
    stats.recent_performance = by_date[skip..]
        .iter()
        .map(|test| RecentTest {
            name: short_name(&test.name),
            percentage: round1(test.percentage()),
            test_type: test.test_type,
            date: test.date.clone(),
        })
        .collect();

    stats
}

fn rounded_percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(total) * 100.0).round() as u32
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn short_name(name: &str) -> String {
    if name.chars().count() > SHORT_NAME_CHARS {
        let head: String = name.chars().take(SHORT_NAME_CHARS).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::operations::syllabus::Chapter;

    fn subject(id: &str, flags: &[(bool, bool)]) -> Subject {
        Subject {
            id: id.to_string(),
            name: id.to_uppercase(),
            chapters: flags
                .iter()
                .enumerate()
                .map(|(i, (done, pyq))| {
                    let mut chapter = Chapter::new(format!("{id}-{}", i + 1), "ch");
                    chapter.is_completed = *done;
                    chapter.pyq_solved = *pyq;
                    chapter
                })
                .collect(),
        }
    }

    fn test(name: &str, marks: f64, total: f64, date: &str) -> TestRecord {
        TestRecord {
            id: name.to_string(),
            name: name.to_string(),
            subject_id: None,
            test_type: TestType::TopicWise,
            marks_obtained: marks,
            total_marks: total,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_empty_inputs() {
        let stats = compute_dashboard(&[], &[]);
        assert_eq!(stats.total_chapters, 0);
        assert_eq!(stats.completion_percent, 0);
        assert_eq!(stats.average_percent, None);
        assert!(stats.recent_performance.is_empty());
        assert_eq!(serde_json::to_value(&stats).unwrap()["averagePercent"], serde_json::Value::Null);
    }

    #[test]
    fn test_chapter_counts_and_percentages() {
        let subjects = [
            subject("os", &[(true, true), (true, false), (false, false)]),
            subject("cn", &[]),
        ];
        let stats = compute_dashboard(&subjects, &[]);
        assert_eq!(stats.total_chapters, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pyq_solved, 1);
        assert_eq!(stats.completion_percent, 67);
        assert_eq!(stats.subjects[0].percent, 67);
        assert_eq!(stats.subjects[1].percent, 0);
    }

    #[test]
    fn test_flags_counted_independently() {
        let mut revised = Chapter::new("dbms-1", "ER Model");
        revised.revision1 = true;
        revised.revision2 = true;
        let mut second_pass = Chapter::new("dbms-2", "SQL");
        second_pass.revision2 = true;
        let subjects = [Subject {
            id: "dbms".into(),
            name: "DBMS".into(),
            chapters: vec![revised, second_pass],
        }];

        let stats = compute_dashboard(&subjects, &[]);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.revision1, 1);
        assert_eq!(stats.revision2, 2);
        assert_eq!(stats.pyq_solved, 0);
        assert_eq!(stats.completion_percent, 0);
    }

    #[test]
    fn test_average_and_recent_performance() {
        let tests = [
            test("Second mock test", 30.0, 40.0, "2024-02-01"),
            test("First", 2.0, 3.0, "2024-01-01"),
        ];
        let stats = compute_dashboard(&[], &tests);
        assert_eq!(stats.tests_taken, 2);
        assert_eq!(stats.average_percent, Some(70.8));
        assert_eq!(stats.recent_performance[0].name, "First");
        assert_eq!(stats.recent_performance[0].percentage, 66.7);
        assert_eq!(stats.recent_performance[1].name, "Second moc...");
    }

    #[test]
    fn test_recent_performance_keeps_latest_ten() {
        let tests: Vec<TestRecord> = (1..=12)
            .map(|day| test(&format!("t{day}"), 1.0, 2.0, &format!("2024-03-{day:02}")))
            .collect();
        let stats = compute_dashboard(&[], &tests);
        assert_eq!(stats.recent_performance.len(), RECENT_PERFORMANCE_LIMIT);
        assert_eq!(stats.recent_performance[0].date, "2024-03-03");
        assert_eq!(stats.recent_performance[9].date, "2024-03-12");
    }

    #[test]
    fn test_short_name_counts_chars() {
        assert_eq!(short_name("exactly10!"), "exactly10!");
        assert_eq!(short_name("ÄÖÜäöüßÄÖÜx"), "ÄÖÜäöüßÄÖÜ...");
    }
}
