//! Property-based checks for dashboard statistics.

use proptest::prelude::*;

use gate_trek_backend::db::operations::syllabus::{Chapter, Subject};
use gate_trek_backend::db::operations::test_record::{TestRecord, TestType};
use gate_trek_backend::services::dashboard::{compute_dashboard, RECENT_PERFORMANCE_LIMIT};

fn arb_chapter() -> impl Strategy<Value = (bool, bool, bool, bool)> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>())
}

fn arb_subjects() -> impl Strategy<Value = Vec<Subject>> {
    prop::collection::vec(prop::collection::vec(arb_chapter(), 0..12), 0..8).prop_map(|subjects| {
        subjects
            .into_iter()
            .enumerate()
            .map(|(s, chapters)| Subject {
                id: format!("s{s}"),
                name: format!("Subject {s}"),
                chapters: chapters
                    .into_iter()
                    .enumerate()
                    .map(|(c, (done, r1, r2, pyq))| {
                        let mut chapter = Chapter::new(format!("s{s}-{c}"), "chapter");
                        chapter.is_completed = done;
                        chapter.revision1 = r1;
                        chapter.revision2 = r2;
                        chapter.pyq_solved = pyq;
                        chapter
                    })
                    .collect(),
            })
            .collect()
    })
}

fn arb_test_type() -> impl Strategy<Value = TestType> {
    prop_oneof![
        Just(TestType::TopicWise),
        Just(TestType::SubjectWise),
        Just(TestType::FullLength),
    ]
}

fn arb_tests() -> impl Strategy<Value = Vec<TestRecord>> {
    prop::collection::vec(
        (1u32..=28, 1u32..=12, 1u32..=200, -1.0f64..=1.0, arb_test_type(), "[a-zA-Z ]{1,20}"),
        0..25,
    )
    .prop_map(|tests| {
        tests
            .into_iter()
            .enumerate()
            .map(|(i, (day, month, total, ratio, test_type, name))| TestRecord {
                id: format!("t{i}"),
                name,
                subject_id: None,
                test_type,
                marks_obtained: f64::from(total) * ratio,
                total_marks: f64::from(total),
                date: format!("2024-{month:02}-{day:02}"),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_counts_bounded_by_total(subjects in arb_subjects(), tests in arb_tests()) {
        let stats = compute_dashboard(&subjects, &tests);
        prop_assert!(stats.completed <= stats.total_chapters);
        prop_assert!(stats.revision1 <= stats.total_chapters);
        prop_assert!(stats.revision2 <= stats.total_chapters);
        prop_assert!(stats.pyq_solved <= stats.total_chapters);
        prop_assert!(stats.completion_percent <= 100);
        for subject in &stats.subjects {
            prop_assert!(subject.percent <= 100);
            prop_assert!(subject.completed <= subject.total_chapters);
        }
    }

    #[test]
    fn prop_subject_totals_add_up(subjects in arb_subjects()) {
        let stats = compute_dashboard(&subjects, &[]);
        let total: u32 = stats.subjects.iter().map(|s| s.total_chapters).sum();
        let completed: u32 = stats.subjects.iter().map(|s| s.completed).sum();
        prop_assert_eq!(total, stats.total_chapters);
        prop_assert_eq!(completed, stats.completed);
        prop_assert_eq!(stats.subjects.len(), subjects.len());
    }

    #[test]
    fn prop_recent_performance_sorted_and_capped(tests in arb_tests()) {
        let stats = compute_dashboard(&[], &tests);
        prop_assert_eq!(stats.tests_taken as usize, tests.len());
        prop_assert_eq!(stats.recent_performance.len(), tests.len().min(RECENT_PERFORMANCE_LIMIT));
        for pair in stats.recent_performance.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
        for recent in &stats.recent_performance {
            prop_assert!(recent.name.chars().count() <= 13);
            prop_assert!(recent.percentage >= -100.0 && recent.percentage <= 100.0);
        }
        prop_assert_eq!(stats.average_percent.is_none(), tests.is_empty());
    }
}
