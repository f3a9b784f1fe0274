pub mod dashboard;
pub mod llm_provider;
pub mod mentor;
pub mod syllabus;
pub mod test_records;
