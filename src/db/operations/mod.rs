pub mod session;
pub mod syllabus;
pub mod test_record;
pub mod user;

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
