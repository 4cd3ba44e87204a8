pub mod date;
pub mod subject_cache;
