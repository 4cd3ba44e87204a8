pub mod attendance;
pub mod history;
pub mod stats;

pub use attendance::AttendanceService;
