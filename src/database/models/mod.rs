pub mod absence;
pub mod monthly_stat;
pub mod non_working_day;
pub mod pending_recompute;
pub mod schedule;
pub mod user;
pub mod work_session;

pub use absence::*;
pub use monthly_stat::*;
pub use non_working_day::*;
pub use pending_recompute::*;
pub use schedule::*;
pub use user::*;
pub use work_session::*;
