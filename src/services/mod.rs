pub mod alert_settings;
pub mod dashboard;

pub use alert_settings::AlertWindowSettings;
pub use dashboard::{DashboardData, DashboardService};
