pub mod aggregate;
pub mod exec;
pub mod output;
pub mod service;

pub use aggregate::{hour_histogram, time_labels, week_histogram, week_labels};
pub use exec::{exec, Query};
pub use output::{output_json, times_output, weeks_output};
pub use service::StatsService;
