//! Port traits: interfaces the domain calls for data, orders, time and reports.

pub mod brokerage_port;
pub mod clock_port;
pub mod config_port;
pub mod data_port;
pub mod report_port;
