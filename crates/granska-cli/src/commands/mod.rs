pub mod candidates;
pub mod config;
pub mod extract;
pub mod report;
