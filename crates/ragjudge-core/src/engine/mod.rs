pub mod row;
pub mod runner;
