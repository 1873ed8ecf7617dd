pub mod covers;
pub mod database;
pub mod repositories;
