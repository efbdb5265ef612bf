pub mod activity;
pub mod assignment;
pub mod reinforcement;
pub mod reporting;
pub mod submission;
pub mod user;
