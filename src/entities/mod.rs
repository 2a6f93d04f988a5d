pub mod prelude;

pub mod delegation;
pub mod enrollment;
pub mod event;
pub mod state_report;
pub mod user;
