pub mod app;
pub mod assignments;
pub mod auth;
pub mod budgets;
pub mod config;
pub mod donations;
pub mod error;
pub mod extract;
pub mod feed;
pub mod guard;
pub mod mail;
pub mod programs;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod uploads;
pub mod users;

mod pagination;

use time::Date;

// `YYYY-MM-DD` (de)serialization for `Date` fields.
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");
