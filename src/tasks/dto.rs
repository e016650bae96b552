use serde::Deserialize;
use time::Date;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    pub image: Option<String>,
    pub video: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    pub image: Option<String>,
    pub video: Option<String>,
}
