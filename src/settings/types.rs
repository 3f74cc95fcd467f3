use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Sepia,
    Midnight,
    Forest,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub theme: Theme,
    pub launch_on_startup: bool,
}

#[derive(Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub identifier: String,
    pub notes_dir: String,
}
