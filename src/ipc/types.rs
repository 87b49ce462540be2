use std::path::PathBuf;

use serde::Deserialize;

use crate::cache::LocalCache;
use crate::remote::RemoteStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub remote: Option<RemoteStore>,
    pub cache: Option<LocalCache>,
}
