use std::path::PathBuf;

use serde::Deserialize;

use crate::config::Config;
use crate::mentor::MentorGate;
use crate::store::Storage;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub gate: MentorGate,
    pub workspace: Option<PathBuf>,
    pub storage: Option<Box<dyn Storage>>,
}

impl AppState {
    pub fn new(config: Config, gate: MentorGate) -> Self {
        Self {
            config,
            gate,
            workspace: None,
            storage: None,
        }
    }
}
