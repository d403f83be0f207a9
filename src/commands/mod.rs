pub mod completions;
pub mod config;
pub mod doctor;
pub mod history;
pub mod run;
pub mod summary;
pub mod traits;

use crate::config::Config;
use crate::store::JsonlStateStore;

/// Store rooted at the configured output directory
pub fn open_store(config: &Config) -> JsonlStateStore {
    JsonlStateStore::new(Config::expand_path(&config.paths.output))
}
