use std::path::PathBuf;

use crate::feed::DEFAULT_FEED_URL;

pub const FEED_URL_ENV: &str = "INTERNHUNT_FEED_URL";
pub const DATA_DIR_ENV: &str = "INTERNHUNT_DATA_DIR";

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn resolve(feed_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        Self::resolve_with(feed_url, data_dir, |name| std::env::var(name).ok())
    }

    fn resolve_with(
        feed_url: Option<String>,
        data_dir: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let feed_url = feed_url
            .or_else(|| env(FEED_URL_ENV))
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());

        let data_dir = data_dir
            .or_else(|| env(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(Self::default_data_dir);

        Self { feed_url, data_dir }
    }

    fn default_data_dir() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "internhunt") {
            proj_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("internhunt.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("internhunt.log")
    }
}
