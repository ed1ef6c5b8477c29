use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::boards::{JobBoard, ScrapeError};
use crate::models::{FetchDepth, JobListing};
use crate::scoring::text::{contains_keyword, tokenize};

/// One entry of a `<board>.json` fixture file.
#[derive(Debug, Deserialize)]
struct FixtureListing {
    title: String,
    #[serde(default)]
    company: String,
    url: String,
    #[serde(default)]
    description: String,
}

/// Board backed by a JSON file of listings. The file is re-read on every search
/// so fixtures can be edited while the service runs.
pub struct FixtureBoard {
    id: String,
    path: PathBuf,
}

impl FixtureBoard {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into().to_lowercase(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl JobBoard for FixtureBoard {
    fn id(&self) -> &str {
        &self.id
    }

    async fn search(
        &self,
        keywords: &[String],
        deep_mode: bool,
    ) -> Result<Vec<JobListing>, ScrapeError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScrapeError::Unavailable(format!(
                    "fixture {} no longer exists",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let entries: Vec<FixtureListing> = serde_json::from_str(&raw)?;

        let listings: Vec<JobListing> = entries
            .into_iter()
            .filter(|entry| {
                let tokens = tokenize(&format!("{} {}", entry.title, entry.description));
                keywords.iter().any(|k| contains_keyword(&tokens, k))
            })
            .map(|entry| JobListing {
                board: self.id.clone(),
                title: entry.title,
                company: entry.company,
                url: entry.url,
                description: if deep_mode {
                    entry.description
                } else {
                    String::new()
                },
                depth: if deep_mode {
                    FetchDepth::Deep
                } else {
                    FetchDepth::Shallow
                },
                discovery_index: 0,
            })
            .collect();

        debug!(board = %self.id, count = listings.len(), deep_mode, "fixture board searched");
        Ok(listings)
    }
}

/// One `FixtureBoard` per `*.json` file in `dir`, named by file stem, sorted by name.
pub fn load_fixture_boards(dir: &Path) -> Result<Vec<Arc<dyn JobBoard>>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read board fixtures directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let boards: Vec<Arc<dyn JobBoard>> = paths
        .into_iter()
        .filter_map(|path| {
            let id = path.file_stem()?.to_str()?.to_string();
            Some(Arc::new(FixtureBoard::new(id, path)) as Arc<dyn JobBoard>)
        })
        .collect();

    info!(
        boards = ?boards.iter().map(|b| b.id().to_string()).collect::<Vec<_>>(),
        "job boards loaded"
    );
    Ok(boards)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTINGS: &str = r#"[
        {"title": "Python developer", "company": "Acme", "url": "https://a/1", "description": "Python and SQL"},
        {"title": "Designer", "company": "Studio", "url": "https://a/2", "description": "Figma all day"},
        {"title": "Data engineer", "url": "https://a/3", "description": "Pipelines in python"}
    ]"#;

    fn board_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("remotive.json"), LISTINGS).unwrap();
        std::fs::write(dir.path().join("duunitori.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_search_filters_by_keyword() {
        let dir = board_dir();
        let board = FixtureBoard::new("Remotive", dir.path().join("remotive.json"));
        let listings = board.search(&["python".to_string()], true).await.unwrap();

        assert_eq!(board.id(), "remotive");
        let urls: Vec<&str> = listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a/1", "https://a/3"]);
        assert!(listings.iter().all(|l| l.depth == FetchDepth::Deep));
        assert_eq!(listings[0].description, "Python and SQL");
    }

    #[tokio::test]
    async fn test_shallow_search_drops_descriptions() {
        let dir = board_dir();
        let board = FixtureBoard::new("remotive", dir.path().join("remotive.json"));
        let listings = board.search(&["python".to_string()], false).await.unwrap();
        assert_eq!(listings.len(), 2);
        assert!(listings
            .iter()
            .all(|l| l.depth == FetchDepth::Shallow && l.description.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_or_malformed_file_is_an_error() {
        let dir = board_dir();
        let missing = FixtureBoard::new("gone", dir.path().join("gone.json"));
        match missing.search(&["python".to_string()], true).await {
            Err(ScrapeError::Unavailable(reason)) => assert!(reason.contains("gone.json")),
            other => panic!("expected unavailable board, got {other:?}"),
        }

        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let broken = FixtureBoard::new("broken", dir.path().join("broken.json"));
        assert!(matches!(
            broken.search(&["python".to_string()], true).await,
            Err(ScrapeError::Malformed(_))
        ));
    }

    #[test]
    fn test_load_boards_sorted_by_name() {
        let dir = board_dir();
        let boards = load_fixture_boards(dir.path()).unwrap();
        let ids: Vec<&str> = boards.iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec!["duunitori", "remotive"]);
    }
}
