pub mod error;

use model::{Catalog as Document, Quiz};
use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::RwLock;

type Entries = BTreeMap<String, Arc<Quiz>>;

/// Every known quiz, backed by a single JSON document on disk.
pub struct Catalog {
    /// Location of the persisted document.
    path: PathBuf,
    /// In-memory view. Readers share the same [`Quiz`] through an [`Arc`] so that
    /// running sessions keep their snapshot even if the entry is later replaced.
    quizzes: RwLock<Entries>,
}

/// Parses an uploaded document in full. Nothing is applied if any entry is invalid.
pub fn parse(bytes: &[u8]) -> error::Result<Document> {
    Ok(serde_json::from_slice(bytes)?)
}

impl Catalog {
    /// Loads the document at `path`. A missing file yields an empty catalog;
    /// any other failure is fatal to the caller.
    pub async fn load(path: impl Into<PathBuf>) -> error::Result<Self> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) => parse(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::warn!("{} does not exist yet; starting with an empty catalog", path.display());
                Document::new()
            }
            Err(err) => return Err(err.into()),
        };

        log::info!("loaded {} quizzes from {}", document.len(), path.display());
        let quizzes = document.into_iter().map(|(name, quiz)| (name, Arc::new(quiz))).collect();
        Ok(Self { path, quizzes: RwLock::new(quizzes) })
    }

    pub async fn get(&self, name: &str) -> Option<Arc<Quiz>> {
        self.quizzes.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.quizzes.read().await.keys().cloned().collect()
    }

    /// Parses `bytes` as a whole, overwrites same-named quizzes, adds new ones, and
    /// persists the full result. On any failure the catalog is left untouched,
    /// both in memory and on disk. Returns the names that were written.
    pub async fn merge(&self, bytes: &[u8]) -> error::Result<Vec<String>> {
        let incoming = parse(bytes)?;

        // Holding the write lock across the save serializes concurrent merges.
        let mut quizzes = self.quizzes.write().await;
        let mut next = quizzes.clone();
        let names: Vec<_> = incoming.keys().cloned().collect();
        next.extend(incoming.into_iter().map(|(name, quiz)| (name, Arc::new(quiz))));

        save(&self.path, &next).await?;
        *quizzes = next;
        drop(quizzes);

        log::info!("merged {} quizzes into {}", names.len(), self.path.display());
        Ok(names)
    }
}

/// Replaces the whole file by writing a sibling temporary file and renaming it over.
async fn save(path: &Path, quizzes: &Entries) -> error::Result<()> {
    let view: BTreeMap<_, _> = quizzes.iter().map(|(name, quiz)| (name.as_str(), quiz.as_ref())).collect();
    let bytes = serde_json::to_vec_pretty(&view)?;

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    tokio::fs::write(&temp, &bytes).await?;
    tokio::fs::rename(&temp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{error::Error, Catalog};

    const SCIENCE: &str = r#"{
        "science": { "questions": [{ "question": "Is water wet?", "options": ["Yes", "No"] }] },
        "history": { "questions": [{ "question": "Who came first?", "options": ["Rome", "Greece"] }] }
    }"#;

    #[tokio::test(flavor = "current_thread")]
    async fn missing_file_is_an_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(dir.path().join("quiz_data.json")).await.unwrap();
        assert!(catalog.names().await.is_empty());
        assert!(catalog.get("science").await.is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz_data.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();
        assert!(matches!(Catalog::load(&path).await, Err(Error::Syntax)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn merge_overwrites_only_named_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz_data.json");
        tokio::fs::write(&path, SCIENCE).await.unwrap();

        let catalog = Catalog::load(&path).await.unwrap();
        let history = catalog.get("history").await.unwrap();

        let names = catalog
            .merge(br#"{ "science": { "questions": [{ "question": "Boiling point?", "options": ["90", "100", "110"] }] } }"#)
            .await
            .unwrap();
        assert_eq!(names, ["science"]);

        let science = catalog.get("science").await.unwrap();
        assert_eq!(science.questions()[0].prompt(), "Boiling point?");
        assert_eq!(catalog.get("history").await.unwrap(), history);

        // The file on disk reflects the merge and can be reloaded.
        drop(catalog);
        let reloaded = Catalog::load(&path).await.unwrap();
        assert_eq!(reloaded.names().await, ["history", "science"]);
        assert_eq!(reloaded.get("science").await.unwrap(), science);
        assert!(!dir.path().join("quiz_data.json.tmp").exists());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_merge_leaves_everything_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz_data.json");
        tokio::fs::write(&path, SCIENCE).await.unwrap();
        let catalog = Catalog::load(&path).await.unwrap();

        let err = catalog.merge(b"{\"science\": ").await.unwrap_err();
        assert!(matches!(err, Error::Syntax));
        assert_eq!(err.to_string(), "Invalid JSON file.");

        // One bad entry poisons the whole upload.
        let err = catalog
            .merge(br#"{ "fresh": { "questions": [{ "question": "?", "options": ["a", "b"] }] }, "bad": { "questions": [] } }"#)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert!(catalog.get("fresh").await.is_none());

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), SCIENCE);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn running_sessions_keep_their_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(dir.path().join("quiz_data.json")).await.unwrap();
        catalog.merge(SCIENCE.as_bytes()).await.unwrap();

        let before = catalog.get("science").await.unwrap();
        catalog
            .merge(br#"{ "science": { "questions": [{ "question": "Replaced", "options": ["a", "b"] }] } }"#)
            .await
            .unwrap();
        assert_eq!(before.questions()[0].prompt(), "Is water wet?");
        assert_eq!(catalog.get("science").await.unwrap().questions()[0].prompt(), "Replaced");
    }
}
