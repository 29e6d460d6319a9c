use duovocab_model::VocabularyItem;
use serde::{Deserialize, Serialize};

/// A language the learner is studying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Display name (e.g., "Spanish").
    pub name: String,
    /// Two-letter code used by the vocabulary endpoints (e.g., "es").
    pub code: String,
}

impl Language {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Output table file name: lowercase language name + `.tsv`.
    pub fn table_file_name(&self) -> String {
        format!("{}.tsv", self.name.to_lowercase())
    }
}

/// `GET /users/{username}`, only the parts the exporter reads.
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub languages: Vec<UserLanguage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLanguage {
    pub language_string: String,
    pub language: String,
    #[serde(default)]
    pub learning: bool,
}

impl UserData {
    pub fn learning_languages(&self) -> Vec<Language> {
        self.languages
            .iter()
            .filter(|l| l.learning)
            .map(|l| Language::new(l.language_string.clone(), l.language.to_lowercase()))
            .collect()
    }
}

/// `GET /vocabulary/overview`.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyOverview {
    pub vocab_overview: Vec<VocabularyItem>,
}

/// Body of `POST /login`. A rejected login carries `failure`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub failure: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
}
