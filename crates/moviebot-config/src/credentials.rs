use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const BOT_TOKEN_KEY: &str = "bot_token";
const TMDB_API_KEY_KEY: &str = "tmdb_api_key";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Secrets kept apart from `config.toml` so the config can be shared safely
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn get_bot_token(&self) -> Option<&String> {
        self.get(BOT_TOKEN_KEY)
    }

    pub fn set_bot_token(&mut self, token: String) {
        self.set(BOT_TOKEN_KEY.to_string(), token);
    }

    pub fn get_tmdb_api_key(&self) -> Option<&String> {
        self.get(TMDB_API_KEY_KEY)
    }

    pub fn set_tmdb_api_key(&mut self, key: String) {
        self.set(TMDB_API_KEY_KEY.to_string(), key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_bot_token("123:abc".to_string());
        store.set_tmdb_api_key("tmdb-key".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.get_bot_token(), Some(&"123:abc".to_string()));
        assert_eq!(loaded_store.get_tmdb_api_key(), Some(&"tmdb-key".to_string()));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CredentialStore::new(dir.path().join("credentials.toml"));
        store.load().unwrap();
        assert!(store.get_bot_token().is_none());
    }

    #[test]
    fn test_set_overwrites_existing_value() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set_bot_token("old".to_string());
        store.set_bot_token("new".to_string());
        assert_eq!(store.get_bot_token(), Some(&"new".to_string()));
        assert!(store.get_tmdb_api_key().is_none());
    }
}
