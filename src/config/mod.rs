mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

/// Loads the YAML configuration named by `CONFIG_PATH`, defaulting to
/// `config.yaml` in the working directory. The file must carry the `llm`
/// and `los` sections; everything under `server` has defaults.
pub async fn load() -> Result<Config> {
    let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    load_from(&path).await
}

async fn load_from(path: &str) -> Result<Config> {
    debug!("loading configuration from {}", path);

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::config(format!("cannot read {}: {}", path, e)))?;

    serde_yaml::from_str(&raw).map_err(|e| Error::config(format!("cannot parse {}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_from_reads_a_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loschat.yaml");
        tokio::fs::write(
            &path,
            r#"
llm:
  base_url: ""
  api_key: "test-key"
  model: "gpt-4o-mini"
server:
  port: 9090
los:
  search_url: "https://los.example.com/elasticsearch/customers"
  detail_url: "https://los.example.com/details"
  sign_in_url: "https://los.example.com/auth/sign-in"
"#,
        )
        .await
        .unwrap();

        let config = load_from(&path.to_string_lossy()).await.unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.los.sign_in_url, "https://los.example.com/auth/sign-in");
    }

    #[tokio::test]
    async fn test_load_from_missing_file_names_the_path() {
        let err = load_from("/nonexistent/loschat.yaml").await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("/nonexistent/loschat.yaml"));
    }

    #[tokio::test]
    async fn test_load_from_invalid_yaml_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        tokio::fs::write(&path, "llm: [not, a, mapping").await.unwrap();

        let err = load_from(&path.to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("broken.yaml"));
    }
}
