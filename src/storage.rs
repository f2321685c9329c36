use crate::errors::AppError;
use crate::models::AppData;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Loads the document store. A missing file starts an empty store; an
/// unreadable or corrupt one is logged and also starts empty.
pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<AppData>(&bytes) {
            Ok(data) => {
                info!(
                    users = data.users.len(),
                    accounts = data.ad_accounts.len(),
                    campaigns = data.campaigns.len(),
                    metrics = data.campaign_metrics.len(),
                    "loaded data file"
                );
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("ads_dashboard_{}_{name}.json", std::process::id()));
        path
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.users.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{ not json").await.unwrap();
        let data = load_data(&path).await;
        assert!(data.campaigns.is_empty());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persisted_document_loads_back() {
        let path = temp_path("persist");
        let data = crate::seed::build_demo_data("demo@example.com", "password123").unwrap();
        persist_data(&path, &data).await.unwrap();

        let loaded = load_data(&path).await;
        assert_eq!(loaded.users.len(), data.users.len());
        assert_eq!(loaded.campaigns.len(), data.campaigns.len());
        assert_eq!(loaded.campaign_metrics.len(), data.campaign_metrics.len());
        let _ = fs::remove_file(&path).await;
    }
}
