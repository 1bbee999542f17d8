pub mod chart;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug, Clone)]
pub enum InternalError {
    #[error("Export error: {0}")]
    Export(String),
}

/// Writes a JSON document under the app's data directory, creating parent
/// directories as needed. Returns the path written to.
pub fn write_json_to_file(json: &str, file_name: &str) -> std::io::Result<PathBuf> {
    let path = data_path(Some(file_name));

    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid export file path")
    })?;

    if !parent.exists() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&path)?;
    file.write_all(json.as_bytes())?;
    log::debug!("wrote {} bytes to {}", json.len(), path.display());
    Ok(path)
}

pub fn data_path(path_name: Option<&str>) -> PathBuf {
    if let Ok(path) = std::env::var("CHAINSCOPE_DATA_PATH") {
        PathBuf::from(path)
    } else {
        let data_dir = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
        if let Some(path_name) = path_name {
            data_dir.join("chainscope").join(path_name)
        } else {
            data_dir.join("chainscope")
        }
    }
}
