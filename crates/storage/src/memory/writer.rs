use std::io::Write;
use std::path::PathBuf;

use flate2::write::GzEncoder;
use flate2::Compression;

use super::export::Export;
use super::MemoryConfig;
use crate::error::StorageError;

/// `{mission}_{YYYYMMDD_HHMMSS}.json[.gz]` with spaces and colons replaced.
pub fn artifact_file_name(mission_name: &str, compress: bool) -> String {
    let sanitized = mission_name.replace([' ', ':'], "_");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let extension = if compress { "json.gz" } else { "json" };
    format!("{sanitized}_{timestamp}.{extension}")
}

/// Serialize `export` and write it under the configured output directory.
pub(super) async fn write_artifact(
    config: &MemoryConfig,
    mission_name: &str,
    export: &Export,
) -> Result<PathBuf, StorageError> {
    let mut bytes = serde_json::to_vec(export)?;
    if config.compress_output {
        let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 4), Compression::default());
        encoder.write_all(&bytes)?;
        bytes = encoder.finish()?;
    }

    tokio::fs::create_dir_all(&config.output_dir).await?;
    let path = config
        .output_dir
        .join(artifact_file_name(mission_name, config.compress_output));
    tokio::fs::write(&path, &bytes).await?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_sanitized() {
        let name = artifact_file_name("Op Thunder: Night", true);
        assert!(name.starts_with("Op_Thunder__Night_"), "got {name}");
        assert!(name.ends_with(".json.gz"));

        let plain = artifact_file_name("m", false);
        assert!(plain.ends_with(".json") && !plain.ends_with(".json.gz"));
        // m_ + 8 date digits + _ + 6 time digits + .json
        assert_eq!(plain.len(), "m_".len() + 15 + ".json".len());
    }
}
