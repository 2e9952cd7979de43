//! Command execution against a bootstrapped engine session.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::info;

use reskin_engine::{AssetPayload, AssetSession, StoredEntry};

use crate::cli::{AssetAction, ProfileAction};
use crate::error::{AppError, Result};
use crate::output;

pub struct CommandExecutor {
    session: AssetSession,
}

impl CommandExecutor {
    pub fn new(session: AssetSession) -> Self {
        Self { session }
    }

    pub async fn profile(&mut self, action: ProfileAction) -> Result<()> {
        match action {
            ProfileAction::List => {
                let profiles = self.session.profiles();
                let active = self.session.active_profile();
                output::print_profiles(&profiles, active.as_ref().map(|p| p.name.as_str()));
            }
            ProfileAction::Create { name } => {
                let profile = self.session.create_profile(&name).await?;
                println!("Created and switched to profile '{}' [{}]", profile.name, profile.cache_id);
            }
            ProfileAction::Delete { name } => {
                self.session.delete_profile(&name).await?;
                println!("Deleted profile '{name}'");
            }
            ProfileAction::Switch { name } => {
                self.session.switch_profile(&name).await?;
                println!("Switched to profile '{name}'");
            }
        }
        Ok(())
    }

    pub async fn asset(&mut self, action: AssetAction) -> Result<()> {
        match action {
            AssetAction::List => {
                let assets = self.session.assets().await;
                output::print_assets(&assets);
            }
            AssetAction::Set {
                key,
                file,
                link,
                content_type,
            } => {
                let payload = match (file, link) {
                    (Some(path), None) => {
                        let body = Bytes::from(fs::read(&path).await?);
                        let content_type =
                            content_type.or_else(|| guess_content_type(&path).map(String::from));
                        AssetPayload::Bytes { body, content_type }
                    }
                    (None, Some(link)) => AssetPayload::Remote(link),
                    _ => {
                        return Err(AppError::InvalidInput(
                            "exactly one of --file or --link is required".to_string(),
                        ));
                    }
                };

                self.session.update_asset(&key, payload).await?;
                println!("Updated asset {key}");
            }
        }
        Ok(())
    }

    pub async fn export(&self, profile: String, output: Option<PathBuf>) -> Result<()> {
        let (name, blob) = self.session.export_profile(&profile).await?;
        let path = output.unwrap_or_else(|| PathBuf::from(&name));

        fs::write(&path, &blob).await?;
        println!("Exported profile '{profile}' to {} ({} bytes)", path.display(), blob.len());
        Ok(())
    }

    pub async fn fetch(&self, url: String) -> Result<()> {
        let chain = self.session.resolution_chain()?;
        let served = chain.serve(&url).await?;
        output::print_served(&url, &served);
        Ok(())
    }

    pub async fn seed(&self, dir: PathBuf, base_path: String) -> Result<()> {
        let mut entries = Vec::new();
        collect_seed_entries(&dir, &dir, &base_path, &mut entries).await?;

        let count = entries.len();
        self.session.seed_default(entries).await?;

        info!(count, "Default cache seeded");
        println!("Seeded {count} entries into the default cache");
        Ok(())
    }
}

/// Walk a directory tree and turn every file into a default-cache entry
/// keyed by its relative path.
async fn collect_seed_entries(
    root: &Path,
    dir: &Path,
    base_path: &str,
    entries: &mut Vec<(String, StoredEntry)>,
) -> Result<()> {
    let mut reader = fs::read_dir(dir).await?;

    while let Some(dir_entry) = reader.next_entry().await? {
        let path = dir_entry.path();

        if dir_entry.file_type().await?.is_dir() {
            Box::pin(collect_seed_entries(root, &path, base_path, entries)).await?;
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");
        let key = format!("{}/{relative}", base_path.trim_end_matches('/'));

        let body = Bytes::from(fs::read(&path).await?);
        let content_type = guess_content_type(&path).map(String::from);

        entries.push((key, StoredEntry::new(body, content_type)));
    }

    Ok(())
}

/// Best-effort content type from a file extension
fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let content_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" => "video/ogg",
        "json" => "application/json",
        _ => return None,
    };

    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(
            guess_content_type(Path::new("data.json")),
            Some("application/json")
        );
        assert_eq!(guess_content_type(Path::new("notes.txt")), None);
        assert_eq!(guess_content_type(Path::new("no_extension")), None);
    }
}
