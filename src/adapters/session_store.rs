use crate::domain::model::SessionCredential;
use crate::domain::ports::CredentialStore;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// session 以 JSON 存在固定路徑
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileSessionStore {
    /// 檔案不存在、讀不到或格式錯誤都當作沒有快取
    fn load(&self) -> Option<SessionCredential> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn save(&self, credential: &SessionCredential) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(credential)?;
        fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)) {
                tracing::warn!("failed to chmod 0600 {}: {}", self.path.display(), e);
            }
        }

        tracing::debug!("Session saved to {}", self.path.display());
        Ok(())
    }
}
