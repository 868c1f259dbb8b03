use crate::config::toml_config::IG_USERNAME_ENV;
use crate::domain::model::{LoginCredentials, PublishOutcome, SessionCredential};
use crate::domain::ports::{CredentialStore, LoginLocale, SessionProvider, StoryUploader};
use crate::utils::error::{Result, StoryError};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(SessionCredential),
}

/// 啟動時取得可用的 session：先用快取，不行再重新登入
pub struct Authenticator<'a, P: SessionProvider, S: CredentialStore> {
    provider: &'a P,
    store: &'a S,
    credentials: Option<LoginCredentials>,
    locale: LoginLocale,
}

impl<'a, P: SessionProvider, S: CredentialStore> Authenticator<'a, P, S> {
    pub fn new(
        provider: &'a P,
        store: &'a S,
        credentials: Option<LoginCredentials>,
        locale: LoginLocale,
    ) -> Self {
        Self {
            provider,
            store,
            credentials,
            locale,
        }
    }

    /// Unauthenticated -> Authenticated。重新登入失敗時回傳
    /// [`StoryError::AuthenticationFailed`]，呼叫端應視為致命錯誤。
    pub async fn authenticate(&self) -> Result<AuthState> {
        if let Some(cached) = self.store.load() {
            match self.provider.resume(&cached).await {
                Ok(session) => {
                    tracing::info!("🔑 Reusing cached session for {}", session.username);
                    return Ok(AuthState::Authenticated(session));
                }
                Err(e) => tracing::warn!("⚠️ Cached session unusable ({}), logging in again", e),
            }
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| StoryError::MissingConfigError {
                field: IG_USERNAME_ENV.to_string(),
            })?;

        tracing::info!(
            "🔑 Logging in as {} (locale {}, tz offset {})",
            credentials.username,
            self.locale.locale,
            self.locale.timezone_offset
        );
        let session = self
            .provider
            .login(credentials, &self.locale)
            .await
            .map_err(|e| match e {
                StoryError::AuthenticationFailed { .. } => e,
                other => StoryError::AuthenticationFailed {
                    message: other.to_string(),
                },
            })?;

        if let Err(e) = self.store.save(&session) {
            tracing::warn!("⚠️ Could not persist session: {}", e);
        }

        Ok(AuthState::Authenticated(session))
    }
}

pub struct Publisher<U: StoryUploader> {
    uploader: U,
    session: SessionCredential,
}

impl<U: StoryUploader> Publisher<U> {
    pub fn new(uploader: U, session: SessionCredential) -> Self {
        Self { uploader, session }
    }

    /// 只能從 Authenticated 狀態建立
    pub fn from_state(uploader: U, state: AuthState) -> Result<Self> {
        match state {
            AuthState::Authenticated(session) => Ok(Self::new(uploader, session)),
            AuthState::Unauthenticated => Err(StoryError::AuthenticationFailed {
                message: "publisher requires an authenticated session".to_string(),
            }),
        }
    }

    pub fn session(&self) -> &SessionCredential {
        &self.session
    }

    /// 上傳失敗不會中斷流程，只回報結果
    pub async fn publish(&self, image_path: &Path, caption: &str) -> PublishOutcome {
        if !image_path.is_file() {
            tracing::warn!("⚠️ Image {} not found, skipping upload", image_path.display());
            return PublishOutcome::Skipped {
                reason: format!("{} does not exist", image_path.display()),
            };
        }

        match self
            .uploader
            .upload_story(&self.session, image_path, caption)
            .await
        {
            Ok(()) => {
                tracing::info!("📤 Story uploaded: {}", image_path.display());
                PublishOutcome::Published
            }
            Err(e) => {
                tracing::error!("❌ Story upload failed for {}: {}", image_path.display(), e);
                PublishOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeProvider {
        accept_cached: bool,
        accept_login: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionProvider for FakeProvider {
        async fn resume(&self, cached: &SessionCredential) -> Result<SessionCredential> {
            self.calls.lock().unwrap().push("resume".to_string());
            if self.accept_cached {
                Ok(cached.clone())
            } else {
                Err(StoryError::AuthenticationFailed {
                    message: "expired".to_string(),
                })
            }
        }

        async fn login(
            &self,
            credentials: &LoginCredentials,
            locale: &LoginLocale,
        ) -> Result<SessionCredential> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("login:{}", locale.locale));
            if self.accept_login {
                Ok(SessionCredential::new(
                    credentials.username.clone(),
                    serde_json::json!({"sessionid": "fresh"}),
                ))
            } else {
                Err(StoryError::ApiError {
                    message: "challenge_required".to_string(),
                })
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        stored: Mutex<Option<SessionCredential>>,
        saves: Mutex<usize>,
    }

    impl CredentialStore for MemoryStore {
        fn load(&self) -> Option<SessionCredential> {
            self.stored.lock().unwrap().clone()
        }

        fn save(&self, credential: &SessionCredential) -> Result<()> {
            *self.stored.lock().unwrap() = Some(credential.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeUploader {
        fail: bool,
        uploads: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl StoryUploader for FakeUploader {
        async fn upload_story(
            &self,
            _session: &SessionCredential,
            image_path: &Path,
            caption: &str,
        ) -> Result<()> {
            if self.fail {
                return Err(StoryError::UploadError {
                    message: "feedback_required".to_string(),
                });
            }
            self.uploads
                .lock()
                .unwrap()
                .push((image_path.display().to_string(), caption.to_string()));
            Ok(())
        }
    }

    fn locale() -> LoginLocale {
        LoginLocale {
            locale: "ko_KR".to_string(),
            country: "KR".to_string(),
            timezone_offset: 32400,
        }
    }

    fn credentials() -> Option<LoginCredentials> {
        Some(LoginCredentials {
            username: "sokgo_meal".to_string(),
            password: "pw".to_string(),
        })
    }

    fn session(id: &str) -> SessionCredential {
        SessionCredential::new("sokgo_meal", serde_json::json!({ "sessionid": id }))
    }

    #[tokio::test]
    async fn test_valid_cached_session_skips_login() {
        let provider = FakeProvider {
            accept_cached: true,
            ..Default::default()
        };
        let store = MemoryStore::default();
        *store.stored.lock().unwrap() = Some(session("cached"));

        let state = Authenticator::new(&provider, &store, credentials(), locale())
            .authenticate()
            .await
            .unwrap();

        assert_eq!(state, AuthState::Authenticated(session_from(&store)));
        assert_eq!(*provider.calls.lock().unwrap(), vec!["resume"]);
        assert_eq!(*store.saves.lock().unwrap(), 0);
    }

    fn session_from(store: &MemoryStore) -> SessionCredential {
        store.stored.lock().unwrap().clone().unwrap()
    }

    #[tokio::test]
    async fn test_stale_cache_falls_through_to_login_and_persists() {
        let provider = FakeProvider {
            accept_cached: false,
            accept_login: true,
            ..Default::default()
        };
        let store = MemoryStore::default();
        *store.stored.lock().unwrap() = Some(session("stale"));

        let state = Authenticator::new(&provider, &store, credentials(), locale())
            .authenticate()
            .await
            .unwrap();

        let AuthState::Authenticated(active) = state else {
            panic!("expected authenticated state");
        };
        assert_eq!(active.session_id(), Some("fresh"));
        assert_eq!(
            *provider.calls.lock().unwrap(),
            vec!["resume", "login:ko_KR"]
        );
        assert_eq!(session_from(&store).session_id(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_no_cache_logs_in_directly() {
        let provider = FakeProvider {
            accept_login: true,
            ..Default::default()
        };
        let store = MemoryStore::default();

        Authenticator::new(&provider, &store, credentials(), locale())
            .authenticate()
            .await
            .unwrap();

        assert_eq!(*provider.calls.lock().unwrap(), vec!["login:ko_KR"]);
        assert_eq!(*store.saves.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fresh_login_failure_is_fatal() {
        let provider = FakeProvider::default();
        let store = MemoryStore::default();

        let err = Authenticator::new(&provider, &store, credentials(), locale())
            .authenticate()
            .await
            .unwrap_err();

        assert!(matches!(err, StoryError::AuthenticationFailed { .. }));
        assert!(err.is_fatal());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_missing_credentials_is_fatal() {
        let provider = FakeProvider::default();
        let store = MemoryStore::default();

        let err = Authenticator::new(&provider, &store, None, locale())
            .authenticate()
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_publisher_requires_authenticated_state() {
        let result = Publisher::from_state(FakeUploader::default(), AuthState::Unauthenticated);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_publish_missing_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let publisher = Publisher::new(FakeUploader::default(), session("s"));

        let outcome = publisher
            .publish(&tmp.path().join("중식.jpg"), "caption")
            .await;

        assert!(matches!(outcome, PublishOutcome::Skipped { .. }));
        assert!(publisher.uploader.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_uploads_with_caption() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("중식.jpg");
        std::fs::write(&image, b"jpeg").unwrap();
        let publisher = Publisher::new(FakeUploader::default(), session("s"));

        let outcome = publisher.publish(&image, "2024년 09월 05일 (목) 중식").await;

        assert_eq!(outcome, PublishOutcome::Published);
        let uploads = publisher.uploader.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, "2024년 09월 05일 (목) 중식");
    }

    #[tokio::test]
    async fn test_upload_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let image = tmp.path().join("석식.jpg");
        std::fs::write(&image, b"jpeg").unwrap();
        let uploader = FakeUploader {
            fail: true,
            ..Default::default()
        };
        let publisher = Publisher::new(uploader, session("s"));

        let outcome = publisher.publish(&image, "c").await;
        assert!(matches!(outcome, PublishOutcome::Failed { .. }));
    }
}
