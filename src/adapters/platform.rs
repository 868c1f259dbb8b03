use crate::domain::model::{LoginCredentials, SessionCredential};
use crate::domain::ports::{LoginLocale, SessionProvider, StoryUploader};
use crate::utils::error::{Result, StoryError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::Path;

const LOGIN_PATH: &str = "accounts/login/";
const CURRENT_USER_PATH: &str = "accounts/current_user/";
const STORY_UPLOAD_PATH: &str = "media/configure_to_story/";

/// 社群平台的 HTTP client，同時實作 session 與上傳兩個 port
pub struct HttpPlatformClient {
    client: Client,
    base_url: String,
}

impl HttpPlatformClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn bearer(session: &SessionCredential) -> Result<String> {
        session
            .session_id()
            .map(|id| format!("Bearer {}", id))
            .ok_or_else(|| StoryError::AuthenticationFailed {
                message: "session has no sessionid".to_string(),
            })
    }
}

#[async_trait]
impl SessionProvider for HttpPlatformClient {
    /// 以 `GET accounts/current_user/` 加上 bearer session id 檢查，不重送密碼
    async fn resume(&self, cached: &SessionCredential) -> Result<SessionCredential> {
        let response = self
            .client
            .get(self.endpoint(CURRENT_USER_PATH))
            .header(reqwest::header::AUTHORIZATION, Self::bearer(cached)?)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!("Cached session for {} is still valid", cached.username);
                Ok(cached.clone())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(StoryError::AuthenticationFailed {
                    message: "cached session rejected".to_string(),
                })
            }
            status => Err(StoryError::AuthenticationFailed {
                message: format!("session check returned {}", status),
            }),
        }
    }

    async fn login(
        &self,
        credentials: &LoginCredentials,
        locale: &LoginLocale,
    ) -> Result<SessionCredential> {
        let timezone_offset = locale.timezone_offset.to_string();
        let response = self
            .client
            .post(self.endpoint(LOGIN_PATH))
            .header(
                reqwest::header::ACCEPT_LANGUAGE,
                locale.locale.replace('_', "-"),
            )
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("locale", locale.locale.as_str()),
                ("country", locale.country.as_str()),
                ("timezone_offset", timezone_offset.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoryError::AuthenticationFailed {
                message: format!("login returned {}", status),
            });
        }

        let payload: Value = response.json().await?;
        let credential = SessionCredential::new(credentials.username.clone(), payload);
        if credential.session_id().is_none() {
            return Err(StoryError::AuthenticationFailed {
                message: "login response has no sessionid".to_string(),
            });
        }

        Ok(credential)
    }
}

#[async_trait]
impl StoryUploader for HttpPlatformClient {
    async fn upload_story(
        &self,
        session: &SessionCredential,
        image_path: &Path,
        caption: &str,
    ) -> Result<()> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "story.jpg".to_string());

        let photo = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .part("photo", photo)
            .text("caption", caption.to_string());

        let response = self
            .client
            .post(self.endpoint(STORY_UPLOAD_PATH))
            .header(reqwest::header::AUTHORIZATION, Self::bearer(session)?)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoryError::UploadError {
                message: format!("{}: {}", status, body),
            });
        }

        Ok(())
    }
}
