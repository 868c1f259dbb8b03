use crate::domain::model::{LoginCredentials, MealDate, MealRecord, SessionCredential};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// 菜單來源。實作不得回傳錯誤，失敗時以 `MealRecord::error()` 表示
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch(&self, date: &MealDate) -> MealRecord;
}

#[derive(Debug, Clone)]
pub struct LoginLocale {
    pub locale: String,
    pub country: String,
    pub timezone_offset: i32,
}

/// 只負責產生有效的 session
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// 確認快取的 session 仍有效，成功時回傳可用的 session
    ///
    /// 不會送出帳號密碼，只帶著快取的 session 向平台查詢；
    /// 被拒絕時回傳錯誤，由呼叫端改走 [`SessionProvider::login`]。
    async fn resume(&self, cached: &SessionCredential) -> Result<SessionCredential>;

    async fn login(
        &self,
        credentials: &LoginCredentials,
        locale: &LoginLocale,
    ) -> Result<SessionCredential>;
}

/// 只負責上傳限時動態
#[async_trait]
pub trait StoryUploader: Send + Sync {
    async fn upload_story(
        &self,
        session: &SessionCredential,
        image_path: &Path,
        caption: &str,
    ) -> Result<()>;
}

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<SessionCredential>;
    fn save(&self, credential: &SessionCredential) -> Result<()>;
}
