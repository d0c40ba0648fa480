use super::db::Database;
use super::keys::CmsDataKey;
use crate::common::StoreError;
use crate::models::CmsContent;

impl Database {
    /// Stored copy, or the built-in defaults when nothing was saved yet.
    pub async fn cms_content(&self) -> Result<CmsContent, StoreError> {
        Ok(self.get_local::<CmsDataKey>().await?.unwrap_or_default())
    }

    pub async fn save_cms_content(&self, content: &CmsContent) -> Result<(), StoreError> {
        self.set_local::<CmsDataKey>(content).await
    }
}
