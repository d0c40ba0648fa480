use chrono::Utc;

use super::db::Database;
use super::keys::AdminsKey;
use crate::common::StoreError;
use crate::models::{AdminAccount, AdminRole};

pub const SEED_ADMIN_USERNAME: &str = "admin";
pub const SEED_ADMIN_PASSWORD: &str = "admin123";

/// Local admin list (`sapphire-admins`).
impl Database {
    /// Writes the seed superadmin when the list is missing or empty.
    /// `hash` is only called when seeding happens.
    pub async fn seed_admins<F>(&self, hash: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let existing = self.get_local::<AdminsKey>().await?.unwrap_or_default();
        if !existing.is_empty() {
            return Ok(false);
        }

        let Some(password_hash) = hash(SEED_ADMIN_PASSWORD) else {
            log::error!("Could not hash the seed admin password; admin list left empty");
            return Ok(false);
        };

        let seed = AdminAccount {
            username: SEED_ADMIN_USERNAME.to_string(),
            password_hash,
            role: AdminRole::Superadmin,
            created_at: Utc::now(),
        };

        self.update_local::<AdminsKey, _, _>(|admins| {
            if admins.is_empty() {
                admins.push(seed);
                true
            } else {
                false
            }
        })
        .await
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminAccount>, StoreError> {
        Ok(self.get_local::<AdminsKey>().await?.unwrap_or_default())
    }

    pub async fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        let username = username.trim();
        Ok(self
            .list_admins()
            .await?
            .into_iter()
            .find(|a| a.username.eq_ignore_ascii_case(username)))
    }

    /// Returns `false` if the username is taken.
    pub async fn insert_admin(&self, account: AdminAccount) -> Result<bool, StoreError> {
        self.update_local::<AdminsKey, _, _>(|admins| {
            if admins
                .iter()
                .any(|a| a.username.eq_ignore_ascii_case(&account.username))
            {
                false
            } else {
                admins.push(account);
                true
            }
        })
        .await
    }

    pub async fn remove_admin(&self, username: &str) -> Result<bool, StoreError> {
        let username = username.trim().to_string();
        self.update_local::<AdminsKey, _, _>(move |admins| {
            let before = admins.len();
            admins.retain(|a| !a.username.eq_ignore_ascii_case(&username));
            admins.len() != before
        })
        .await
    }
}
