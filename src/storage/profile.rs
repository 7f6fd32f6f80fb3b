use crate::identity::IdentityFields;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Profile storage error: {0}")]
    Storage(String),
}

/// 由身份信息得到的资料更新
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    /// 完整 12 位，或 `********` 加后四位
    pub aadhaar_number: String,
}

impl ProfileUpdate {
    pub fn from_fields(fields: &IdentityFields) -> Self {
        let aadhaar_number = match fields.identifier.full_digits() {
            Some(digits) => digits.to_string(),
            None => format!("********{}", fields.identifier.last_four()),
        };

        Self {
            name: fields.name.clone(),
            address: Some(fields.address_line.clone()).filter(|a| !a.is_empty()),
            aadhaar_number,
        }
    }
}

/// 用户资料（外部协作方持有的那一部分）
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub address: Option<String>,
    pub aadhaar_number: Option<String>,
}

impl UserProfile {
    /// 只覆盖更新中存在的字段
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(address) = &update.address {
            self.address = Some(address.clone());
        }
        self.aadhaar_number = Some(update.aadhaar_number.clone());
    }
}

/// 外部资料更新接口
pub trait ProfileSink: Send + Sync {
    /// 应用更新并返回保存后的资料
    fn apply(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserProfile, ProfileError>;
}

/// 内存实现，用于测试与命令行
#[derive(Clone, Default)]
pub struct MemoryProfileSink {
    users: Arc<Mutex<HashMap<String, UserProfile>>>,
}

impl MemoryProfileSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user_id: &str) {
        if let Ok(mut users) = self.users.lock() {
            users.entry(user_id.to_string()).or_default();
        }
    }

    pub fn get(&self, user_id: &str) -> Option<UserProfile> {
        self.users.lock().ok()?.get(user_id).cloned()
    }
}

impl ProfileSink for MemoryProfileSink {
    fn apply(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserProfile, ProfileError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| ProfileError::Storage(e.to_string()))?;

        let profile = users
            .get_mut(user_id)
            .ok_or_else(|| ProfileError::UserNotFound(user_id.to_string()))?;
        profile.apply(update);
        Ok(profile.clone())
    }
}
