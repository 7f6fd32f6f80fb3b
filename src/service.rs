//! 上传接口：请求检查、流水线、资料更新，以及返回给路由层的状态码与信息

use crate::pipeline::{Extraction, Pipeline, Rejection};
use crate::storage::{ProfileError, ProfileSink, ProfileUpdate, UploadedArtifact};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 返回给客户端的资料字段，不包含证件号码
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileView>,
}

impl UploadResponse {
    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            user: None,
        }
    }
}

impl From<&Rejection> for UploadResponse {
    fn from(rejection: &Rejection) -> Self {
        Self::error(rejection.status_code(), rejection.user_message())
    }
}

pub struct UploadHandler<S: ProfileSink> {
    pipeline: Arc<Pipeline>,
    profiles: S,
}

impl<S: ProfileSink> UploadHandler<S> {
    pub fn new(pipeline: Arc<Pipeline>, profiles: S) -> Self {
        Self { pipeline, profiles }
    }

    /// 处理一次上传请求；无论结果如何，上传文件都会被删除
    pub async fn handle(
        &self,
        user_id: Option<&str>,
        artifact: Option<UploadedArtifact>,
    ) -> UploadResponse {
        let user_id = match user_id {
            Some(id) => id,
            None => return UploadResponse::error(401, "Unauthorized."),
        };

        let artifact = match artifact {
            Some(artifact) => artifact,
            None => return UploadResponse::from(&Rejection::NoFile),
        };

        match self.pipeline.clone().process_upload_async(artifact).await {
            Ok(extraction) => self.store(user_id, &extraction),
            Err(rejection) => UploadResponse::from(&rejection),
        }
    }

    fn store(&self, user_id: &str, extraction: &Extraction) -> UploadResponse {
        let update = ProfileUpdate::from_fields(&extraction.fields);

        match self.profiles.apply(user_id, &update) {
            Ok(profile) => {
                info!("Stored {} identity for user {}", extraction.format, user_id);
                UploadResponse {
                    status: 200,
                    message: "Aadhaar details verified and saved.".to_string(),
                    user: Some(ProfileView {
                        name: profile.name,
                        address: profile.address,
                    }),
                }
            }
            Err(ProfileError::UserNotFound(_)) => UploadResponse::error(404, "User not found."),
            Err(e) => {
                error!("Profile update failed for user {}: {}", user_id, e);
                UploadResponse::from(&Rejection::Internal(e.to_string()))
            }
        }
    }
}
