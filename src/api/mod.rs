//! Boundary to the Sapphire Trails REST server.

pub use client::*;
pub use payload::*;

mod client;
mod payload;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::ApiError;
use crate::models::{
    ApiUser, BookingRequest, Location, NewUser, SessionUser, TourPackage, UserUpdate,
};

/// Body the server sends back from mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiReply {
    pub message: Option<String>,
    pub id: Option<Value>,
    pub slug: Option<String>,
}

impl ApiReply {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn id_i64(&self) -> Option<i64> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Every call the site makes to the REST server.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_locations(&self) -> Result<Vec<Location>, ApiError>;
    async fn get_location(&self, slug: &str) -> Result<Location, ApiError>;
    async fn create_location(&self, payload: MultipartPayload) -> Result<ApiReply, ApiError>;
    async fn update_location(
        &self,
        slug: &str,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError>;
    async fn add_location_gallery_image(
        &self,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError>;

    async fn list_tours(&self) -> Result<Vec<TourPackage>, ApiError>;
    async fn get_tour(&self, id: i64) -> Result<TourPackage, ApiError>;
    async fn get_tour_by_slug(&self, slug: &str) -> Result<TourPackage, ApiError>;
    async fn create_tour(&self, payload: MultipartPayload) -> Result<ApiReply, ApiError>;
    async fn update_tour(&self, id: i64, payload: MultipartPayload) -> Result<ApiReply, ApiError>;
    async fn update_experience_image(
        &self,
        image_id: i64,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError>;
    async fn delete_experience_image(&self, image_id: i64) -> Result<(), ApiError>;

    async fn create_booking(&self, request: &BookingRequest) -> Result<ApiReply, ApiError>;

    async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError>;
    async fn create_user(&self, user: &NewUser) -> Result<ApiReply, ApiError>;
    async fn get_user(&self, id: &str) -> Result<ApiUser, ApiError>;
    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<ApiReply, ApiError>;
    async fn list_admin_users(&self) -> Result<Vec<ApiUser>, ApiError>;
    async fn delete_user(&self, id: &str) -> Result<(), ApiError>;
}
