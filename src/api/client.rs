use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{ApiReply, Backend, MultipartPayload, Part};
use crate::common::ApiError;
use crate::models::de::Envelope;
use crate::models::{
    ApiUser, BookingRequest, Location, NewUser, SessionUser, TourPackage, UserUpdate,
};

/// Pulls the human-readable message out of an error body, if any.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

/// reqwest-backed client for the REST server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sapphire-trails/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        log::debug!("REST server answered {}: {}", status, body);
        Err(ApiError::Http {
            status: status.as_u16(),
            message: server_message(&body),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.send(request).await?.bytes().await?;
        serde_json::from_slice::<Envelope<T>>(&bytes)
            .map(Envelope::into_inner)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn reply(&self, request: RequestBuilder) -> Result<ApiReply, ApiError> {
        let bytes = self.send(request).await?.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiReply::default());
        }
        // Some endpoints answer with plain text on success.
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            ApiReply::with_message(String::from_utf8_lossy(&bytes).trim().to_string())
        }))
    }

    fn form(payload: MultipartPayload) -> Result<reqwest::multipart::Form, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, part) in payload.into_parts() {
            form = match part {
                Part::Text(value) => form.text(name, value),
                Part::File(upload) => {
                    let part = reqwest::multipart::Part::bytes(upload.bytes)
                        .file_name(upload.filename)
                        .mime_str(&upload.content_type)
                        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }

    async fn post_multipart(
        &self,
        path: &str,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError> {
        let form = Self::form(payload)?;
        self.reply(self.http.post(self.url(path)).multipart(form))
            .await
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn list_locations(&self) -> Result<Vec<Location>, ApiError> {
        self.fetch(self.http.get(self.url("locations"))).await
    }

    async fn get_location(&self, slug: &str) -> Result<Location, ApiError> {
        let path = format!("locations/{}", urlencoding::encode(slug));
        self.fetch(self.http.get(self.url(&path))).await
    }

    async fn create_location(&self, payload: MultipartPayload) -> Result<ApiReply, ApiError> {
        self.post_multipart("locations/", payload).await
    }

    async fn update_location(
        &self,
        slug: &str,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError> {
        let path = format!("locations/{}", urlencoding::encode(slug));
        self.post_multipart(&path, payload).await
    }

    async fn add_location_gallery_image(
        &self,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError> {
        self.post_multipart("location-gallery/", payload).await
    }

    async fn list_tours(&self) -> Result<Vec<TourPackage>, ApiError> {
        self.fetch(self.http.get(self.url("tours"))).await
    }

    async fn get_tour(&self, id: i64) -> Result<TourPackage, ApiError> {
        self.fetch(self.http.get(self.url(&format!("tours/{id}"))))
            .await
    }

    async fn get_tour_by_slug(&self, slug: &str) -> Result<TourPackage, ApiError> {
        let path = format!("tours/slug/{}/", urlencoding::encode(slug));
        self.fetch(self.http.get(self.url(&path))).await
    }

    async fn create_tour(&self, payload: MultipartPayload) -> Result<ApiReply, ApiError> {
        self.post_multipart("tours/", payload).await
    }

    async fn update_tour(&self, id: i64, payload: MultipartPayload) -> Result<ApiReply, ApiError> {
        self.post_multipart(&format!("tours/{id}"), payload).await
    }

    async fn update_experience_image(
        &self,
        image_id: i64,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError> {
        self.post_multipart(&format!("tours/experience-gallery/{image_id}"), payload)
            .await
    }

    async fn delete_experience_image(&self, image_id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("experience-gallery/{image_id}"));
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<ApiReply, ApiError> {
        self.reply(self.http.post(self.url("bookings")).json(request))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let value: Value = self
            .fetch(self.http.post(self.url("login")).json(&body))
            .await?;

        // Either the user object itself or `{ "user": {...} }`.
        let user = match value.get("user") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => value,
        };
        serde_json::from_value(user).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn create_user(&self, user: &NewUser) -> Result<ApiReply, ApiError> {
        self.reply(self.http.post(self.url("users")).json(user))
            .await
    }

    async fn get_user(&self, id: &str) -> Result<ApiUser, ApiError> {
        let path = format!("users/{}", urlencoding::encode(id));
        self.fetch(self.http.get(self.url(&path))).await
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<ApiReply, ApiError> {
        let path = format!("users/{}", urlencoding::encode(id));
        self.reply(self.http.put(self.url(&path)).json(update))
            .await
    }

    async fn list_admin_users(&self) -> Result<Vec<ApiUser>, ApiError> {
        self.fetch(self.http.get(self.url("users/type/admin/")))
            .await
    }

    async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("users/{}/", urlencoding::encode(id));
        self.send(self.http.delete(self.url(&path))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_reads_message_then_error() {
        assert_eq!(
            server_message(r#"{"message":"Slug exists"}"#).as_deref(),
            Some("Slug exists")
        );
        assert_eq!(
            server_message(r#"{"error":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(server_message(r#"{"message":"  "}"#), None);
        assert_eq!(server_message("<html>502</html>"), None);
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let client = ApiClient::new("http://localhost/sapphire_trails_server/", Duration::from_secs(5))
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost/sapphire_trails_server");
        assert_eq!(
            client.url("/locations/"),
            "http://localhost/sapphire_trails_server/locations/"
        );
    }
}
