#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;

use sapphire_trails::api::{ApiReply, Backend, MultipartPayload, Upload};
use sapphire_trails::common::ApiError;
use sapphire_trails::db::Database;
use sapphire_trails::models::*;

pub const FAKE_PASSWORD: &str = "Correct-Horse-9";

/// In-memory store with the migrations applied. One connection that never
/// expires, so every query sees the same database.
pub async fn memory_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");
    db
}

pub fn jpeg(name: &str) -> Upload {
    Upload::new(name, "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0])
}

/// Backend double: answers from canned data, records every call in order
/// and fails the calls named in `failing`.
#[derive(Default)]
pub struct FakeBackend {
    pub locations: Mutex<Vec<Location>>,
    pub tours: Mutex<Vec<TourPackage>>,
    pub users: Mutex<Vec<SessionUser>>,
    pub calls: Mutex<Vec<String>>,
    pub payloads: Mutex<Vec<(String, MultipartPayload)>>,
    pub created_users: Mutex<Vec<NewUser>>,
    pub bookings: Mutex<Vec<BookingRequest>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: SessionUser) -> Self {
        self.users.lock().unwrap().push(user);
        self
    }

    pub fn with_tour(self, tour: TourPackage) -> Self {
        self.tours.lock().unwrap().push(tour);
        self
    }

    pub fn fail(&self, call: &'static str) {
        self.failing.lock().unwrap().insert(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn payloads_for(&self, call: &str) -> Vec<MultipartPayload> {
        self.payloads
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == call)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    fn record(&self, call: &'static str, detail: impl std::fmt::Display) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(format!("{call} {detail}"));
        if self.failing.lock().unwrap().contains(call) {
            return Err(ApiError::Http {
                status: 500,
                message: Some(format!("{call} rejected")),
            });
        }
        Ok(())
    }

    fn record_payload(
        &self,
        call: &'static str,
        detail: impl std::fmt::Display,
        payload: MultipartPayload,
    ) -> Result<(), ApiError> {
        self.payloads
            .lock()
            .unwrap()
            .push((call.to_string(), payload));
        self.record(call, detail)
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Http {
        status: 404,
        message: Some(format!("{what} not found")),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_locations(&self) -> Result<Vec<Location>, ApiError> {
        self.record("list_locations", "")?;
        Ok(self.locations.lock().unwrap().clone())
    }

    async fn get_location(&self, slug: &str) -> Result<Location, ApiError> {
        self.record("get_location", slug)?;
        self.locations
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.slug == slug)
            .cloned()
            .ok_or_else(|| not_found("Location"))
    }

    async fn create_location(&self, payload: MultipartPayload) -> Result<ApiReply, ApiError> {
        let slug = payload.text_value("slug").unwrap_or_default().to_string();
        self.record_payload("create_location", &slug, payload)?;
        Ok(ApiReply {
            slug: Some(slug),
            ..ApiReply::with_message("Location created successfully")
        })
    }

    async fn update_location(
        &self,
        slug: &str,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError> {
        self.record_payload("update_location", slug, payload)?;
        Ok(ApiReply::with_message("Location updated successfully"))
    }

    async fn add_location_gallery_image(
        &self,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError> {
        let order = payload.text_value("sort_order").unwrap_or_default().to_string();
        self.record_payload("add_location_gallery_image", order, payload)?;
        Ok(ApiReply::default())
    }

    async fn list_tours(&self) -> Result<Vec<TourPackage>, ApiError> {
        self.record("list_tours", "")?;
        Ok(self.tours.lock().unwrap().clone())
    }

    async fn get_tour(&self, id: i64) -> Result<TourPackage, ApiError> {
        self.record("get_tour", id)?;
        self.tours
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == Some(id))
            .cloned()
            .ok_or_else(|| not_found("Tour package"))
    }

    async fn get_tour_by_slug(&self, slug: &str) -> Result<TourPackage, ApiError> {
        self.record("get_tour_by_slug", slug)?;
        self.tours
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.slug == slug)
            .cloned()
            .ok_or_else(|| not_found("Tour package"))
    }

    async fn create_tour(&self, payload: MultipartPayload) -> Result<ApiReply, ApiError> {
        self.record_payload("create_tour", "", payload)?;
        Ok(ApiReply {
            id: Some(serde_json::json!(41)),
            ..ApiReply::default()
        })
    }

    async fn update_tour(&self, id: i64, payload: MultipartPayload) -> Result<ApiReply, ApiError> {
        self.record_payload("update_tour", id, payload)?;
        Ok(ApiReply::with_message("Tour package updated successfully"))
    }

    async fn update_experience_image(
        &self,
        image_id: i64,
        payload: MultipartPayload,
    ) -> Result<ApiReply, ApiError> {
        self.record_payload("update_experience_image", image_id, payload)?;
        Ok(ApiReply::with_message("Image updated"))
    }

    async fn delete_experience_image(&self, image_id: i64) -> Result<(), ApiError> {
        self.record("delete_experience_image", image_id)
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<ApiReply, ApiError> {
        self.record("create_booking", request.tour_package_id)?;
        self.bookings.lock().unwrap().push(request.clone());
        Ok(ApiReply::with_message("Booking created"))
    }

    async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        self.record("login", email)?;
        let users = self.users.lock().unwrap();
        match users.iter().find(|u| u.email == email) {
            Some(user) if password == FAKE_PASSWORD => Ok(user.clone()),
            _ => Err(ApiError::Http {
                status: 401,
                message: Some("Invalid email or password".to_string()),
            }),
        }
    }

    async fn create_user(&self, user: &NewUser) -> Result<ApiReply, ApiError> {
        self.record("create_user", &user.email)?;
        self.created_users.lock().unwrap().push(user.clone());
        Ok(ApiReply::default())
    }

    async fn get_user(&self, id: &str) -> Result<ApiUser, ApiError> {
        self.record("get_user", id)?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| ApiUser {
                id: u.id.clone(),
                name: u.name.clone(),
                email: u.email.clone(),
                phone: u.phone.clone(),
                user_type: "user".to_string(),
            })
            .ok_or_else(|| not_found("User"))
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<ApiReply, ApiError> {
        let detail = serde_json::to_string(update).unwrap_or_default();
        self.record("update_user", format!("{id} {detail}"))?;
        Ok(ApiReply::with_message("Profile updated"))
    }

    async fn list_admin_users(&self) -> Result<Vec<ApiUser>, ApiError> {
        self.record("list_admin_users", "")?;
        Ok(Vec::new())
    }

    async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.record("delete_user", id)
    }
}

pub fn seed_user() -> SessionUser {
    SessionUser {
        id: "17".to_string(),
        name: "Ayesha Fernando".to_string(),
        email: "ayesha@example.com".to_string(),
        phone: "+94 77 123 4567".to_string(),
        ..Default::default()
    }
}

fn highlight(i: u32, icon: Icon, title: &str) -> Highlight {
    Highlight {
        id: Some(100 + i as i64),
        icon,
        title: title.to_string(),
        description: format!("{title} with a local guide."),
        sort_order: i,
    }
}

pub fn seed_location() -> Location {
    Location {
        id: Some(3),
        slug: "sinharaja-rainforest".to_string(),
        title: "Sinharaja Rainforest".to_string(),
        subtitle: "A UNESCO lowland rainforest".to_string(),
        card_description: "Endemic birds and misty canopy walks.".to_string(),
        card_image: "/uploads/sinharaja-card.jpg".to_string(),
        hero_image: "/uploads/sinharaja-hero.jpg".to_string(),
        intro_title: "Into the forest".to_string(),
        intro_description: "Sinharaja is the last viable primary rainforest in Sri Lanka."
            .to_string(),
        intro_image: "/uploads/sinharaja-intro.jpg".to_string(),
        map_embed_url: "https://www.google.com/maps/embed?pb=sinharaja".to_string(),
        gallery_images: (1..=4)
            .map(|i| LocationGalleryImage {
                id: Some(20 + i as i64),
                image_url: format!("/uploads/sinharaja-{i}.jpg"),
                alt_text: format!("Sinharaja view {i}"),
                hint: String::new(),
                is_360: i == 4,
                sort_order: i,
            })
            .collect(),
        highlights: vec![
            highlight(1, Icon::Bird, "Endemic birds"),
            highlight(2, Icon::Trees, "Canopy walks"),
            highlight(3, Icon::Waves, "Forest streams"),
            highlight(4, Icon::Camera, "Photography"),
        ],
        visitor_info: (1..=4)
            .map(|i| VisitorInfo {
                id: Some(200 + i as i64),
                icon: Icon::Info,
                title: format!("Tip {i}"),
                description: "Bring leech socks.".to_string(),
                sort_order: i,
            })
            .collect(),
        nearby_attractions: (1..=3)
            .map(|i| NearbyAttraction {
                id: Some(300 + i as i64),
                name: format!("Nearby place {i}"),
                description: "A short drive away.".to_string(),
                image_url: format!("/uploads/nearby-{i}.jpg"),
                image_hint: String::new(),
                sort_order: i,
            })
            .collect(),
        ..Default::default()
    }
}

pub fn seed_tour() -> TourPackage {
    TourPackage {
        id: Some(8),
        slug: "yala-safari".to_string(),
        homepage_title: "Yala Safari".to_string(),
        homepage_description: "Leopards at dawn.".to_string(),
        homepage_image: "/uploads/yala-card.jpg".to_string(),
        title: "Yala Leopard Safari".to_string(),
        duration: "1 day".to_string(),
        price: "$135".to_string(),
        price_suffix: "per person".to_string(),
        description: "A full day in Yala National Park with an expert tracker.".to_string(),
        hero_image: "/uploads/yala-hero.jpg".to_string(),
        highlights: vec![
            highlight(1, Icon::Camera, "Leopards"),
            highlight(2, Icon::Sun, "Sunrise drive"),
            highlight(3, Icon::Utensils, "Picnic breakfast"),
        ],
        inclusions: vec![
            Inclusion {
                id: Some(51),
                text: "Jeep and tracker".to_string(),
                sort_order: 1,
            },
            Inclusion {
                id: Some(52),
                text: "Park fees".to_string(),
                sort_order: 2,
            },
        ],
        itinerary: vec![ItineraryStep {
            id: Some(61),
            time: "05:00".to_string(),
            title: "Pickup".to_string(),
            description: "From your hotel in Tissamaharama.".to_string(),
            sort_order: 1,
        }],
        experience_gallery: vec![
            ExperienceImage {
                id: Some(71),
                src: "/uploads/yala-1.jpg".to_string(),
                alt_text: "Leopard on a rock".to_string(),
                hint: String::new(),
                sort_order: 1,
            },
            ExperienceImage {
                id: Some(72),
                src: "/uploads/yala-2.jpg".to_string(),
                alt_text: "Elephants".to_string(),
                hint: String::new(),
                sort_order: 2,
            },
        ],
        ..Default::default()
    }
}
