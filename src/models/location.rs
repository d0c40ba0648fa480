use serde::{Deserialize, Serialize};

use super::de;
use super::icon::Icon;

pub const LOCATION_GALLERY_SIZE: usize = 4;
pub const LOCATION_HIGHLIGHTS: usize = 4;
pub const LOCATION_VISITOR_INFO: usize = 4;
pub const LOCATION_NEARBY: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub card_description: String,
    pub card_image: String,
    pub card_image_hint: String,
    pub hero_image: String,
    pub hero_image_hint: String,
    pub intro_title: String,
    pub intro_description: String,
    pub intro_image: String,
    pub intro_image_hint: String,
    pub map_embed_url: String,
    #[serde(deserialize_with = "de::list")]
    pub gallery_images: Vec<LocationGalleryImage>,
    #[serde(deserialize_with = "de::list")]
    pub highlights: Vec<Highlight>,
    #[serde(deserialize_with = "de::list")]
    pub visitor_info: Vec<VisitorInfo>,
    #[serde(deserialize_with = "de::list")]
    pub nearby_attractions: Vec<NearbyAttraction>,
}

impl Location {
    /// Gallery ordered by `sort_order`, the way pages display it.
    pub fn sorted_gallery(&self) -> Vec<&LocationGalleryImage> {
        let mut images: Vec<_> = self.gallery_images.iter().collect();
        images.sort_by_key(|image| image.sort_order);
        images
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationGalleryImage {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    #[serde(alias = "image")]
    pub image_url: String,
    pub alt_text: String,
    pub hint: String,
    #[serde(deserialize_with = "de::flag")]
    pub is_360: bool,
    #[serde(deserialize_with = "de::count")]
    pub sort_order: u32,
}

/// Icon + title + description block; shared by location highlights and
/// tour package highlights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Highlight {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub icon: Icon,
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "de::count")]
    pub sort_order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorInfo {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub icon: Icon,
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "de::count")]
    pub sort_order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearbyAttraction {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    #[serde(alias = "image")]
    pub image_url: String,
    pub image_hint: String,
    #[serde(deserialize_with = "de::count")]
    pub sort_order: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_loosely_typed_server_record() {
        let json = r#"{
            "id": "7",
            "slug": "sinharaja-rainforest",
            "title": "Sinharaja Rainforest",
            "gallery_images": [
                {"id": 3, "image": "/uploads/b.jpg", "is_360": "1", "sort_order": "2"},
                {"id": "2", "image_url": "/uploads/a.jpg", "is_360": 0, "sort_order": 1}
            ],
            "highlights": "[{\"icon\":\"Bird\",\"title\":\"Endemic birds\",\"description\":\"\",\"sort_order\":1}]",
            "visitor_info": null
        }"#;

        let location: Location = serde_json::from_str(json).unwrap();
        assert_eq!(location.id, Some(7));
        assert_eq!(location.highlights.len(), 1);
        assert_eq!(location.highlights[0].icon, Icon::Bird);
        assert!(location.visitor_info.is_empty());
        assert!(location.gallery_images[0].is_360);

        let sorted = location.sorted_gallery();
        assert_eq!(sorted[0].image_url, "/uploads/a.jpg");
        assert_eq!(sorted[1].id, Some(3));
    }
}
