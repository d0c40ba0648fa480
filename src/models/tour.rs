use serde::{Deserialize, Serialize};

use super::de;
use super::location::Highlight;

pub const PACKAGE_HIGHLIGHTS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourPackage {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub slug: String,
    // Homepage card
    pub homepage_title: String,
    pub homepage_description: String,
    pub homepage_image: String,
    pub homepage_image_hint: String,
    // Tour detail
    pub title: String,
    #[serde(deserialize_with = "de::text")]
    pub duration: String,
    #[serde(deserialize_with = "de::text")]
    pub price: String,
    pub price_suffix: String,
    pub description: String,
    pub hero_image: String,
    pub hero_image_hint: String,
    pub booking_link: String,
    #[serde(deserialize_with = "de::list")]
    pub highlights: Vec<Highlight>,
    #[serde(deserialize_with = "de::list")]
    pub inclusions: Vec<Inclusion>,
    #[serde(deserialize_with = "de::list")]
    pub itinerary: Vec<ItineraryStep>,
    #[serde(deserialize_with = "de::list")]
    pub experience_gallery: Vec<ExperienceImage>,
}

impl TourPackage {
    /// Title used on cards and selects; older records only carry one of
    /// the two titles.
    pub fn display_title(&self) -> &str {
        if self.homepage_title.trim().is_empty() {
            &self.title
        } else {
            &self.homepage_title
        }
    }

    pub fn display_price(&self) -> String {
        let price = self.price.trim();
        if self.price_suffix.trim().is_empty() {
            price.to_string()
        } else {
            format!("{} {}", price, self.price_suffix.trim())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inclusion {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    #[serde(alias = "item")]
    pub text: String,
    #[serde(deserialize_with = "de::count")]
    pub sort_order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItineraryStep {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub time: String,
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "de::count")]
    pub sort_order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceImage {
    #[serde(deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    #[serde(alias = "image_url", alias = "image")]
    pub src: String,
    #[serde(alias = "alt")]
    pub alt_text: String,
    pub hint: String,
    #[serde(deserialize_with = "de::count")]
    pub sort_order: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_price_and_string_lists_decode() {
        let json = r#"{
            "id": 12,
            "title": "Ella Highlands",
            "price": 135,
            "price_suffix": "per person",
            "inclusions": "[{\"item\":\"Guide\",\"sort_order\":\"1\"}]",
            "experience_gallery": [{"id":"5","image_url":"/g/1.jpg","sort_order":1}]
        }"#;

        let tour: TourPackage = serde_json::from_str(json).unwrap();
        assert_eq!(tour.price, "135");
        assert_eq!(tour.display_price(), "135 per person");
        assert_eq!(tour.display_title(), "Ella Highlands");
        assert_eq!(tour.inclusions[0].text, "Guide");
        assert_eq!(tour.experience_gallery[0].id, Some(5));
        assert_eq!(tour.experience_gallery[0].src, "/g/1.jpg");
    }
}
