use serde::{Deserialize, Serialize};

use crate::common::FieldErrors;

/// Homepage and footer copy edited through the admin CMS page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsContent {
    pub hero: HeroCopy,
    pub discover: DiscoverCopy,
    pub footer: FooterCopy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroCopy {
    pub title: String,
    pub subtitle: String,
    pub cta_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverCopy {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterCopy {
    pub tagline: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Default for HeroCopy {
    fn default() -> Self {
        Self {
            title: "Discover the Jewel of the Indian Ocean".into(),
            subtitle: "Curated journeys through Sri Lanka's rainforests, highlands and coast."
                .into(),
            cta_label: "Explore Tours".into(),
        }
    }
}

impl Default for DiscoverCopy {
    fn default() -> Self {
        Self {
            title: "Discover Sri Lanka with Sapphire Trails".into(),
            description: "From misty tea country to ancient citadels, our local guides take you \
                          beyond the guidebook."
                .into(),
        }
    }
}

impl Default for FooterCopy {
    fn default() -> Self {
        Self {
            tagline: "Journeys crafted with care.".into(),
            address: "Colombo, Sri Lanka".into(),
            phone: "+94 11 234 5678".into(),
            email: "hello@sapphiretrails.lk".into(),
        }
    }
}

impl CmsContent {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let required = [
            ("hero.title", &self.hero.title, "Hero title is required"),
            ("hero.cta_label", &self.hero.cta_label, "Button label is required"),
            ("discover.title", &self.discover.title, "Discover title is required"),
            ("footer.email", &self.footer.email, "Contact email is required"),
        ];
        for (path, value, message) in required {
            if value.trim().is_empty() {
                errors.insert(path, message);
            }
        }
        if !self.footer.email.trim().is_empty()
            && !crate::common::validate_email(&self.footer.email)
        {
            errors.insert("footer.email", "Enter a valid email address");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CmsContent::default().validate().is_ok());
    }

    #[test]
    fn partial_blob_fills_missing_sections_with_defaults() {
        let cms: CmsContent = serde_json::from_str(r#"{"hero":{"title":"Hello"}}"#).unwrap();
        assert_eq!(cms.hero.title, "Hello");
        assert_eq!(cms.hero.cta_label, HeroCopy::default().cta_label);
        assert_eq!(cms.footer, FooterCopy::default());
    }

    #[test]
    fn blank_title_is_reported() {
        let mut cms = CmsContent::default();
        cms.hero.title = " ".into();
        let errors = cms.validate().unwrap_err();
        assert_eq!(errors.first_path(), Some("hero.title"));
    }
}
