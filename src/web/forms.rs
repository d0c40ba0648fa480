use serde::Deserialize;

use sapphire_trails::common::{FieldErrors, validate_email};
use sapphire_trails::models::{CmsContent, DiscoverCopy, FooterCopy, HeroCopy, UserUpdate};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct AuthQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LogoutForm {
    /// Path the visitor was on when they pressed "log out".
    #[serde(default)]
    pub from: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name", "Name is required");
        }
        if !validate_email(&self.email) {
            errors.insert("email", "Enter a valid email address");
        }
        if self.message.trim().chars().count() < 10 {
            errors.insert("message", "Message must be at least 10 characters");
        }
        errors.into_result()
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
}

impl ProfileForm {
    /// Only fields that differ from the stored values are sent.
    pub fn changes(&self, name: &str, phone: &str) -> UserUpdate {
        let changed = |posted: &str, current: &str| {
            let posted = posted.trim();
            (posted != current.trim()).then(|| posted.to_string())
        };
        UserUpdate {
            name: changed(&self.name, name),
            phone: changed(&self.phone, phone),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CmsForm {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_cta_label: String,
    pub discover_title: String,
    pub discover_description: String,
    pub footer_tagline: String,
    pub footer_address: String,
    pub footer_phone: String,
    pub footer_email: String,
}

impl CmsForm {
    pub fn into_content(self) -> CmsContent {
        let t = |s: String| s.trim().to_string();
        CmsContent {
            hero: HeroCopy {
                title: t(self.hero_title),
                subtitle: t(self.hero_subtitle),
                cta_label: t(self.hero_cta_label),
            },
            discover: DiscoverCopy {
                title: t(self.discover_title),
                description: t(self.discover_description),
            },
            footer: FooterCopy {
                tagline: t(self.footer_tagline),
                address: t(self.footer_address),
                phone: t(self.footer_phone),
                email: t(self.footer_email),
            },
        }
    }
}

#[derive(Deserialize)]
pub struct BookingStatusForm {
    pub status: String,
}

#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

/// New server-side admin account.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AdminUserForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// New local admin-panel account.
#[derive(Deserialize)]
pub struct LocalAdminForm {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// `?resume=1` marks the redirect after a wizard step; any other visit to a
/// wizard page starts over.
#[derive(Deserialize)]
pub struct WizardQuery {
    pub resume: Option<String>,
}

impl WizardQuery {
    pub fn resumes(&self) -> bool {
        self.resume.is_some()
    }
}

#[derive(Deserialize)]
pub struct BookingQuery {
    pub tour: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_changes_skip_unchanged_fields() {
        let form = ProfileForm {
            name: " Nimal Perera ".into(),
            phone: "0771234567".into(),
        };
        let update = form.changes("Nimal Perera", "0712345678");
        assert_eq!(update.name, None);
        assert_eq!(update.phone.as_deref(), Some("0771234567"));
    }

    #[test]
    fn contact_form_requires_a_real_message() {
        let form = ContactForm {
            name: "Ayesha".into(),
            email: "ayesha@example.com".into(),
            subject: String::new(),
            message: "Hi".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.first_path(), Some("message"));
    }

    #[test]
    fn cms_form_trims_every_field() {
        let form = CmsForm {
            hero_title: "  Sapphire Trails ".into(),
            ..Default::default()
        };
        assert_eq!(form.into_content().hero.title, "Sapphire Trails");
    }
}
