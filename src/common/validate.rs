/// Email validation
pub fn validate_email(email: &str) -> bool {
    let email = email.trim();

    if email.is_empty() || email.len() > 254 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain must have at least one dot
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Slug validation
pub fn validate_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 255 {
        return false;
    }

    // Lowercase alphanumeric and single hyphens, no leading/trailing hyphen
    !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Absolute http(s) URL check, enough for embed and booking links.
pub fn validate_url(url: &str) -> bool {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !rest.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Password validation
pub struct PasswordValidator;

impl PasswordValidator {
    const MIN_LENGTH: usize = 8;

    pub fn validate(password: &str) -> Result<(), String> {
        if password.chars().count() < Self::MIN_LENGTH {
            return Err(format!(
                "Password must be at least {} characters",
                Self::MIN_LENGTH
            ));
        }

        let has_letter = password.chars().any(|c| c.is_alphabetic());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());

        if !has_letter || !has_digit {
            return Err("Password must contain at least one letter and one digit".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_requires_local_part_and_dotted_domain() {
        assert!(validate_email("guest@sapphiretrails.lk"));
        assert!(!validate_email("guest@localhost"));
        assert!(!validate_email("@sapphiretrails.lk"));
        assert!(!validate_email("a@b@c.lk"));
        assert!(!validate_email(""));
    }

    #[test]
    fn slug_rejects_uppercase_and_stray_hyphens() {
        assert!(validate_slug("sinharaja-rainforest"));
        assert!(validate_slug("ella-2"));
        assert!(!validate_slug("Sinharaja"));
        assert!(!validate_slug("-ella"));
        assert!(!validate_slug("ella--rock"));
        assert!(!validate_slug(""));
    }

    #[test]
    fn url_needs_scheme_and_host() {
        assert!(validate_url("https://www.google.com/maps/embed?pb=abc"));
        assert!(validate_url("http://localhost/sapphire_trails_server"));
        assert!(!validate_url("www.google.com"));
        assert!(!validate_url("https://"));
        assert!(!validate_url("https://bad host"));
    }

    #[test]
    fn password_needs_length_letter_and_digit() {
        assert!(PasswordValidator::validate("trails2024").is_ok());
        assert!(PasswordValidator::validate("short1").is_err());
        assert!(PasswordValidator::validate("onlyletters").is_err());
    }
}
