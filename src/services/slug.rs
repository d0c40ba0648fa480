/// Lowercases and turns every run of non-alphanumeric characters into a
/// single hyphen. Leading and trailing hyphens are dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Keeps a slug in step with its title until the user edits the slug by
/// hand. Clearing the slug hands control back to the title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlugTracker {
    slug: String,
    manual: bool,
}

impl SlugTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing records keep their slug regardless of title edits.
    pub fn from_existing(slug: &str) -> Self {
        Self {
            slug: slug.trim().to_string(),
            manual: !slug.trim().is_empty(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn on_title_change(&mut self, title: &str) {
        if !self.manual {
            self.slug = slugify(title);
        }
    }

    pub fn on_slug_edit(&mut self, slug: &str) {
        let slug = slug.trim();
        self.manual = !slug.is_empty();
        self.slug = slug.to_string();
    }

    /// Applies one posted form: a slug differing from the tracked one is a
    /// manual edit, then the title is applied. Returns the resulting slug.
    pub fn apply(&mut self, title: &str, posted_slug: &str) -> &str {
        if posted_slug.trim() != self.slug {
            self.on_slug_edit(posted_slug);
        }
        self.on_title_change(title);
        &self.slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Sinharaja Rainforest"), "sinharaja-rainforest");
        assert_eq!(slugify("  Ella -- Highlands!  "), "ella-highlands");
        assert_eq!(slugify("Yala: Leopards & Elephants"), "yala-leopards-elephants");
        assert_eq!(slugify("Nine   Arch_Bridge"), "nine-arch-bridge");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_output_is_a_valid_slug() {
        for title in ["Adam's Peak", "Dambulla (Cave Temple)", "-Sigiriya-", "Galle Fort 2024", "Mirissa  Whales"] {
            assert!(crate::common::validate_slug(&slugify(title)), "{title}");
        }
    }

    #[test]
    fn tracker_follows_title_until_manual_edit() {
        let mut tracker = SlugTracker::new();
        tracker.on_title_change("Knuckles Range");
        assert_eq!(tracker.slug(), "knuckles-range");

        tracker.on_slug_edit("knuckles");
        tracker.on_title_change("Knuckles Mountain Range");
        assert_eq!(tracker.slug(), "knuckles");
        assert!(tracker.is_manual());

        tracker.on_slug_edit("  ");
        tracker.on_title_change("Knuckles Mountain Range");
        assert_eq!(tracker.slug(), "knuckles-mountain-range");
    }

    #[test]
    fn apply_treats_unchanged_slug_as_derived() {
        let mut tracker = SlugTracker::new();
        assert_eq!(tracker.apply("Horton Plains", ""), "horton-plains");
        assert_eq!(tracker.apply("Horton Plains Park", "horton-plains"), "horton-plains-park");
        assert_eq!(tracker.apply("Horton Plains Park", "worlds-end"), "worlds-end");
        assert_eq!(tracker.apply("Something Else", "worlds-end"), "worlds-end");
    }

    #[test]
    fn existing_slug_is_not_overwritten() {
        let mut tracker = SlugTracker::from_existing("ella");
        tracker.on_title_change("Ella Rock Trek");
        assert_eq!(tracker.slug(), "ella");
    }
}
