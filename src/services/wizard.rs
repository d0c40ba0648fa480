//! Multi-step form controller.
//!
//! A wizard is an ordered list of steps over a single form. Each step owns a
//! subset of the form's field paths; advancing validates only those fields,
//! submitting validates everything. Field values and pending uploads are
//! kept apart ([`FormState`]) and only merged into a request at submit time.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::api::Upload;
use crate::common::{FieldErrors, validate_email, validate_slug, validate_url};
use crate::services::pricing::parse_display_price;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    TextArea,
    Url,
    Email,
    Number,
    Date,
    File,
    Icon,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Url,
    Slug,
    Email,
    PositiveNumber,
    Date,
    /// Display price that must contain a number.
    Price,
    /// A pending upload or an already stored URL.
    Upload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub path: String,
    pub label: String,
    pub input: InputKind,
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, label: impl Into<String>, input: InputKind) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            input,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    pub fn is_required(&self) -> bool {
        self.rules
            .iter()
            .any(|r| matches!(r, Rule::Required | Rule::Upload))
    }

    fn check(&self, state: &FormState) -> Option<String> {
        let value = state.value(&self.path);
        let label = &self.label;

        for rule in &self.rules {
            let failed = match rule {
                Rule::Required => value.is_empty(),
                Rule::Upload => value.is_empty() && state.upload(&self.path).is_none(),
                _ if value.is_empty() => false,
                Rule::MinLength(min) => value.chars().count() < *min,
                Rule::MaxLength(max) => value.chars().count() > *max,
                Rule::Url => !validate_url(value),
                Rule::Slug => !validate_slug(value),
                Rule::Email => !validate_email(value),
                Rule::PositiveNumber => !value.parse::<f64>().is_ok_and(|n| n > 0.0),
                Rule::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err(),
                Rule::Price => parse_display_price(value).is_none(),
            };

            if failed {
                return Some(match rule {
                    Rule::Required => format!("{label} is required"),
                    Rule::Upload => format!("Upload an image for {label}"),
                    Rule::MinLength(min) => format!("{label} must be at least {min} characters"),
                    Rule::MaxLength(max) => format!("{label} must be at most {max} characters"),
                    Rule::Url => format!("Enter a valid URL for {label}"),
                    Rule::Slug => {
                        format!("{label} may only contain lowercase letters, numbers and hyphens")
                    }
                    Rule::Email => "Enter a valid email address".to_string(),
                    Rule::PositiveNumber => format!("{label} must be a positive number"),
                    Rule::Date => format!("{label} must be a valid date"),
                    Rule::Price => format!("{label} must contain an amount, e.g. $135"),
                });
            }
        }

        None
    }
}

/// The whole form's field list, in display order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.path == path)
    }

    pub fn fields_for<'a>(&'a self, step: &'a StepDef) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields.iter().filter(move |f| step.owns(&f.path))
    }

    /// Validates the fields accepted by `filter`.
    pub fn validate_where<F>(&self, state: &FormState, filter: F) -> FieldErrors
    where
        F: Fn(&FieldSpec) -> bool,
    {
        let mut errors = FieldErrors::new();
        for field in self.fields.iter().filter(|f| filter(f)) {
            if let Some(message) = field.check(state) {
                errors.insert(field.path.clone(), message);
            }
        }
        errors
    }

    pub fn validate(&self, state: &FormState) -> Result<(), FieldErrors> {
        self.validate_where(state, |_| true).into_result()
    }

    /// Copies a step's posted values into the form. Fields the step owns but
    /// the post omits (unchecked boxes, cleared inputs) become empty; file
    /// fields keep their stored URL unless a new file was posted.
    pub fn merge_step(
        &self,
        step: &StepDef,
        state: &mut FormState,
        posted: &BTreeMap<String, String>,
        uploads: BTreeMap<String, Upload>,
    ) {
        for field in self.fields_for(step) {
            if field.input == InputKind::File {
                continue;
            }
            let value = posted
                .get(&field.path)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            state.set(field.path.clone(), value);
        }

        for (path, upload) in uploads {
            let accepted = self
                .field(&path)
                .is_some_and(|f| f.input == InputKind::File && step.owns(&path));
            if accepted && !upload.is_empty() {
                state.set_upload(path, upload);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDef {
    pub id: &'static str,
    pub title: &'static str,
    /// Field paths (or path prefixes) the step owns.
    pub prefixes: &'static [&'static str],
}

impl StepDef {
    pub fn owns(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path == *prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// Validated metadata plus the parallel map of files waiting for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: BTreeMap<String, String>,
    uploads: BTreeMap<String, Upload>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, path: &str) -> &str {
        self.values.get(path).map(|v| v.trim()).unwrap_or_default()
    }

    pub fn opt_value(&self, path: &str) -> Option<&str> {
        Some(self.value(path)).filter(|v| !v.is_empty())
    }

    pub fn flag(&self, path: &str) -> bool {
        matches!(self.value(path), "1" | "true" | "on" | "yes")
    }

    pub fn id(&self, path: &str) -> Option<i64> {
        self.value(path).parse().ok()
    }

    pub fn set(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.values.insert(path.into(), value.into());
    }

    pub fn upload(&self, path: &str) -> Option<&Upload> {
        self.uploads.get(path)
    }

    pub fn set_upload(&mut self, path: impl Into<String>, upload: Upload) {
        self.uploads.insert(path.into(), upload);
    }

    pub fn take_upload(&mut self, path: &str) -> Option<Upload> {
        self.uploads.remove(path)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

/// Step index over a fixed list of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardController {
    steps: &'static [StepDef],
    index: usize,
}

impl WizardController {
    pub fn new(steps: &'static [StepDef]) -> Self {
        Self { steps, index: 0 }
    }

    pub fn steps(&self) -> &'static [StepDef] {
        self.steps
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'static StepDef {
        &self.steps[self.index]
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.steps.len()
    }

    pub fn step_of(&self, path: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.owns(path))
    }

    /// Validates the current step's fields only; advances on success.
    pub fn go_next(&mut self, schema: &Schema, state: &FormState) -> Result<usize, FieldErrors> {
        let step = self.current();
        schema
            .validate_where(state, |field| step.owns(&field.path))
            .into_result()?;

        if !self.is_last() {
            self.index += 1;
        }
        Ok(self.index)
    }

    pub fn go_prev(&mut self) -> usize {
        self.index = self.index.saturating_sub(1);
        self.index
    }

    /// Full validation before submit. On failure the controller moves to the
    /// step owning the first failing field.
    pub fn validate_all(&mut self, schema: &Schema, state: &FormState) -> Result<(), FieldErrors> {
        schema.validate(state).inspect_err(|errors| {
            if let Some(index) = errors.first_path().and_then(|p| self.step_of(p)) {
                self.index = index;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEPS: &[StepDef] = &[
        StepDef {
            id: "basics",
            title: "Basics",
            prefixes: &["title", "slug"],
        },
        StepDef {
            id: "media",
            title: "Media",
            prefixes: &["cover", "gallery"],
        },
        StepDef {
            id: "contact",
            title: "Contact",
            prefixes: &["email"],
        },
    ];

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::new("title", "Title", InputKind::Text).required(),
            FieldSpec::new("slug", "Slug", InputKind::Text)
                .required()
                .rule(Rule::Slug),
            FieldSpec::new("cover", "Cover image", InputKind::File).rule(Rule::Upload),
            FieldSpec::new("gallery.0.alt", "Alt text", InputKind::Text).required(),
            FieldSpec::new("email", "Email", InputKind::Email)
                .required()
                .rule(Rule::Email),
        ])
    }

    fn jpeg() -> Upload {
        Upload::new("cover.jpg", "image/jpeg", vec![0xff, 0xd8])
    }

    #[test]
    fn go_next_does_not_advance_with_empty_required_field() {
        let mut wizard = WizardController::new(STEPS);
        let mut state = FormState::new();
        state.set("slug", "ella");

        let errors = wizard.go_next(&schema(), &state).unwrap_err();
        assert_eq!(wizard.index(), 0);
        assert_eq!(errors.first_path(), Some("title"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn go_next_ignores_fields_of_other_steps() {
        let mut wizard = WizardController::new(STEPS);
        let mut state = FormState::new();
        state.set("title", "Ella");
        state.set("slug", "ella");

        assert_eq!(wizard.go_next(&schema(), &state), Ok(1));
    }

    #[test]
    fn upload_rule_accepts_pending_file_or_stored_url() {
        let mut wizard = WizardController::new(STEPS);
        let mut state = FormState::new();
        state.set("title", "Ella");
        state.set("slug", "ella");
        state.set("gallery.0.alt", "View");
        wizard.go_next(&schema(), &state).unwrap();

        let errors = wizard.go_next(&schema(), &state).unwrap_err();
        assert_eq!(errors.get("cover"), Some("Upload an image for Cover image"));

        state.set_upload("cover", jpeg());
        assert_eq!(wizard.go_next(&schema(), &state), Ok(2));

        let mut stored = state.clone();
        stored.take_upload("cover");
        stored.set("cover", "https://cdn.example.com/cover.jpg");
        let mut again = WizardController::new(STEPS);
        again.go_next(&schema(), &stored).unwrap();
        assert_eq!(again.go_next(&schema(), &stored), Ok(2));
    }

    #[test]
    fn go_next_and_go_prev_stop_at_the_ends() {
        let mut wizard = WizardController::new(STEPS);
        assert_eq!(wizard.go_prev(), 0);

        let mut state = FormState::new();
        state.set("title", "Ella");
        state.set("slug", "ella");
        state.set("gallery.0.alt", "View");
        state.set("cover", "/c.jpg");
        state.set("email", "hi@ella.lk");

        wizard.go_next(&schema(), &state).unwrap();
        wizard.go_next(&schema(), &state).unwrap();
        assert!(wizard.is_last());
        assert_eq!(wizard.go_next(&schema(), &state), Ok(2));
        assert_eq!(wizard.go_prev(), 1);
    }

    #[test]
    fn validate_all_jumps_to_step_of_first_error() {
        let mut wizard = WizardController::new(STEPS);
        let mut state = FormState::new();
        state.set("title", "Ella");
        state.set("slug", "ella");
        state.set("gallery.0.alt", "View");
        state.set("cover", "/c.jpg");
        state.set("email", "not-an-email");

        let errors = wizard.validate_all(&schema(), &state).unwrap_err();
        assert_eq!(errors.first_path(), Some("email"));
        assert_eq!(wizard.index(), 2);
    }

    #[test]
    fn optional_rules_only_apply_to_filled_values() {
        let schema = Schema::new(vec![
            FieldSpec::new("link", "Link", InputKind::Url).rule(Rule::Url),
        ]);
        let mut state = FormState::new();
        assert!(schema.validate(&state).is_ok());

        state.set("link", "not a url");
        assert!(schema.validate(&state).is_err());
    }

    #[test]
    fn merge_step_clears_omitted_fields_and_keeps_stored_files() {
        let schema = schema();
        let mut state = FormState::new();
        state.set("title", "Old");
        state.set("cover", "/stored.jpg");
        state.set("email", "keep@ella.lk");

        let mut posted = BTreeMap::new();
        posted.insert("slug".to_string(), " ella ".to_string());
        schema.merge_step(&STEPS[0], &mut state, &posted, BTreeMap::new());

        assert_eq!(state.value("title"), "");
        assert_eq!(state.value("slug"), "ella");
        assert_eq!(state.value("email"), "keep@ella.lk");

        let mut uploads = BTreeMap::new();
        uploads.insert("cover".to_string(), jpeg());
        uploads.insert("email".to_string(), jpeg());
        schema.merge_step(&STEPS[1], &mut state, &BTreeMap::new(), uploads);

        assert_eq!(state.value("cover"), "/stored.jpg");
        assert!(state.upload("cover").is_some());
        assert!(state.upload("email").is_none());
    }

    #[test]
    fn step_ownership_matches_whole_segments() {
        let step = StepDef {
            id: "s",
            title: "S",
            prefixes: &["card_image"],
        };
        assert!(step.owns("card_image"));
        assert!(step.owns("card_image.0"));
        assert!(!step.owns("card_image_hint"));
    }
}
