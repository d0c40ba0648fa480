//! Create/edit wizard for locations.

use serde::Serialize;

use super::assembly::{
    SubmitOutcome, attach_image, attach_texts, fill_icon_blocks, icon_block_entries,
    icon_block_fields,
};
use super::wizard::{FieldSpec, FormState, InputKind, Rule, Schema, StepDef};
use crate::api::{Backend, MultipartPayload};
use crate::common::SubmitError;
use crate::models::{
    LOCATION_GALLERY_SIZE, LOCATION_HIGHLIGHTS, LOCATION_NEARBY, LOCATION_VISITOR_INFO, Location,
};

pub const LOCATION_STEPS: &[StepDef] = &[
    StepDef {
        id: "basics",
        title: "Basic details",
        prefixes: &[
            "title",
            "slug",
            "subtitle",
            "card_description",
            "card_image",
            "card_image_hint",
        ],
    },
    StepDef {
        id: "hero",
        title: "Hero & introduction",
        prefixes: &[
            "hero_image",
            "hero_image_hint",
            "intro_title",
            "intro_description",
            "intro_image",
            "intro_image_hint",
        ],
    },
    StepDef {
        id: "gallery",
        title: "Gallery",
        prefixes: &["gallery"],
    },
    StepDef {
        id: "highlights",
        title: "Highlights",
        prefixes: &["highlights"],
    },
    StepDef {
        id: "visitor-info",
        title: "Visitor information",
        prefixes: &["visitor_info"],
    },
    StepDef {
        id: "map",
        title: "Map & nearby attractions",
        prefixes: &["map_embed_url", "nearby"],
    },
];

const TEXT_FIELDS: &[&str] = &[
    "title",
    "slug",
    "subtitle",
    "card_description",
    "card_image_hint",
    "hero_image_hint",
    "intro_title",
    "intro_description",
    "intro_image_hint",
    "map_embed_url",
];

const IMAGE_FIELDS: &[&str] = &["card_image", "hero_image", "intro_image"];

pub fn location_schema() -> Schema {
    use InputKind::*;

    let mut fields = vec![
        FieldSpec::new("title", "Title", Text)
            .required()
            .rule(Rule::MaxLength(120)),
        FieldSpec::new("slug", "Slug", Text).required().rule(Rule::Slug),
        FieldSpec::new("subtitle", "Subtitle", Text).required(),
        FieldSpec::new("card_description", "Card description", TextArea)
            .required()
            .rule(Rule::MaxLength(300)),
        FieldSpec::new("card_image", "Card image", File).rule(Rule::Upload),
        FieldSpec::new("card_image_hint", "Card image hint", Text),
        FieldSpec::new("hero_image", "Hero image", File).rule(Rule::Upload),
        FieldSpec::new("hero_image_hint", "Hero image hint", Text),
        FieldSpec::new("intro_title", "Introduction title", Text).required(),
        FieldSpec::new("intro_description", "Introduction", TextArea)
            .required()
            .rule(Rule::MinLength(20)),
        FieldSpec::new("intro_image", "Introduction image", File).rule(Rule::Upload),
        FieldSpec::new("intro_image_hint", "Introduction image hint", Text),
    ];

    for i in 0..LOCATION_GALLERY_SIZE {
        let n = i + 1;
        fields.extend([
            FieldSpec::new(format!("gallery.{i}.image"), format!("Gallery image {n}"), File)
                .rule(Rule::Upload),
            FieldSpec::new(format!("gallery.{i}.alt_text"), format!("Gallery image {n} alt text"), Text)
                .required(),
            FieldSpec::new(format!("gallery.{i}.hint"), format!("Gallery image {n} hint"), Text),
            FieldSpec::new(format!("gallery.{i}.is_360"), format!("Gallery image {n} is a 360° view"), Checkbox),
        ]);
    }

    fields.extend(icon_block_fields("highlights", "Highlight", LOCATION_HIGHLIGHTS));
    fields.extend(icon_block_fields("visitor_info", "Visitor info", LOCATION_VISITOR_INFO));

    fields.push(
        FieldSpec::new("map_embed_url", "Map embed URL", Url)
            .required()
            .rule(Rule::Url),
    );
    for i in 0..LOCATION_NEARBY {
        let n = i + 1;
        fields.extend([
            FieldSpec::new(format!("nearby.{i}.name"), format!("Nearby attraction {n} name"), Text)
                .required(),
            FieldSpec::new(
                format!("nearby.{i}.description"),
                format!("Nearby attraction {n} description"),
                TextArea,
            )
            .required(),
            FieldSpec::new(format!("nearby.{i}.image"), format!("Nearby attraction {n} image"), File)
                .rule(Rule::Upload),
            FieldSpec::new(format!("nearby.{i}.image_hint"), format!("Nearby attraction {n} image hint"), Text),
        ]);
    }

    Schema::new(fields)
}

/// Form state of the edit wizard, prefilled from a stored location.
pub fn form_from_location(location: &Location) -> FormState {
    let mut state = FormState::new();
    for (path, value) in [
        ("title", &location.title),
        ("slug", &location.slug),
        ("subtitle", &location.subtitle),
        ("card_description", &location.card_description),
        ("card_image", &location.card_image),
        ("card_image_hint", &location.card_image_hint),
        ("hero_image", &location.hero_image),
        ("hero_image_hint", &location.hero_image_hint),
        ("intro_title", &location.intro_title),
        ("intro_description", &location.intro_description),
        ("intro_image", &location.intro_image),
        ("intro_image_hint", &location.intro_image_hint),
        ("map_embed_url", &location.map_embed_url),
    ] {
        state.set(path, value.as_str());
    }

    for (i, image) in location
        .sorted_gallery()
        .into_iter()
        .take(LOCATION_GALLERY_SIZE)
        .enumerate()
    {
        if let Some(id) = image.id {
            state.set(format!("gallery.{i}.id"), id.to_string());
        }
        state.set(format!("gallery.{i}.image"), image.image_url.as_str());
        state.set(format!("gallery.{i}.alt_text"), image.alt_text.as_str());
        state.set(format!("gallery.{i}.hint"), image.hint.as_str());
        state.set(format!("gallery.{i}.is_360"), if image.is_360 { "1" } else { "" });
    }

    fill_icon_blocks(
        &mut state,
        "highlights",
        location
            .highlights
            .iter()
            .take(LOCATION_HIGHLIGHTS)
            .map(|h| (h.id, h.icon, h.title.as_str(), h.description.as_str(), h.sort_order)),
    );
    fill_icon_blocks(
        &mut state,
        "visitor_info",
        location
            .visitor_info
            .iter()
            .take(LOCATION_VISITOR_INFO)
            .map(|v| (v.id, v.icon, v.title.as_str(), v.description.as_str(), v.sort_order)),
    );

    let mut nearby: Vec<_> = location.nearby_attractions.iter().collect();
    nearby.sort_by_key(|n| n.sort_order);
    for (i, attraction) in nearby.into_iter().take(LOCATION_NEARBY).enumerate() {
        if let Some(id) = attraction.id {
            state.set(format!("nearby.{i}.id"), id.to_string());
        }
        state.set(format!("nearby.{i}.name"), attraction.name.as_str());
        state.set(format!("nearby.{i}.description"), attraction.description.as_str());
        state.set(format!("nearby.{i}.image"), attraction.image_url.as_str());
        state.set(format!("nearby.{i}.image_hint"), attraction.image_hint.as_str());
    }

    state
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct NearbyEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    name: String,
    description: String,
    image_hint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    image_url: String,
    sort_order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ExistingGalleryEntry {
    id: i64,
    image_url: String,
    alt_text: String,
    hint: String,
    is_360: bool,
    sort_order: u32,
}

fn nearby_image_field(sort_order: u32) -> String {
    format!("nearby_attraction_image_{sort_order}")
}

/// Main body of the create or update request. Gallery images are sent
/// separately, see [`gallery_payloads`].
pub fn location_payload(state: &FormState, update: bool) -> Result<MultipartPayload, serde_json::Error> {
    let mut payload = MultipartPayload::new();
    if update {
        payload.method_override("PUT");
    }

    attach_texts(&mut payload, state, TEXT_FIELDS);
    for field in IMAGE_FIELDS {
        attach_image(&mut payload, state, field, field);
    }

    payload.json(
        "highlights",
        &icon_block_entries(state, "highlights", LOCATION_HIGHLIGHTS),
    )?;
    payload.json(
        "visitor_info",
        &icon_block_entries(state, "visitor_info", LOCATION_VISITOR_INFO),
    )?;

    let mut nearby = Vec::new();
    for i in 0..LOCATION_NEARBY {
        if state.value(&format!("nearby.{i}.name")).is_empty() {
            continue;
        }
        let sort_order = nearby.len() as u32 + 1;
        let image_path = format!("nearby.{i}.image");
        let image_url = match state.upload(&image_path) {
            Some(upload) => {
                payload.file(nearby_image_field(sort_order), upload.clone());
                String::new()
            }
            None => state.value(&image_path).to_string(),
        };
        nearby.push(NearbyEntry {
            id: state.id(&format!("nearby.{i}.id")),
            name: state.value(&format!("nearby.{i}.name")).to_string(),
            description: state.value(&format!("nearby.{i}.description")).to_string(),
            image_hint: state.value(&format!("nearby.{i}.image_hint")).to_string(),
            image_url,
            sort_order,
        });
    }
    payload.json("nearby_attractions", &nearby)?;

    if update {
        // Stored gallery slots that keep their file. Slots with a new file
        // are left out and re-created through the gallery endpoint.
        let existing: Vec<_> = (0..LOCATION_GALLERY_SIZE)
            .filter(|i| state.upload(&format!("gallery.{i}.image")).is_none())
            .filter_map(|i| {
                Some(ExistingGalleryEntry {
                    id: state.id(&format!("gallery.{i}.id"))?,
                    image_url: state.value(&format!("gallery.{i}.image")).to_string(),
                    alt_text: state.value(&format!("gallery.{i}.alt_text")).to_string(),
                    hint: state.value(&format!("gallery.{i}.hint")).to_string(),
                    is_360: state.flag(&format!("gallery.{i}.is_360")),
                    sort_order: i as u32 + 1,
                })
            })
            .collect();
        payload.json("gallery_existing", &existing)?;
    }

    Ok(payload)
}

/// One `POST /location-gallery/` body per slot holding a pending file.
pub fn gallery_payloads(state: &FormState, location_slug: &str) -> Vec<MultipartPayload> {
    (0..LOCATION_GALLERY_SIZE)
        .filter_map(|i| {
            let upload = state.upload(&format!("gallery.{i}.image"))?;
            let mut payload = MultipartPayload::new();
            payload
                .file("image", upload.clone())
                .text("location_slug", location_slug)
                .text("alt_text", state.value(&format!("gallery.{i}.alt_text")))
                .text("hint", state.value(&format!("gallery.{i}.hint")))
                .text(
                    "is_360",
                    if state.flag(&format!("gallery.{i}.is_360")) { "1" } else { "0" },
                )
                .text("sort_order", (i + 1).to_string());
            Some(payload)
        })
        .collect()
}

async fn upload_gallery(backend: &dyn Backend, state: &FormState, slug: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    for payload in gallery_payloads(state, slug) {
        let sort_order = payload.text_value("sort_order").unwrap_or_default().to_string();
        if let Err(err) = backend.add_location_gallery_image(payload).await {
            log::warn!("Gallery image {} for '{}' failed: {}", sort_order, slug, err);
            warnings.push(format!(
                "Gallery image {} was not uploaded: {}",
                sort_order,
                err.user_message()
            ));
        }
    }
    warnings
}

pub async fn submit_create(backend: &dyn Backend, state: &FormState) -> Result<SubmitOutcome, SubmitError> {
    location_schema().validate(state)?;

    let payload = location_payload(state, false)?;
    let reply = backend.create_location(payload).await?;

    let slug = reply
        .slug
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.value("slug").to_string());
    log::info!("Created location '{}'", slug);

    let mut outcome = SubmitOutcome::new(slug.clone(), &reply, "Location created");
    outcome.warnings = upload_gallery(backend, state, &slug).await;
    Ok(outcome)
}

/// `original_slug` addresses the record; the form may rename it.
pub async fn submit_update(
    backend: &dyn Backend,
    original_slug: &str,
    state: &FormState,
) -> Result<SubmitOutcome, SubmitError> {
    location_schema().validate(state)?;

    let payload = location_payload(state, true)?;
    let reply = backend.update_location(original_slug, payload).await?;

    let slug = state.value("slug").to_string();
    log::info!("Updated location '{}' (now '{}')", original_slug, slug);

    let mut outcome = SubmitOutcome::new(slug.clone(), &reply, "Location updated");
    outcome.warnings = upload_gallery(backend, state, &slug).await;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Upload;
    use crate::models::{Highlight, Icon, LocationGalleryImage};
    use crate::services::wizard::WizardController;

    fn jpeg(name: &str) -> Upload {
        Upload::new(name, "image/jpeg", vec![0xff, 0xd8, 0xff])
    }

    #[test]
    fn every_schema_field_belongs_to_exactly_one_step() {
        for field in location_schema().fields() {
            let owners = LOCATION_STEPS.iter().filter(|s| s.owns(&field.path)).count();
            assert_eq!(owners, 1, "{}", field.path);
        }
    }

    #[test]
    fn first_step_blocks_on_missing_card_image() {
        let mut state = FormState::new();
        state.set("title", "Sinharaja Rainforest");
        state.set("slug", "sinharaja-rainforest");
        state.set("subtitle", "Rainforest reserve");
        state.set("card_description", "Lowland rainforest.");

        let mut wizard = WizardController::new(LOCATION_STEPS);
        let errors = wizard.go_next(&location_schema(), &state).unwrap_err();
        assert_eq!(errors.first_path(), Some("card_image"));
        assert_eq!(wizard.index(), 0);

        state.set_upload("card_image", jpeg("card.jpg"));
        assert_eq!(wizard.go_next(&location_schema(), &state), Ok(1));
    }

    #[test]
    fn update_payload_keeps_stored_urls() {
        let location = Location {
            id: Some(4),
            slug: "ella".into(),
            title: "Ella".into(),
            hero_image: "/uploads/hero.jpg".into(),
            card_image: "/uploads/card.jpg".into(),
            highlights: vec![Highlight {
                id: Some(11),
                icon: Icon::Mountain,
                title: "Ella Rock".into(),
                description: "Sunrise hike".into(),
                sort_order: 1,
            }],
            gallery_images: vec![
                LocationGalleryImage {
                    id: Some(21),
                    image_url: "/uploads/g1.jpg".into(),
                    sort_order: 1,
                    ..Default::default()
                },
                LocationGalleryImage {
                    id: Some(22),
                    image_url: "/uploads/g2.jpg".into(),
                    is_360: true,
                    sort_order: 2,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let mut state = form_from_location(&location);
        state.set_upload("card_image", jpeg("new-card.jpg"));
        state.set_upload("gallery.0.image", jpeg("g1-new.jpg"));

        let payload = location_payload(&state, true).unwrap();
        assert_eq!(payload.text_value("_method"), Some("PUT"));
        assert_eq!(payload.files("card_image").len(), 1);
        assert!(!payload.has("card_image_existing"));
        assert_eq!(payload.text_value("hero_image_existing"), Some("/uploads/hero.jpg"));

        let highlights = payload.json_value("highlights").unwrap();
        assert_eq!(highlights[0]["id"], 11);
        assert_eq!(highlights[0]["icon"], "Mountain");
        assert_eq!(highlights[0]["sort_order"], 1);

        let existing = payload.json_value("gallery_existing").unwrap();
        assert_eq!(existing.as_array().unwrap().len(), 1);
        assert_eq!(existing[0]["id"], 22);
        assert_eq!(existing[0]["is_360"], true);

        let gallery = gallery_payloads(&state, "ella");
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery[0].text_value("location_slug"), Some("ella"));
        assert_eq!(gallery[0].text_value("sort_order"), Some("1"));
        assert_eq!(gallery[0].text_value("is_360"), Some("0"));
    }

    #[test]
    fn create_payload_numbers_nearby_files_by_sort_order() {
        let mut state = FormState::new();
        state.set("nearby.0.name", "Lipton's Seat");
        state.set_upload("nearby.0.image", jpeg("lipton.jpg"));
        state.set("nearby.2.name", "Dunhinda Falls");
        state.set_upload("nearby.2.image", jpeg("dunhinda.jpg"));

        let payload = location_payload(&state, false).unwrap();
        assert!(!payload.has("_method"));
        assert!(!payload.has("gallery_existing"));
        assert_eq!(payload.files("nearby_attraction_image_2")[0].filename, "dunhinda.jpg");

        let nearby = payload.json_value("nearby_attractions").unwrap();
        assert_eq!(nearby[1]["name"], "Dunhinda Falls");
        assert_eq!(nearby[1]["sort_order"], 2);
    }
}
