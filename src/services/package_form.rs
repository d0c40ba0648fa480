//! Create/edit wizard for tour packages.

use serde::Serialize;

use super::assembly::{
    SubmitOutcome, attach_image, attach_texts, fill_icon_blocks, icon_block_entries,
    icon_block_fields,
};
use super::gallery::GalleryEditor;
use super::wizard::{FieldSpec, FormState, InputKind, Rule, Schema, StepDef};
use crate::api::{Backend, MultipartPayload};
use crate::common::SubmitError;
use crate::models::{PACKAGE_HIGHLIGHTS, TourPackage};

pub const ITINERARY_ROWS: usize = 8;
pub const NEW_GALLERY_SLOTS: usize = 6;

const CARD_STEP: StepDef = StepDef {
    id: "card",
    title: "Homepage card",
    prefixes: &[
        "homepage_title",
        "slug",
        "homepage_description",
        "homepage_image",
        "homepage_image_hint",
    ],
};

const DETAILS_STEP: StepDef = StepDef {
    id: "details",
    title: "Tour details",
    prefixes: &[
        "title",
        "duration",
        "price",
        "price_suffix",
        "description",
        "hero_image",
        "hero_image_hint",
    ],
};

const HIGHLIGHTS_STEP: StepDef = StepDef {
    id: "highlights",
    title: "Highlights & inclusions",
    prefixes: &["highlights", "inclusions"],
};

pub const PACKAGE_CREATE_STEPS: &[StepDef] = &[
    CARD_STEP,
    DETAILS_STEP,
    HIGHLIGHTS_STEP,
    StepDef {
        id: "itinerary",
        title: "Itinerary & gallery",
        prefixes: &["itinerary", "booking_link", "gallery"],
    },
];

pub const PACKAGE_EDIT_STEPS: &[StepDef] = &[
    CARD_STEP,
    DETAILS_STEP,
    HIGHLIGHTS_STEP,
    StepDef {
        id: "itinerary",
        title: "Itinerary",
        prefixes: &["itinerary", "booking_link"],
    },
    StepDef {
        id: "gallery",
        title: "Experience gallery",
        prefixes: &["experience_gallery"],
    },
];

const TEXT_FIELDS: &[&str] = &[
    "slug",
    "homepage_title",
    "homepage_description",
    "homepage_image_hint",
    "title",
    "duration",
    "price",
    "price_suffix",
    "description",
    "hero_image_hint",
    "booking_link",
];

const IMAGE_FIELDS: &[&str] = &["homepage_image", "hero_image"];

/// Gallery slots exist only in the create wizard; the edit wizard manages
/// its gallery through [`GalleryEditor`].
pub fn package_schema(with_gallery_slots: bool) -> Schema {
    use InputKind::*;

    let mut fields = vec![
        FieldSpec::new("homepage_title", "Card title", Text)
            .required()
            .rule(Rule::MaxLength(120)),
        FieldSpec::new("slug", "Slug", Text).required().rule(Rule::Slug),
        FieldSpec::new("homepage_description", "Card description", TextArea)
            .required()
            .rule(Rule::MaxLength(300)),
        FieldSpec::new("homepage_image", "Card image", File).rule(Rule::Upload),
        FieldSpec::new("homepage_image_hint", "Card image hint", Text),
        FieldSpec::new("title", "Tour title", Text).required(),
        FieldSpec::new("duration", "Duration", Text).required(),
        FieldSpec::new("price", "Price", Text).required().rule(Rule::Price),
        FieldSpec::new("price_suffix", "Price suffix", Text),
        FieldSpec::new("description", "Description", TextArea)
            .required()
            .rule(Rule::MinLength(20)),
        FieldSpec::new("hero_image", "Hero image", File).rule(Rule::Upload),
        FieldSpec::new("hero_image_hint", "Hero image hint", Text),
    ];

    fields.extend(icon_block_fields("highlights", "Highlight", PACKAGE_HIGHLIGHTS));
    fields.push(
        FieldSpec::new("inclusions", "Inclusions (one per line)", TextArea).required(),
    );

    for i in 0..ITINERARY_ROWS {
        let n = i + 1;
        let mut time = FieldSpec::new(format!("itinerary.{i}.time"), format!("Stop {n} time"), Text);
        let mut title = FieldSpec::new(format!("itinerary.{i}.title"), format!("Stop {n} title"), Text);
        if i == 0 {
            time = time.required();
            title = title.required();
        }
        fields.extend([
            time,
            title,
            FieldSpec::new(
                format!("itinerary.{i}.description"),
                format!("Stop {n} description"),
                TextArea,
            ),
        ]);
    }
    fields.push(FieldSpec::new("booking_link", "Booking link", Url).rule(Rule::Url));

    if with_gallery_slots {
        for i in 0..NEW_GALLERY_SLOTS {
            let n = i + 1;
            fields.extend([
                FieldSpec::new(format!("gallery.{i}.image"), format!("Gallery image {n}"), File),
                FieldSpec::new(format!("gallery.{i}.alt_text"), format!("Gallery image {n} alt text"), Text),
                FieldSpec::new(format!("gallery.{i}.hint"), format!("Gallery image {n} hint"), Text),
            ]);
        }
    }

    Schema::new(fields)
}

/// Edit wizard state plus its gallery, loaded from a stored package.
pub fn form_from_tour(tour: &TourPackage) -> (FormState, GalleryEditor) {
    let mut state = FormState::new();
    for (path, value) in [
        ("slug", &tour.slug),
        ("homepage_title", &tour.homepage_title),
        ("homepage_description", &tour.homepage_description),
        ("homepage_image", &tour.homepage_image),
        ("homepage_image_hint", &tour.homepage_image_hint),
        ("title", &tour.title),
        ("duration", &tour.duration),
        ("price", &tour.price),
        ("price_suffix", &tour.price_suffix),
        ("description", &tour.description),
        ("hero_image", &tour.hero_image),
        ("hero_image_hint", &tour.hero_image_hint),
        ("booking_link", &tour.booking_link),
    ] {
        state.set(path, value.as_str());
    }

    fill_icon_blocks(
        &mut state,
        "highlights",
        tour.highlights
            .iter()
            .take(PACKAGE_HIGHLIGHTS)
            .map(|h| (h.id, h.icon, h.title.as_str(), h.description.as_str(), h.sort_order)),
    );

    let mut inclusions: Vec<_> = tour.inclusions.iter().collect();
    inclusions.sort_by_key(|inc| inc.sort_order);
    let lines: Vec<&str> = inclusions.iter().map(|inc| inc.text.trim()).collect();
    state.set("inclusions", lines.join("\n"));
    for (i, inclusion) in inclusions.iter().enumerate() {
        if let Some(id) = inclusion.id {
            state.set(format!("inclusions.existing.{i}.id"), id.to_string());
            state.set(format!("inclusions.existing.{i}.text"), inclusion.text.trim());
        }
    }

    let mut itinerary: Vec<_> = tour.itinerary.iter().collect();
    itinerary.sort_by_key(|step| step.sort_order);
    for (i, step) in itinerary.into_iter().take(ITINERARY_ROWS).enumerate() {
        if let Some(id) = step.id {
            state.set(format!("itinerary.{i}.id"), id.to_string());
        }
        state.set(format!("itinerary.{i}.time"), step.time.as_str());
        state.set(format!("itinerary.{i}.title"), step.title.as_str());
        state.set(format!("itinerary.{i}.description"), step.description.as_str());
    }

    (state, GalleryEditor::from_images(&tour.experience_gallery))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct InclusionEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    text: String,
    sort_order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ItineraryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    time: String,
    title: String,
    description: String,
    sort_order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct GallerySlotEntry {
    alt_text: String,
    hint: String,
    sort_order: u32,
}

/// Non-blank lines of the inclusions box. A line matching a stored
/// inclusion keeps that inclusion's id.
fn inclusion_entries(state: &FormState) -> Vec<InclusionEntry> {
    let mut stored: Vec<(i64, String)> = (0..)
        .map_while(|i| {
            let id = state.id(&format!("inclusions.existing.{i}.id"))?;
            Some((id, state.value(&format!("inclusions.existing.{i}.text")).to_string()))
        })
        .collect();

    state
        .value("inclusions")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(pos, line)| {
            let id = stored
                .iter()
                .position(|(_, text)| text == line)
                .map(|idx| stored.remove(idx).0);
            InclusionEntry {
                id,
                text: line.to_string(),
                sort_order: pos as u32 + 1,
            }
        })
        .collect()
}

fn itinerary_entries(state: &FormState) -> Vec<ItineraryEntry> {
    (0..ITINERARY_ROWS)
        .filter(|i| !state.value(&format!("itinerary.{i}.title")).is_empty())
        .enumerate()
        .map(|(pos, i)| ItineraryEntry {
            id: state.id(&format!("itinerary.{i}.id")),
            time: state.value(&format!("itinerary.{i}.time")).to_string(),
            title: state.value(&format!("itinerary.{i}.title")).to_string(),
            description: state.value(&format!("itinerary.{i}.description")).to_string(),
            sort_order: pos as u32 + 1,
        })
        .collect()
}

/// Multipart body for `POST /tours/` (no editor) or the PUT-style update
/// (with the edit wizard's gallery).
pub fn package_payload(
    state: &FormState,
    gallery: Option<&GalleryEditor>,
) -> Result<MultipartPayload, serde_json::Error> {
    let mut payload = MultipartPayload::new();
    if gallery.is_some() {
        payload.method_override("PUT");
    }

    attach_texts(&mut payload, state, TEXT_FIELDS);
    for field in IMAGE_FIELDS {
        attach_image(&mut payload, state, field, field);
    }

    payload.json(
        "highlights",
        &icon_block_entries(state, "highlights", PACKAGE_HIGHLIGHTS),
    )?;
    payload.json("inclusions", &inclusion_entries(state))?;
    payload.json("itinerary", &itinerary_entries(state))?;

    match gallery {
        Some(editor) => {
            payload.json("experience_gallery_existing", &editor.existing_entries())?;
            let mut new_entries = Vec::new();
            for (entry, upload) in editor.new_entries() {
                payload.file("experience_gallery_images[]", upload.clone());
                new_entries.push(entry);
            }
            payload.json("experience_gallery_new", &new_entries)?;
        }
        None => {
            let mut slots = Vec::new();
            for i in 0..NEW_GALLERY_SLOTS {
                let Some(upload) = state.upload(&format!("gallery.{i}.image")) else {
                    continue;
                };
                payload.file("experience_gallery_images[]", upload.clone());
                slots.push(GallerySlotEntry {
                    alt_text: state.value(&format!("gallery.{i}.alt_text")).to_string(),
                    hint: state.value(&format!("gallery.{i}.hint")).to_string(),
                    sort_order: slots.len() as u32 + 1,
                });
            }
            payload.json("experience_gallery", &slots)?;
        }
    }

    Ok(payload)
}

pub async fn submit_create(backend: &dyn Backend, state: &FormState) -> Result<SubmitOutcome, SubmitError> {
    package_schema(true).validate(state)?;

    let payload = package_payload(state, None)?;
    let reply = backend.create_tour(payload).await?;

    let key = reply
        .id_i64()
        .map(|id| id.to_string())
        .unwrap_or_else(|| state.value("slug").to_string());
    log::info!("Created tour package {}", key);
    Ok(SubmitOutcome::new(key, &reply, "Tour package created"))
}

/// Sends the package update, then saves stored gallery items that have a
/// queued replacement file through their own endpoint.
pub async fn submit_update(
    backend: &dyn Backend,
    id: i64,
    state: &FormState,
    gallery: &mut GalleryEditor,
) -> Result<SubmitOutcome, SubmitError> {
    package_schema(false).validate(state)?;

    let payload = package_payload(state, Some(gallery))?;
    let reply = backend.update_tour(id, payload).await?;
    log::info!("Updated tour package {}", id);

    let mut outcome = SubmitOutcome::new(id.to_string(), &reply, "Tour package updated");
    for index in gallery.pending_replacements() {
        if let Err(err) = gallery.save(backend, index).await {
            log::warn!("Experience image {} of package {} failed: {}", index + 1, id, err);
            outcome.warnings.push(format!(
                "Gallery image {} was not replaced: {}",
                index + 1,
                err.user_message()
            ));
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Upload;
    use crate::models::{ExperienceImage, Inclusion};
    use crate::services::wizard::WizardController;

    #[test]
    fn step_counts() {
        assert_eq!(PACKAGE_CREATE_STEPS.len(), 4);
        assert_eq!(PACKAGE_EDIT_STEPS.len(), 5);
    }

    #[test]
    fn every_field_has_one_step() {
        for (schema, steps) in [
            (package_schema(true), PACKAGE_CREATE_STEPS),
            (package_schema(false), PACKAGE_EDIT_STEPS),
        ] {
            for field in schema.fields() {
                let owners = steps.iter().filter(|s| s.owns(&field.path)).count();
                assert_eq!(owners, 1, "{}", field.path);
            }
        }
    }

    #[test]
    fn price_without_amount_blocks_details_step() {
        let mut state = FormState::new();
        state.set("title", "Ella Highlands");
        state.set("duration", "1 day");
        state.set("price", "On request");
        state.set("description", "Tea country by train and on foot.");
        state.set("hero_image", "/uploads/hero.jpg");

        let mut wizard = WizardController::new(PACKAGE_CREATE_STEPS);
        let schema = package_schema(true);
        let mut card = state.clone();
        card.set("homepage_title", "Ella");
        card.set("slug", "ella");
        card.set("homepage_description", "Hill country");
        card.set("homepage_image", "/uploads/card.jpg");
        wizard.go_next(&schema, &card).unwrap();

        let errors = wizard.go_next(&schema, &card).unwrap_err();
        assert_eq!(errors.first_path(), Some("price"));

        card.set("price", "$135");
        assert_eq!(wizard.go_next(&schema, &card), Ok(2));
    }

    #[test]
    fn inclusions_keep_ids_of_unchanged_lines() {
        let tour = TourPackage {
            inclusions: vec![
                Inclusion {
                    id: Some(5),
                    text: "Hotel pickup".into(),
                    sort_order: 1,
                },
                Inclusion {
                    id: Some(6),
                    text: "Lunch".into(),
                    sort_order: 2,
                },
            ],
            ..Default::default()
        };
        let (mut state, _) = form_from_tour(&tour);
        assert_eq!(state.value("inclusions"), "Hotel pickup\nLunch");

        state.set("inclusions", "Lunch\n\n  Park tickets \nHotel pickup");
        let entries = inclusion_entries(&state);
        assert_eq!(entries.len(), 3);
        assert_eq!((entries[0].id, entries[0].sort_order), (Some(6), 1));
        assert_eq!(entries[1].text, "Park tickets");
        assert_eq!(entries[1].id, None);
        assert_eq!(entries[2].id, Some(5));
    }

    #[test]
    fn create_payload_sends_gallery_slots_as_files() {
        let mut state = FormState::new();
        state.set_upload("gallery.1.image", Upload::new("b.jpg", "image/jpeg", vec![1]));
        state.set("gallery.1.alt_text", "Train");
        state.set("gallery.3.alt_text", "No file, skipped");

        let payload = package_payload(&state, None).unwrap();
        assert!(!payload.has("_method"));
        assert_eq!(payload.files("experience_gallery_images[]").len(), 1);
        let slots = payload.json_value("experience_gallery").unwrap();
        assert_eq!(slots.as_array().unwrap().len(), 1);
        assert_eq!(slots[0]["alt_text"], "Train");
        assert_eq!(slots[0]["sort_order"], 1);
    }

    #[test]
    fn update_payload_splits_existing_and_new_gallery_items() {
        let tour = TourPackage {
            id: Some(3),
            experience_gallery: vec![ExperienceImage {
                id: Some(30),
                src: "/g/30.jpg".into(),
                sort_order: 1,
                ..Default::default()
            }],
            ..Default::default()
        };
        let (state, mut gallery) = form_from_tour(&tour);
        gallery.add_new(Upload::new("n.jpg", "image/jpeg", vec![2]), "New", "");

        let payload = package_payload(&state, Some(&gallery)).unwrap();
        assert_eq!(payload.text_value("_method"), Some("PUT"));

        let existing = payload.json_value("experience_gallery_existing").unwrap();
        assert_eq!(existing.as_array().unwrap().len(), 1);
        assert_eq!(existing[0]["id"], 30);
        assert_eq!(existing[0]["src"], "/g/30.jpg");

        let new = payload.json_value("experience_gallery_new").unwrap();
        assert_eq!(new[0]["sort_order"], 2);
        assert_eq!(payload.files("experience_gallery_images[]").len(), 1);
    }
}
