use serde::Serialize;

use super::wizard::{FieldSpec, FormState, InputKind, Rule};
use crate::api::{ApiReply, MultipartPayload};
use crate::models::Icon;

/// Result of a wizard submit that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Slug or id of the saved record.
    pub key: String,
    pub message: String,
    /// Follow-up requests that failed after the record itself was saved.
    pub warnings: Vec<String>,
}

impl SubmitOutcome {
    pub fn new(key: impl Into<String>, reply: &ApiReply, fallback: &str) -> Self {
        Self {
            key: key.into(),
            message: reply
                .message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconBlockEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub icon: Icon,
    pub title: String,
    pub description: String,
    pub sort_order: u32,
}

/// Schema fields of `count` icon + title + description rows under `prefix`.
pub(crate) fn icon_block_fields(prefix: &str, label: &str, count: usize) -> Vec<FieldSpec> {
    (0..count)
        .flat_map(|i| {
            let n = i + 1;
            [
                FieldSpec::new(format!("{prefix}.{i}.icon"), format!("{label} {n} icon"), InputKind::Icon)
                    .required(),
                FieldSpec::new(format!("{prefix}.{i}.title"), format!("{label} {n} title"), InputKind::Text)
                    .required()
                    .rule(Rule::MaxLength(80)),
                FieldSpec::new(
                    format!("{prefix}.{i}.description"),
                    format!("{label} {n} description"),
                    InputKind::TextArea,
                )
                .required(),
            ]
        })
        .collect()
}

pub(crate) fn icon_block_entries(state: &FormState, prefix: &str, count: usize) -> Vec<IconBlockEntry> {
    (0..count)
        .filter(|i| !state.value(&format!("{prefix}.{i}.title")).is_empty())
        .enumerate()
        .map(|(pos, i)| IconBlockEntry {
            id: state.id(&format!("{prefix}.{i}.id")),
            icon: Icon::resolve(state.value(&format!("{prefix}.{i}.icon"))),
            title: state.value(&format!("{prefix}.{i}.title")).to_string(),
            description: state.value(&format!("{prefix}.{i}.description")).to_string(),
            sort_order: pos as u32 + 1,
        })
        .collect()
}

/// Loads icon rows into form paths, in `sort_order`.
pub(crate) fn fill_icon_blocks<'a, I>(state: &mut FormState, prefix: &str, rows: I)
where
    I: IntoIterator<Item = (Option<i64>, Icon, &'a str, &'a str, u32)>,
{
    let mut rows: Vec<_> = rows.into_iter().collect();
    rows.sort_by_key(|row| row.4);
    for (i, (id, icon, title, description, _)) in rows.into_iter().enumerate() {
        if let Some(id) = id {
            state.set(format!("{prefix}.{i}.id"), id.to_string());
        }
        state.set(format!("{prefix}.{i}.icon"), icon.as_str());
        state.set(format!("{prefix}.{i}.title"), title);
        state.set(format!("{prefix}.{i}.description"), description);
    }
}

/// Image field: the pending file when there is one, otherwise the stored
/// URL as `<field>_existing`.
pub(crate) fn attach_image(payload: &mut MultipartPayload, state: &FormState, field: &str, name: &str) {
    if let Some(upload) = state.upload(field) {
        payload.file(name, upload.clone());
    } else if let Some(url) = state.opt_value(field) {
        payload.text(format!("{name}_existing"), url);
    }
}

pub(crate) fn attach_texts(payload: &mut MultipartPayload, state: &FormState, fields: &[&str]) {
    for field in fields {
        payload.text(*field, state.value(field));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Upload;

    #[test]
    fn icon_rows_skip_blank_titles_and_renumber() {
        let mut state = FormState::new();
        state.set("highlights.0.title", "Birds");
        state.set("highlights.0.icon", "bird");
        state.set("highlights.2.title", "Trails");
        state.set("highlights.2.icon", "nope");
        state.set("highlights.2.id", "41");

        let entries = icon_block_entries(&state, "highlights", 4);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].icon, Icon::Bird);
        assert_eq!(entries[1].icon, Icon::default());
        assert_eq!(entries[1].sort_order, 2);
        assert_eq!(entries[1].id, Some(41));
    }

    #[test]
    fn image_prefers_pending_upload() {
        let mut state = FormState::new();
        state.set("hero_image", "/uploads/hero.jpg");

        let mut payload = MultipartPayload::new();
        attach_image(&mut payload, &state, "hero_image", "hero_image");
        assert_eq!(payload.text_value("hero_image_existing"), Some("/uploads/hero.jpg"));

        state.set_upload("hero_image", Upload::new("h.jpg", "image/jpeg", vec![1]));
        let mut payload = MultipartPayload::new();
        attach_image(&mut payload, &state, "hero_image", "hero_image");
        assert_eq!(payload.files("hero_image").len(), 1);
        assert!(!payload.has("hero_image_existing"));
    }
}
