//! Experience gallery of a tour package while it is being edited.
//!
//! Items loaded from the server carry an id and are changed through the
//! per-image endpoints right away; items added in the form are `is_new` and
//! travel with the parent package's update.

use std::sync::Mutex;

use serde::Serialize;

use crate::api::{ApiReply, Backend, MultipartPayload, Upload};
use crate::common::ApiError;
use crate::models::ExperienceImage;

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub id: Option<i64>,
    pub src: String,
    pub alt_text: String,
    pub hint: String,
    pub is_new: bool,
    /// New file for this slot, not uploaded yet.
    pub pending: Option<Upload>,
}

/// Entry of the `experience_gallery_existing` JSON field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistingImageEntry {
    pub id: i64,
    pub src: String,
    pub alt_text: String,
    pub hint: String,
    pub sort_order: u32,
}

/// Entry of the `experience_gallery_new` JSON field; the file goes out as
/// the matching `experience_gallery_images[]` part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewImageEntry {
    pub alt_text: String,
    pub hint: String,
    pub sort_order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Local,
    Remote(i64),
}

/// What happened to an edited item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSave {
    /// New item; it uploads with the package.
    Queued,
    /// Stored item, sent through its own endpoint.
    Sent(ApiReply),
}

/// Where an editor is kept between requests. `update` runs `f` under the
/// slot's lock and yields `None` once the editor is gone.
pub trait GallerySlot {
    fn update<R>(&self, f: impl FnOnce(&mut GalleryEditor) -> R) -> Option<R>;
}

impl GallerySlot for Mutex<GalleryEditor> {
    fn update<R>(&self, f: impl FnOnce(&mut GalleryEditor) -> R) -> Option<R> {
        let mut editor = self.lock().ok()?;
        Some(f(&mut *editor))
    }
}

fn no_item(index: usize) -> ApiError {
    ApiError::InvalidRequest(format!("no gallery item at {index}"))
}

/// Deletes one item of a kept editor. New items go at once. Stored items
/// are deleted on the server without holding the slot, then dropped by id,
/// so edits that landed meanwhile survive. `Ok(None)` means the editor is
/// gone; a failed call leaves the list untouched.
pub async fn delete_item(
    slot: &impl GallerySlot,
    backend: &dyn Backend,
    index: usize,
) -> Result<Option<Removal>, ApiError> {
    let planned: Option<Result<Removal, ApiError>> = slot.update(|editor| {
        let removal = editor.removal(index).ok_or_else(|| no_item(index))?;
        if removal == Removal::Local {
            editor.items.remove(index);
        }
        Ok(removal)
    });
    let removal = match planned {
        Some(removal) => removal?,
        None => return Ok(None),
    };

    if let Removal::Remote(id) = removal {
        backend.delete_experience_image(id).await?;
        log::info!("Deleted experience image {}", id);
        slot.update(|editor| editor.forget_stored(id));
    }
    Ok(Some(removal))
}

/// Applies posted text and an optional replacement file to one item of a
/// kept editor, then sends stored items through their own endpoint. The
/// slot is not held during the call. `Ok(None)` means the editor is gone.
pub async fn save_item(
    slot: &impl GallerySlot,
    backend: &dyn Backend,
    index: usize,
    alt_text: &str,
    hint: &str,
    upload: Option<Upload>,
) -> Result<Option<ItemSave>, ApiError> {
    let prepared = slot.update(|editor| {
        if !editor.edit(index, alt_text, hint, upload) {
            return Err(no_item(index));
        }
        match editor.removal(index) {
            Some(Removal::Remote(_)) => {
                let sent = editor.items.get(index).and_then(|item| item.pending.clone());
                editor.item_payload(index).map(|(id, payload)| Some((id, payload, sent)))
            }
            _ => Ok(None),
        }
    });
    let request = match prepared {
        Some(request) => request?,
        None => return Ok(None),
    };
    let Some((id, payload, sent)) = request else {
        return Ok(Some(ItemSave::Queued));
    };

    let reply = backend.update_experience_image(id, payload).await?;
    slot.update(|editor| editor.mark_saved(id, sent.as_ref()));
    Ok(Some(ItemSave::Sent(reply)))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryEditor {
    items: Vec<GalleryItem>,
}

impl GalleryEditor {
    pub fn from_images(images: &[ExperienceImage]) -> Self {
        let mut sorted: Vec<&ExperienceImage> = images.iter().collect();
        sorted.sort_by_key(|image| image.sort_order);

        let items = sorted
            .into_iter()
            .map(|image| GalleryItem {
                id: image.id,
                src: image.src.clone(),
                alt_text: image.alt_text.clone(),
                hint: image.hint.clone(),
                is_new: image.id.is_none(),
                pending: None,
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add_new(&mut self, upload: Upload, alt_text: &str, hint: &str) -> usize {
        self.items.push(GalleryItem {
            id: None,
            src: String::new(),
            alt_text: alt_text.trim().to_string(),
            hint: hint.trim().to_string(),
            is_new: true,
            pending: Some(upload),
        });
        self.items.len() - 1
    }

    /// Updates the text of an item and, when given, queues a replacement
    /// file. Returns `false` for an unknown index.
    pub fn edit(&mut self, index: usize, alt_text: &str, hint: &str, upload: Option<Upload>) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.alt_text = alt_text.trim().to_string();
        item.hint = hint.trim().to_string();
        if let Some(upload) = upload.filter(|u| !u.is_empty()) {
            item.pending = Some(upload);
        }
        true
    }

    /// What deleting `index` involves, without doing it.
    pub fn removal(&self, index: usize) -> Option<Removal> {
        let item = self.items.get(index)?;
        Some(match item.id {
            Some(id) if !item.is_new => Removal::Remote(id),
            _ => Removal::Local,
        })
    }

    /// Drops stored item `id` after the server deleted it.
    fn forget_stored(&mut self, id: i64) {
        self.items.retain(|item| item.is_new || item.id != Some(id));
    }

    /// Clears the queued file of stored item `id` if it is still the one
    /// that was sent.
    fn mark_saved(&mut self, id: i64, sent: Option<&Upload>) {
        let stored = self
            .items
            .iter_mut()
            .find(|item| !item.is_new && item.id == Some(id));
        if let Some(item) = stored.filter(|item| item.pending.as_ref() == sent) {
            item.pending = None;
        }
    }

    /// Saves one stored item through its own endpoint: text fields always,
    /// the image only when a replacement is queued.
    pub async fn save(&mut self, backend: &dyn Backend, index: usize) -> Result<ApiReply, ApiError> {
        let (id, payload) = self.item_payload(index)?;
        let reply = backend.update_experience_image(id, payload).await?;

        if let Some(item) = self.items.get_mut(index) {
            item.pending = None;
        }
        Ok(reply)
    }

    fn item_payload(&self, index: usize) -> Result<(i64, MultipartPayload), ApiError> {
        let item = self.items.get(index).ok_or_else(|| no_item(index))?;
        let id = item.id.filter(|_| !item.is_new).ok_or_else(|| {
            ApiError::InvalidRequest("new images are saved with the package".to_string())
        })?;

        let mut payload = MultipartPayload::new();
        payload
            .method_override("PUT")
            .text("alt_text", item.alt_text.as_str())
            .text("hint", item.hint.as_str())
            .text("sort_order", (index + 1).to_string());
        match &item.pending {
            Some(upload) => payload.file("image", upload.clone()),
            None => payload.text("image_existing", item.src.as_str()),
        };
        Ok((id, payload))
    }

    /// Stored items, with the position they now have in the full list.
    pub fn existing_entries(&self) -> Vec<ExistingImageEntry> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_new)
            .filter_map(|(pos, item)| {
                Some(ExistingImageEntry {
                    id: item.id?,
                    src: item.src.clone(),
                    alt_text: item.alt_text.clone(),
                    hint: item.hint.clone(),
                    sort_order: pos as u32 + 1,
                })
            })
            .collect()
    }

    /// New items that have a file, with their position in the full list.
    pub fn new_entries(&self) -> Vec<(NewImageEntry, &Upload)> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_new)
            .filter_map(|(pos, item)| {
                let upload = item.pending.as_ref()?;
                Some((
                    NewImageEntry {
                        alt_text: item.alt_text.clone(),
                        hint: item.hint.clone(),
                        sort_order: pos as u32 + 1,
                    },
                    upload,
                ))
            })
            .collect()
    }

    /// Stored items with a queued replacement file.
    pub fn pending_replacements(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_new && item.pending.is_some())
            .map(|(pos, _)| pos)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: i64, sort_order: u32) -> ExperienceImage {
        ExperienceImage {
            id: Some(id),
            src: format!("/uploads/{id}.jpg"),
            alt_text: format!("Image {id}"),
            hint: String::new(),
            sort_order,
        }
    }

    fn png() -> Upload {
        Upload::new("new.png", "image/png", vec![0x89, 0x50])
    }

    #[test]
    fn loads_in_sort_order() {
        let editor = GalleryEditor::from_images(&[stored(9, 2), stored(4, 1)]);
        let ids: Vec<_> = editor.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![Some(4), Some(9)]);
        assert!(editor.items().iter().all(|i| !i.is_new));
    }

    #[test]
    fn existing_and_new_entries_split() {
        let mut editor = GalleryEditor::from_images(&[stored(1, 1), stored(2, 2)]);
        editor.add_new(png(), "Sunrise", "dawn");
        editor.edit(0, "First", "", Some(png()));

        let existing = editor.existing_entries();
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].src, "/uploads/1.jpg");
        assert_eq!(existing[1].sort_order, 2);

        let new = editor.new_entries();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].0.sort_order, 3);
        assert_eq!(new[0].1.filename, "new.png");

        assert_eq!(editor.pending_replacements(), vec![0]);
    }

    #[test]
    fn removal_depends_on_server_id() {
        let mut editor = GalleryEditor::from_images(&[stored(7, 1)]);
        editor.add_new(png(), "", "");
        assert_eq!(editor.removal(0), Some(Removal::Remote(7)));
        assert_eq!(editor.removal(1), Some(Removal::Local));
        assert_eq!(editor.removal(5), None);
    }

    #[test]
    fn newer_replacement_survives_an_older_save() {
        let mut editor = GalleryEditor::from_images(&[stored(3, 1)]);
        let sent = png();
        editor.edit(0, "", "", Some(sent.clone()));
        let newer = Upload::new("newer.png", "image/png", vec![0x89, 0x50, 0x4e]);
        editor.edit(0, "", "", Some(newer));

        editor.mark_saved(3, Some(&sent));
        assert_eq!(editor.pending_replacements(), vec![0]);

        let queued = editor.items()[0].pending.clone();
        editor.mark_saved(3, queued.as_ref());
        assert!(editor.pending_replacements().is_empty());
    }

    #[test]
    fn item_payload_uses_put_override() {
        let mut editor = GalleryEditor::from_images(&[stored(3, 1)]);
        let (id, payload) = editor.item_payload(0).unwrap();
        assert_eq!(id, 3);
        assert_eq!(payload.text_value("_method"), Some("PUT"));
        assert_eq!(payload.text_value("image_existing"), Some("/uploads/3.jpg"));

        editor.edit(0, "Alt", "hint", Some(png()));
        let (_, payload) = editor.item_payload(0).unwrap();
        assert_eq!(payload.files("image").len(), 1);
        assert!(!payload.has("image_existing"));

        editor.add_new(png(), "", "");
        assert!(editor.item_payload(1).is_err());
    }
}
