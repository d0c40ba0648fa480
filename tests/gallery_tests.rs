mod common;

#[cfg(test)]
pub mod gallery_tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::common::*;

    use sapphire_trails::services::*;

    fn editor() -> GalleryEditor {
        GalleryEditor::from_images(&seed_tour().experience_gallery)
    }

    fn slot() -> Mutex<GalleryEditor> {
        Mutex::new(editor())
    }

    fn ids(slot: &Mutex<GalleryEditor>) -> Vec<Option<i64>> {
        slot.lock().unwrap().items().iter().map(|item| item.id).collect()
    }

    /// Another request adds an image while the first call is out.
    struct Contended {
        editor: Mutex<GalleryEditor>,
        updates: AtomicUsize,
    }

    impl Contended {
        fn new() -> Self {
            Self {
                editor: Mutex::new(editor()),
                updates: AtomicUsize::new(0),
            }
        }
    }

    impl GallerySlot for Contended {
        fn update<R>(&self, f: impl FnOnce(&mut GalleryEditor) -> R) -> Option<R> {
            let mut editor = self.editor.lock().unwrap();
            if self.updates.fetch_add(1, Ordering::SeqCst) == 1 {
                editor.add_new(jpeg("late.jpg"), "Added meanwhile", "");
            }
            Some(f(&mut *editor))
        }
    }

    struct Gone;

    impl GallerySlot for Gone {
        fn update<R>(&self, _f: impl FnOnce(&mut GalleryEditor) -> R) -> Option<R> {
            None
        }
    }

    #[tokio::test]
    async fn new_items_are_dropped_without_a_request() {
        let api = FakeBackend::new();
        let slot = slot();
        let index = slot.lock().unwrap().add_new(jpeg("sunset.jpg"), "Sunset", "");

        let removal = delete_item(&slot, &api, index).await.unwrap();
        assert_eq!(removal, Some(Removal::Local));
        assert_eq!(slot.lock().unwrap().len(), 2);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn stored_items_are_deleted_on_the_server_once() {
        let api = FakeBackend::new();
        let slot = slot();

        let removal = delete_item(&slot, &api, 0).await.unwrap();
        assert_eq!(removal, Some(Removal::Remote(71)));
        assert_eq!(api.calls(), vec!["delete_experience_image 71".to_string()]);
        assert_eq!(ids(&slot), vec![Some(72)]);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_item() {
        let api = FakeBackend::new();
        api.fail("delete_experience_image");
        let slot = slot();

        let err = delete_item(&slot, &api, 1).await.unwrap_err();
        assert_eq!(err.user_message(), "delete_experience_image rejected");
        assert_eq!(ids(&slot), vec![Some(71), Some(72)]);
    }

    #[tokio::test]
    async fn unknown_index_is_rejected_locally() {
        let api = FakeBackend::new();

        assert!(delete_item(&slot(), &api, 9).await.is_err());
        assert!(save_item(&slot(), &api, 9, "", "", None).await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_editor_makes_no_request() {
        let api = FakeBackend::new();

        assert_eq!(delete_item(&Gone, &api, 0).await.unwrap(), None);
        assert_eq!(save_item(&Gone, &api, 0, "Alt", "", None).await.unwrap(), None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn save_sends_the_replacement_and_clears_it() {
        let api = FakeBackend::new();
        let slot = slot();

        let saved = save_item(&slot, &api, 1, " Herd at the tank ", "", Some(jpeg("herd.jpg")))
            .await
            .unwrap();
        let Some(ItemSave::Sent(reply)) = saved else {
            panic!("expected a sent item, got {saved:?}");
        };
        assert_eq!(reply.message.as_deref(), Some("Image updated"));
        assert!(slot.lock().unwrap().pending_replacements().is_empty());
        assert_eq!(slot.lock().unwrap().items()[1].alt_text, "Herd at the tank");

        let sent = api.payloads_for("update_experience_image");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text_value("alt_text"), Some("Herd at the tank"));
        assert_eq!(sent[0].text_value("sort_order"), Some("2"));
        assert_eq!(sent[0].files("image")[0].filename, "herd.jpg");
    }

    #[tokio::test]
    async fn new_items_wait_for_the_package() {
        let api = FakeBackend::new();
        let slot = slot();
        let index = slot.lock().unwrap().add_new(jpeg("new.jpg"), "", "");

        let saved = save_item(&slot, &api, index, "Lagoon", "", None).await.unwrap();
        assert_eq!(saved, Some(ItemSave::Queued));
        assert_eq!(slot.lock().unwrap().items()[index].alt_text, "Lagoon");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_keeps_images_added_during_the_call() {
        let api = FakeBackend::new();
        let slot = Contended::new();

        let removal = delete_item(&slot, &api, 0).await.unwrap();
        assert_eq!(removal, Some(Removal::Remote(71)));

        let editor = slot.editor.lock().unwrap();
        let kept: Vec<_> = editor.items().iter().map(|item| item.alt_text.as_str()).collect();
        assert_eq!(editor.len(), 2);
        assert_eq!(editor.items()[0].id, Some(72));
        assert!(kept.contains(&"Added meanwhile"));
    }

    #[tokio::test]
    async fn save_keeps_images_added_during_the_call() {
        let api = FakeBackend::new();
        let slot = Contended::new();

        let saved = save_item(&slot, &api, 1, "Elephants", "", Some(jpeg("herd.jpg")))
            .await
            .unwrap();
        assert!(matches!(saved, Some(ItemSave::Sent(_))));

        let editor = slot.editor.lock().unwrap();
        assert_eq!(editor.len(), 3);
        assert!(editor.pending_replacements().is_empty());
        assert_eq!(editor.items()[2].alt_text, "Added meanwhile");
    }
}
