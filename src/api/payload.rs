use serde::Serialize;

/// File chosen in a form and not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    File(Upload),
}

/// Ordered `multipart/form-data` body. Kept as plain data so assembly can be
/// inspected before the transport turns it into a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<(String, Part)>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parts.push((name.into(), Part::Text(value.into())));
        self
    }

    pub fn file(&mut self, name: impl Into<String>, upload: Upload) -> &mut Self {
        self.parts.push((name.into(), Part::File(upload)));
        self
    }

    /// JSON-stringified field, the shape the server expects for arrays.
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self, serde_json::Error> {
        let encoded = serde_json::to_string(value)?;
        Ok(self.text(name, encoded))
    }

    /// Method override for servers that only accept POST with multipart.
    pub fn method_override(&mut self, method: &str) -> &mut Self {
        self.text("_method", method)
    }

    pub fn parts(&self) -> &[(String, Part)] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<(String, Part)> {
        self.parts
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|(n, part)| match part {
            Part::Text(value) if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn files(&self, name: &str) -> Vec<&Upload> {
        self.parts
            .iter()
            .filter_map(|(n, part)| match part {
                Part::File(upload) if n == name => Some(upload),
                _ => None,
            })
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn json_value(&self, name: &str) -> Option<serde_json::Value> {
        self.text_value(name)
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_repeated_names() {
        let mut payload = MultipartPayload::new();
        payload
            .text("title", "Ella")
            .file("images[]", Upload::new("a.jpg", "image/jpeg", vec![1]))
            .file("images[]", Upload::new("b.jpg", "image/jpeg", vec![2]))
            .method_override("PUT");

        assert_eq!(payload.parts().len(), 4);
        assert_eq!(payload.text_value("_method"), Some("PUT"));
        let files = payload.files("images[]");
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].filename, "b.jpg");
    }

    #[test]
    fn json_fields_are_stringified() {
        let mut payload = MultipartPayload::new();
        payload
            .json("highlights", &serde_json::json!([{"title": "Birds", "sort_order": 1}]))
            .unwrap();

        let raw = payload.text_value("highlights").unwrap();
        assert!(raw.starts_with("[{") && !raw.contains('\n'));
        let parsed = payload.json_value("highlights").unwrap();
        assert_eq!(parsed[0]["sort_order"], 1);
        assert_eq!(parsed[0]["title"], "Birds");
    }
}
