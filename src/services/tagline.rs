//! Marketing taglines for the home hero and the tours call-to-action.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::common::ApiError;

const MESSAGES_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const MAX_TAGLINE_CHARS: usize = 120;
/// How long a fallback stands in after a failed call.
const RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaglineSection {
    HomeHero,
    ToursCta,
}

impl TaglineSection {
    fn prompt(&self) -> &'static str {
        match self {
            Self::HomeHero => {
                "Write one short, evocative tagline (under 12 words) for the homepage hero \
                 of Sapphire Trails, a tour company showing travellers the rainforests, \
                 hill country, wildlife and coasts of Sri Lanka."
            }
            Self::ToursCta => {
                "Write one short call-to-action line (under 12 words) inviting visitors to \
                 book a guided Sapphire Trails tour in Sri Lanka."
            }
        }
    }

    pub fn fallback(&self) -> &'static str {
        match self {
            Self::HomeHero => "Discover the untold wonders of Sri Lanka",
            Self::ToursCta => "Your next adventure in paradise starts here",
        }
    }
}

#[async_trait]
pub trait TaglineSource: Send + Sync {
    /// Always yields a line; failures fall back to a fixed tagline.
    async fn tagline(&self, section: TaglineSection) -> String;
}

/// Fixed taglines, used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTaglines;

#[async_trait]
impl TaglineSource for StaticTaglines {
    async fn tagline(&self, section: TaglineSection) -> String {
        section.fallback().to_string()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.as_str())
    }
}

/// First non-empty line, without wrapping quotes, capped in length.
pub fn clean_tagline(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '*'))
        .trim();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(MAX_TAGLINE_CHARS).collect())
}

/// One completion call for a section's tagline.
#[async_trait]
trait TaglineModel: Send + Sync {
    async fn complete(&self, section: TaglineSection) -> Result<String, ApiError>;
}

struct MessagesModel {
    http: Client,
    api_key: String,
    model: String,
}

#[async_trait]
impl TaglineModel for MessagesModel {
    async fn complete(&self, section: TaglineSection) -> Result<String, ApiError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 60,
            system: "You write concise travel marketing copy. Reply with the tagline only.",
            messages: [ChatMessage {
                role: "user",
                content: section.prompt(),
            }],
        };

        let response = self
            .http
            .post(MESSAGES_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: Some(body),
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        body.text()
            .and_then(clean_tagline)
            .ok_or_else(|| ApiError::Decode("no text block in response".to_string()))
    }
}

#[derive(Debug, Clone)]
struct Cached {
    line: String,
    expires_at: Instant,
}

/// Taglines generated by a hosted LLM, cached per section. A failed call
/// caches the fallback for a minute at most, and concurrent misses for one
/// section share a single call.
pub struct GeneratedTaglines {
    model: Box<dyn TaglineModel>,
    ttl: Duration,
    /// Indexed by `TaglineSection as usize`; held across the call.
    sections: [AsyncMutex<Option<Cached>>; 2],
}

impl GeneratedTaglines {
    pub fn new(api_key: String, model: Option<String>, ttl: Duration, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sapphire-trails/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let model = MessagesModel {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };
        Ok(Self::with_model(Box::new(model), ttl))
    }

    fn with_model(model: Box<dyn TaglineModel>, ttl: Duration) -> Self {
        Self {
            model,
            ttl,
            sections: [AsyncMutex::new(None), AsyncMutex::new(None)],
        }
    }
}

#[async_trait]
impl TaglineSource for GeneratedTaglines {
    async fn tagline(&self, section: TaglineSection) -> String {
        let mut slot = self.sections[section as usize].lock().await;
        if let Some(cached) = slot.as_ref().filter(|c| c.expires_at > Instant::now()) {
            return cached.line.clone();
        }

        let (line, keep_for) = match self.model.complete(section).await {
            Ok(line) => (line, self.ttl),
            Err(err) => {
                log::warn!("Tagline generation for {:?} failed: {}", section, err);
                (section.fallback().to_string(), self.ttl.min(RETRY_AFTER))
            }
        };
        *slot = Some(Cached {
            line: line.clone(),
            expires_at: Instant::now() + keep_for,
        });
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn cleans_model_output() {
        assert_eq!(
            clean_tagline("\n\"Where emerald hills meet sapphire seas\"\nExtra").as_deref(),
            Some("Where emerald hills meet sapphire seas")
        );
        assert_eq!(clean_tagline("  \n ** \n"), None);
        assert_eq!(clean_tagline(&"a".repeat(300)).map(|s| s.len()), Some(MAX_TAGLINE_CHARS));
    }

    #[test]
    fn reads_first_text_block() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking"},{"type":"text","text":"Wander wild Sri Lanka"}]}"#,
        )
        .unwrap();
        assert_eq!(body.text(), Some("Wander wild Sri Lanka"));
    }

    #[tokio::test]
    async fn static_source_returns_fallbacks() {
        let source = StaticTaglines;
        assert_eq!(
            source.tagline(TaglineSection::ToursCta).await,
            TaglineSection::ToursCta.fallback()
        );
    }

    /// Counts calls; fails, or answers after a short delay.
    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl TaglineModel for Counting {
        async fn complete(&self, section: TaglineSection) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(ApiError::Timeout);
            }
            Ok(format!("Fresh line for {section:?}"))
        }
    }

    fn counting(fail: bool, ttl: Duration) -> (GeneratedTaglines, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = Counting {
            calls: calls.clone(),
            fail,
        };
        (GeneratedTaglines::with_model(Box::new(model), ttl), calls)
    }

    #[tokio::test]
    async fn cache_hit_skips_the_network() {
        let (source, calls) = counting(false, Duration::from_secs(60));
        assert_eq!(source.tagline(TaglineSection::HomeHero).await, "Fresh line for HomeHero");
        assert_eq!(source.tagline(TaglineSection::HomeHero).await, "Fresh line for HomeHero");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        source.tagline(TaglineSection::ToursCta).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_provider_is_called_once() {
        let (source, calls) = counting(true, Duration::from_secs(3600));
        let fallback = TaglineSection::HomeHero.fallback();
        assert_eq!(source.tagline(TaglineSection::HomeHero).await, fallback);
        assert_eq!(source.tagline(TaglineSection::HomeHero).await, fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_call() {
        let (source, calls) = counting(false, Duration::from_secs(60));
        let (a, b) = tokio::join!(
            source.tagline(TaglineSection::ToursCta),
            source.tagline(TaglineSection::ToursCta)
        );
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_lines_are_generated_again() {
        let (source, calls) = counting(false, Duration::ZERO);
        source.tagline(TaglineSection::HomeHero).await;
        source.tagline(TaglineSection::HomeHero).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
