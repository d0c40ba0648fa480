//! Per-session in-memory state: toast queue and wizard drafts.
//!
//! Nothing here is persisted; a restart drops every draft.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sapphire_trails::common::FieldErrors;
use sapphire_trails::db::SessionId;
use sapphire_trails::services::{FormState, GalleryEditor, WizardController, slug::SlugTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
}

impl ToastKind {
    pub fn css(&self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
            Self::Warning => "toast-warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardKind {
    LocationCreate,
    LocationEdit,
    PackageCreate,
    PackageEdit,
}

/// One wizard instance in progress.
#[derive(Debug, Clone)]
pub struct Draft {
    pub controller: WizardController,
    pub state: FormState,
    pub errors: FieldErrors,
    pub slug: SlugTracker,
    pub gallery: GalleryEditor,
    /// Slug or id of the record being edited.
    pub target: Option<String>,
    pub submitting: bool,
}

impl Draft {
    pub fn new(controller: WizardController, state: FormState, slug: SlugTracker) -> Self {
        Self {
            controller,
            state,
            errors: FieldErrors::new(),
            slug,
            gallery: GalleryEditor::default(),
            target: None,
            submitting: false,
        }
    }

    pub fn targets(&self, target: Option<&str>) -> bool {
        self.target.as_deref() == target
    }
}

#[derive(Debug)]
struct Bucket {
    toasts: Vec<Toast>,
    drafts: HashMap<WizardKind, Draft>,
    in_flight: HashSet<&'static str>,
    last_seen: Instant,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            toasts: Vec::new(),
            drafts: HashMap::new(),
            in_flight: HashSet::new(),
            last_seen: Instant::now(),
        }
    }
}

pub struct SessionRegistry {
    buckets: Mutex<HashMap<SessionId, Bucket>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn with_bucket<R>(&self, sid: SessionId, f: impl FnOnce(&mut Bucket) -> R) -> R {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let bucket = buckets.entry(sid).or_default();
        bucket.last_seen = Instant::now();
        f(bucket)
    }

    pub fn push_toast(&self, sid: SessionId, kind: ToastKind, message: impl Into<String>) {
        let message = message.into();
        self.with_bucket(sid, |b| b.toasts.push(Toast { kind, message }));
    }

    pub fn take_toasts(&self, sid: SessionId) -> Vec<Toast> {
        self.with_bucket(sid, |b| std::mem::take(&mut b.toasts))
    }

    pub fn draft(&self, sid: SessionId, kind: WizardKind) -> Option<Draft> {
        self.with_bucket(sid, |b| b.drafts.get(&kind).cloned())
    }

    pub fn put_draft(&self, sid: SessionId, kind: WizardKind, draft: Draft) {
        self.with_bucket(sid, |b| {
            b.drafts.insert(kind, draft);
        });
    }

    pub fn remove_draft(&self, sid: SessionId, kind: WizardKind) {
        self.with_bucket(sid, |b| {
            b.drafts.remove(&kind);
        });
    }

    pub fn update_draft<R>(
        &self,
        sid: SessionId,
        kind: WizardKind,
        f: impl FnOnce(&mut Draft) -> R,
    ) -> Option<R> {
        self.with_bucket(sid, |b| b.drafts.get_mut(&kind).map(f))
    }

    /// Marks a one-shot action (e.g. a booking submit) as running. Returns
    /// `None` if it already is; the action ends when the guard drops.
    pub fn try_begin(&self, sid: SessionId, action: &'static str) -> Option<InFlight<'_>> {
        self.with_bucket(sid, |b| b.in_flight.insert(action))
            .then(|| InFlight {
                registry: self,
                sid,
                held: Held::Action(action),
            })
    }

    /// Takes over the `submitting` flag that [`advance`] raised on a draft.
    /// Dropping the guard lowers it again, even if the request is cancelled.
    ///
    /// [`advance`]: crate::web::wizard::advance
    pub fn hold_submit(&self, sid: SessionId, kind: WizardKind) -> InFlight<'_> {
        InFlight {
            registry: self,
            sid,
            held: Held::Submit(kind),
        }
    }

    /// Unlike `with_bucket`, never recreates a session that was forgotten.
    fn release(&self, sid: SessionId, held: Held) {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(bucket) = buckets.get_mut(&sid) else {
            return;
        };
        match held {
            Held::Action(action) => {
                bucket.in_flight.remove(action);
            }
            Held::Submit(kind) => {
                if let Some(draft) = bucket.drafts.get_mut(&kind) {
                    draft.submitting = false;
                }
            }
        }
    }

    /// Drops the in-memory state of a session, e.g. after logout.
    pub fn forget(&self, sid: SessionId) {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        buckets.remove(&sid);
    }

    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = buckets.len();
        buckets.retain(|_, b| b.last_seen.elapsed() < max_idle);
        before - buckets.len()
    }
}

#[derive(Debug, Clone, Copy)]
enum Held {
    Action(&'static str),
    Submit(WizardKind),
}

/// A running action or draft submit, released on drop.
#[must_use]
pub struct InFlight<'a> {
    registry: &'a SessionRegistry,
    sid: SessionId,
    held: Held,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.registry.release(self.sid, self.held);
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
