use crate::command::{Command, TimerEvent};
use crate::views::ViewId;
use std::time::Duration;

/// How long a result banner stays up before its clear timer fires.
pub const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    /// `fly` ran and said no.
    Rejected,
    /// `fly` could not be asked, or local validation failed.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: u64,
    pub kind: BannerKind,
    pub text: String,
}

/// In-flight operation and result banner of one view.
///
/// A view runs at most one mutating operation at a time. Each banner gets a
/// fresh id and its clear timer carries that id, so a late timer never wipes
/// a newer banner.
#[derive(Debug, Default)]
pub struct Activity {
    in_flight: Option<String>,
    banner: Option<Banner>,
    next_id: u64,
}

impl Activity {
    /// Marks `label` as in flight. Returns `false`, changing nothing, when
    /// another operation is still running.
    pub fn begin(&mut self, label: impl Into<String>) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(label.into());
        self.banner = None;
        true
    }

    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Completes the operation for `label`. Results for anything other than
    /// the operation in flight are dropped and yield `None`.
    pub fn finish(&mut self, label: &str, kind: BannerKind, text: impl Into<String>) -> Option<u64> {
        if self.in_flight.as_deref() != Some(label) {
            tracing::debug!(label, in_flight = ?self.in_flight, "dropping result for operation not in flight");
            return None;
        }
        self.in_flight = None;
        Some(self.show(kind, text))
    }

    /// Shows a banner without an operation, e.g. for a local validation error.
    pub fn show(&mut self, kind: BannerKind, text: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.banner = Some(Banner {
            id: self.next_id,
            kind,
            text: text.into(),
        });
        self.next_id
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Clears the banner only if it is still the one the timer was set for.
    pub fn clear_banner(&mut self, id: u64) {
        if self.banner.as_ref().is_some_and(|b| b.id == id) {
            self.banner = None;
        }
    }

    pub fn dismiss(&mut self) {
        self.banner = None;
    }

    /// Forgets the operation and banner of a context the view is leaving.
    /// Ids keep counting so timers set for the old context stay stale.
    pub fn abandon(&mut self) {
        if let Some(label) = self.in_flight.take() {
            tracing::debug!(label, "abandoning operation of previous context");
        }
        self.banner = None;
    }
}

pub fn clear_later(view: ViewId, id: u64) -> Command {
    Command::Later {
        after: BANNER_TTL,
        event: TimerEvent::ClearBanner { view, id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_operation_in_flight() {
        let mut activity = Activity::default();
        assert!(activity.begin("deploy/build"));
        assert!(!activity.begin("deploy/test"));
        assert_eq!(activity.in_flight(), Some("deploy/build"));
    }

    #[test]
    fn finish_sets_banner_and_frees_slot() {
        let mut activity = Activity::default();
        activity.begin("deploy/build");
        let id = activity.finish("deploy/build", BannerKind::Success, "started #15");
        assert!(id.is_some());
        assert!(!activity.is_busy());
        assert_eq!(activity.banner().unwrap().text, "started #15");
        assert!(activity.begin("deploy/build"));
    }

    #[test]
    fn finish_for_other_label_is_ignored() {
        let mut activity = Activity::default();
        activity.begin("deploy/build");
        assert_eq!(activity.finish("deploy/test", BannerKind::Success, "x"), None);
        assert!(activity.is_busy());
        assert!(activity.banner().is_none());
    }

    #[test]
    fn stale_clear_keeps_newer_banner() {
        let mut activity = Activity::default();
        let first = activity.show(BannerKind::Error, "first");
        let second = activity.show(BannerKind::Success, "second");
        activity.clear_banner(first);
        assert_eq!(activity.banner().unwrap().text, "second");
        activity.clear_banner(second);
        assert!(activity.banner().is_none());
        activity.clear_banner(second);
        assert!(activity.banner().is_none());
    }

    #[test]
    fn abandon_frees_slot_and_keeps_counting() {
        let mut activity = Activity::default();
        activity.begin("deploy/build");
        let old = activity.finish("deploy/build", BannerKind::Success, "started #3").unwrap();
        activity.begin("deploy/test");
        activity.abandon();
        assert!(!activity.is_busy());
        assert!(activity.banner().is_none());

        let fresh = activity.show(BannerKind::Success, "newer");
        assert_ne!(fresh, old);
        activity.clear_banner(old);
        assert_eq!(activity.banner().unwrap().text, "newer");
    }
}
