//! Per-view state machines.
//!
//! Each view owns its list, cursor, search and in-flight operation. Views
//! change only through their own transition methods, which return the
//! [`Command`](crate::command::Command)s the router should carry out.

pub mod add_target;
pub mod auth;
pub mod banner;
pub mod builds;
pub mod jobs;
pub mod list;
pub mod main_menu;
pub mod pipelines;
pub mod resources;
pub mod targets;

pub use banner::{Activity, Banner, BannerKind};
pub use list::{ListItem, ListState, SearchState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewId {
    #[default]
    MainMenu,
    Targets,
    Pipelines,
    Jobs,
    Resources,
    Builds,
    AddTarget,
    Auth,
}

impl ViewId {
    /// Hierarchical parent for back navigation. Roots have none.
    pub fn parent(self) -> Option<ViewId> {
        match self {
            ViewId::MainMenu | ViewId::Targets => None,
            ViewId::Pipelines | ViewId::AddTarget | ViewId::Auth => Some(ViewId::Targets),
            ViewId::Jobs | ViewId::Resources => Some(ViewId::Pipelines),
            ViewId::Builds => Some(ViewId::Jobs),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewId::MainMenu => "Main Menu",
            ViewId::Targets => "Targets",
            ViewId::Pipelines => "Pipelines",
            ViewId::Jobs => "Jobs",
            ViewId::Resources => "Resources",
            ViewId::Builds => "Builds",
            ViewId::AddTarget => "Add Target",
            ViewId::Auth => "Authentication",
        }
    }
}

/// Loading state of a list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing requested yet.
    #[default]
    Idle,
    Loading,
    Ready,
}
