use crate::command::{Command, Navigate};
use crate::input::Action;
use crate::views::ViewId;

pub const MENU_ITEMS: &[&str] = &["Manage Targets", "Exit"];

#[derive(Debug, Default)]
pub struct MainMenuView {
    selected: usize,
}

impl MainMenuView {
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn handle(&mut self, action: Action) -> Vec<Command> {
        match action {
            Action::MoveUp => self.selected = self.selected.saturating_sub(1),
            Action::MoveDown => self.selected = (self.selected + 1).min(MENU_ITEMS.len() - 1),
            Action::Home => self.selected = 0,
            Action::End => self.selected = MENU_ITEMS.len() - 1,
            Action::Select => {
                return match self.selected {
                    0 => vec![Command::Navigate(Navigate::to(ViewId::Targets))],
                    _ => vec![Command::Quit],
                }
            }
            _ => {}
        }
        Vec::new()
    }
}
