//! Filterable, scrollable list shared by every list view.
//!
//! The filtered list is a vector of indices into `items`, so it is always a
//! subset of the loaded entities in their original order. `selected` indexes
//! the filtered list and is kept in bounds after every mutation.

use crate::input::Action;

pub const DEFAULT_VIEWPORT: usize = 10;

pub trait ListItem {
    /// Stable identity used to keep the cursor on the same entity across reloads.
    fn key(&self) -> &str;

    /// `needle` is already lowercased and non-empty.
    fn matches(&self, needle: &str) -> bool;
}

/// Case-insensitive substring test over a set of fields.
pub fn any_field_contains(fields: &[&str], needle: &str) -> bool {
    fields.iter().any(|f| f.to_lowercase().contains(needle))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub active: bool,
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct ListState<T> {
    items: Vec<T>,
    filtered: Vec<usize>,
    selected: usize,
    scroll: usize,
    viewport: usize,
    search: SearchState,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            selected: 0,
            scroll: 0,
            viewport: DEFAULT_VIEWPORT,
            search: SearchState::default(),
        }
    }
}

impl<T: ListItem> ListState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn visible(&self) -> impl Iterator<Item = &T> {
        self.filtered.iter().map(|&i| &self.items[i])
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// `None` when the filtered list is empty.
    pub fn selected_index(&self) -> Option<usize> {
        (!self.filtered.is_empty()).then_some(self.selected)
    }

    pub fn selected(&self) -> Option<&T> {
        self.filtered.get(self.selected).map(|&i| &self.items[i])
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Replaces the loaded entities. With `keep_selection` the cursor stays on
    /// the same entity when it is still present; otherwise it goes to the top.
    pub fn replace(&mut self, items: Vec<T>, keep_selection: bool) {
        let previous = keep_selection
            .then(|| self.selected().map(|item| item.key().to_string()))
            .flatten();
        self.items = items;
        self.selected = 0;
        self.scroll = 0;
        self.refilter(previous.as_deref());
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.filtered.clear();
        self.selected = 0;
        self.scroll = 0;
    }

    /// Drops entities and search for a brand-new context.
    pub fn reset(&mut self) {
        self.clear();
        self.search = SearchState::default();
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.ensure_visible();
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.filtered.len() {
            self.selected += 1;
            self.ensure_visible();
        }
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(self.viewport);
        self.ensure_visible();
    }

    pub fn page_down(&mut self) {
        if !self.filtered.is_empty() {
            self.selected = (self.selected + self.viewport).min(self.filtered.len() - 1);
            self.ensure_visible();
        }
    }

    pub fn home(&mut self) {
        self.selected = 0;
        self.ensure_visible();
    }

    pub fn end(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
        self.ensure_visible();
    }

    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        self.ensure_visible();
    }

    pub fn start_search(&mut self) {
        self.search.active = true;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.query.push(c);
        self.refilter_keeping_cursor();
    }

    pub fn pop_search_char(&mut self) {
        if self.search.query.pop().is_some() {
            self.refilter_keeping_cursor();
        }
    }

    pub fn clear_search_query(&mut self) {
        if !self.search.query.is_empty() {
            self.search.query.clear();
            self.refilter_keeping_cursor();
        }
    }

    /// Leaves search mode keeping the filter and the cursor.
    pub fn confirm_search(&mut self) {
        self.search.active = false;
    }

    /// Leaves search mode, restores the full list and goes back to the top.
    pub fn cancel_search(&mut self) {
        self.search = SearchState::default();
        self.selected = 0;
        self.scroll = 0;
        self.refilter(None);
    }

    /// Applies cursor and search actions. Returns `false` for anything else so
    /// the owning view can handle it.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::MoveUp => self.move_up(),
            Action::MoveDown => self.move_down(),
            Action::PageUp => self.page_up(),
            Action::PageDown => self.page_down(),
            Action::Home => self.home(),
            Action::End => self.end(),
            Action::StartSearch => self.start_search(),
            Action::SearchInput(c) => self.push_search_char(c),
            Action::SearchBackspace => self.pop_search_char(),
            Action::SearchClear => self.clear_search_query(),
            Action::SearchConfirm => self.confirm_search(),
            Action::SearchCancel => self.cancel_search(),
            _ => return false,
        }
        true
    }

    fn refilter_keeping_cursor(&mut self) {
        let previous = self.selected().map(|item| item.key().to_string());
        self.refilter(previous.as_deref());
    }

    fn refilter(&mut self, keep: Option<&str>) {
        let needle = self.search.query.to_lowercase();
        self.filtered = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| needle.is_empty() || item.matches(&needle))
            .map(|(i, _)| i)
            .collect();

        self.selected = keep
            .and_then(|key| {
                self.filtered
                    .iter()
                    .position(|&i| self.items[i].key() == key)
            })
            .unwrap_or(0);
        self.ensure_visible();
    }

    fn ensure_visible(&mut self) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + self.viewport {
            self.scroll = self.selected + 1 - self.viewport;
        }
        let max_scroll = self.filtered.len().saturating_sub(self.viewport);
        self.scroll = self.scroll.min(max_scroll);
    }
}
