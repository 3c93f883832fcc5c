use crate::views::ViewId;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Home,
    End,
    /// Enter on a list: the view's primary action.
    Select,
    Refresh,
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    SearchConfirm,
    SearchCancel,
    AddTarget,
    DeleteTarget,
    ToggleDetails,
    OpenJobs,
    OpenResources,
    TogglePause,
    OpenBuilds,
    ClearMessage,
    NextField,
    PrevField,
    FormInput(char),
    FormBackspace,
    FormClear,
    Submit,
    Retry,
    CopyCommand,
    Confirm,
    Decline,
    None,
}

/// State of the add-target form as far as key mapping cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Editing,
    Busy,
    Result {
        pending_auth: bool,
    },
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputContext {
    pub view: ViewId,
    pub searching: bool,
    pub form: FormMode,
    pub auth_busy: bool,
}

impl InputContext {
    /// True while typed characters are text rather than commands.
    pub fn captures_text(&self) -> bool {
        self.searching || (self.view == ViewId::AddTarget && self.form == FormMode::Editing)
    }
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Ctrl+C always quits
    if ctrl && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if ctx.searching {
        return match key.code {
            KeyCode::Enter => Action::SearchConfirm,
            KeyCode::Esc => Action::SearchCancel,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Char('u') if ctrl => Action::SearchClear,
            KeyCode::Char(c) if !ctrl => Action::SearchInput(c),
            _ => Action::None,
        };
    }

    match ctx.view {
        ViewId::AddTarget => return map_form_key(key, ctx.form, ctrl),
        ViewId::Auth => return map_auth_key(key, ctx.auth_busy),
        _ => {}
    }

    // Keys shared by every list view
    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Esc => return Action::Back,
        KeyCode::Up | KeyCode::Char('k') => return Action::MoveUp,
        KeyCode::PageUp => return Action::PageUp,
        KeyCode::PageDown => return Action::PageDown,
        KeyCode::Home | KeyCode::Char('g') => return Action::Home,
        KeyCode::End | KeyCode::Char('G') => return Action::End,
        _ => {}
    }

    if ctx.view == ViewId::MainMenu {
        return match key.code {
            KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Enter => Action::Select,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::F(5) => return Action::Refresh,
        KeyCode::Char('r') if ctrl => return Action::Refresh,
        KeyCode::Char('/' | 's') => return Action::StartSearch,
        KeyCode::Down => return Action::MoveDown,
        _ => {}
    }

    match ctx.view {
        ViewId::Targets => match key.code {
            KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Enter => Action::Select,
            KeyCode::Char('a') => Action::AddTarget,
            KeyCode::Char('d') => Action::DeleteTarget,
            KeyCode::Char('i') => Action::ToggleDetails,
            _ => Action::None,
        },
        // `j` opens jobs here, so only the arrow moves down.
        ViewId::Pipelines => match key.code {
            KeyCode::Enter | KeyCode::Char('j') => Action::OpenJobs,
            KeyCode::Char('r') => Action::OpenResources,
            KeyCode::Char('p') => Action::TogglePause,
            _ => Action::None,
        },
        ViewId::Jobs => match key.code {
            KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Enter | KeyCode::Char('t') => Action::Select,
            KeyCode::Char('b') => Action::OpenBuilds,
            KeyCode::Char('x') => Action::ClearMessage,
            _ => Action::None,
        },
        ViewId::Resources => match key.code {
            KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Enter | KeyCode::Char('c') => Action::Select,
            KeyCode::Char('x') => Action::ClearMessage,
            _ => Action::None,
        },
        ViewId::Builds => match key.code {
            KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Enter => Action::Select,
            KeyCode::Char('x') => Action::ClearMessage,
            _ => Action::None,
        },
        ViewId::MainMenu | ViewId::AddTarget | ViewId::Auth => Action::None,
    }
}

fn map_form_key(key: KeyEvent, mode: FormMode, ctrl: bool) -> Action {
    match mode {
        FormMode::Editing => match key.code {
            KeyCode::Esc => Action::Back,
            KeyCode::Tab => Action::NextField,
            KeyCode::BackTab => Action::PrevField,
            KeyCode::Enter => Action::Submit,
            KeyCode::Backspace => Action::FormBackspace,
            KeyCode::Char('u') if ctrl => Action::FormClear,
            KeyCode::Char(c) if !ctrl && (' '..='~').contains(&c) => Action::FormInput(c),
            _ => Action::None,
        },
        FormMode::Busy => match key.code {
            KeyCode::Esc => Action::Back,
            _ => Action::None,
        },
        FormMode::Result { pending_auth } => match key.code {
            KeyCode::Esc | KeyCode::Enter => Action::Back,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') if pending_auth => Action::Retry,
            KeyCode::Char('c') if pending_auth => Action::CopyCommand,
            _ => Action::None,
        },
    }
}

fn map_auth_key(key: KeyEvent, busy: bool) -> Action {
    if busy {
        return Action::None;
    }
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') => Action::Confirm,
        KeyCode::Char('n') => Action::Decline,
        KeyCode::Esc => Action::Back,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn ctx(view: ViewId) -> InputContext {
        InputContext {
            view,
            ..InputContext::default()
        }
    }

    fn searching(view: ViewId) -> InputContext {
        InputContext {
            view,
            searching: true,
            ..InputContext::default()
        }
    }

    fn form(mode: FormMode) -> InputContext {
        InputContext {
            view: ViewId::AddTarget,
            form: mode,
            ..InputContext::default()
        }
    }

    #[test]
    fn release_events_ignored() {
        assert_eq!(map_key(release(KeyCode::Char('q')), &ctx(ViewId::Jobs)), Action::None);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let key = press_with(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key, &ctx(ViewId::Jobs)), Action::Quit);
        assert_eq!(map_key(key, &searching(ViewId::Jobs)), Action::Quit);
        assert_eq!(map_key(key, &form(FormMode::Editing)), Action::Quit);
        let busy = InputContext {
            view: ViewId::Auth,
            auth_busy: true,
            ..InputContext::default()
        };
        assert_eq!(map_key(key, &busy), Action::Quit);
    }

    #[test]
    fn q_quits_outside_text_entry() {
        assert_eq!(map_key(press(KeyCode::Char('q')), &ctx(ViewId::Pipelines)), Action::Quit);
        assert_eq!(map_key(press(KeyCode::Char('q')), &ctx(ViewId::MainMenu)), Action::Quit);
    }

    #[test]
    fn q_is_text_while_searching_or_editing() {
        assert_eq!(
            map_key(press(KeyCode::Char('q')), &searching(ViewId::Jobs)),
            Action::SearchInput('q')
        );
        assert_eq!(
            map_key(press(KeyCode::Char('q')), &form(FormMode::Editing)),
            Action::FormInput('q')
        );
    }

    #[test]
    fn esc_cancels_search_before_going_back() {
        assert_eq!(map_key(press(KeyCode::Esc), &searching(ViewId::Builds)), Action::SearchCancel);
        assert_eq!(map_key(press(KeyCode::Esc), &ctx(ViewId::Builds)), Action::Back);
    }

    #[test]
    fn search_mode_keys() {
        let c = searching(ViewId::Targets);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::SearchConfirm);
        assert_eq!(map_key(press(KeyCode::Backspace), &c), Action::SearchBackspace);
        assert_eq!(
            map_key(press_with(KeyCode::Char('u'), KeyModifiers::CONTROL), &c),
            Action::SearchClear
        );
        assert_eq!(map_key(press(KeyCode::Char('j')), &c), Action::SearchInput('j'));
        assert_eq!(map_key(press(KeyCode::Up), &c), Action::None);
    }

    #[test]
    fn search_starts_with_slash_or_s() {
        for view in [ViewId::Targets, ViewId::Pipelines, ViewId::Jobs, ViewId::Resources, ViewId::Builds] {
            assert_eq!(map_key(press(KeyCode::Char('/')), &ctx(view)), Action::StartSearch);
            assert_eq!(map_key(press(KeyCode::Char('s')), &ctx(view)), Action::StartSearch);
        }
    }

    #[test]
    fn refresh_keys() {
        assert_eq!(map_key(press(KeyCode::F(5)), &ctx(ViewId::Jobs)), Action::Refresh);
        assert_eq!(
            map_key(press_with(KeyCode::Char('r'), KeyModifiers::CONTROL), &ctx(ViewId::Pipelines)),
            Action::Refresh
        );
        assert_eq!(map_key(press(KeyCode::F(5)), &ctx(ViewId::MainMenu)), Action::None);
    }

    #[test]
    fn pipelines_keys() {
        let c = ctx(ViewId::Pipelines);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::OpenJobs);
        assert_eq!(map_key(press(KeyCode::Char('j')), &c), Action::OpenJobs);
        assert_eq!(map_key(press(KeyCode::Char('r')), &c), Action::OpenResources);
        assert_eq!(map_key(press(KeyCode::Char('p')), &c), Action::TogglePause);
        assert_eq!(map_key(press(KeyCode::Down), &c), Action::MoveDown);
        assert_eq!(map_key(press(KeyCode::Char('k')), &c), Action::MoveUp);
    }

    #[test]
    fn jobs_keys() {
        let c = ctx(ViewId::Jobs);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::Select);
        assert_eq!(map_key(press(KeyCode::Char('t')), &c), Action::Select);
        assert_eq!(map_key(press(KeyCode::Char('b')), &c), Action::OpenBuilds);
        assert_eq!(map_key(press(KeyCode::Char('x')), &c), Action::ClearMessage);
        assert_eq!(map_key(press(KeyCode::Char('j')), &c), Action::MoveDown);
    }

    #[test]
    fn resources_keys() {
        let c = ctx(ViewId::Resources);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::Select);
        assert_eq!(map_key(press(KeyCode::Char('c')), &c), Action::Select);
        assert_eq!(map_key(press(KeyCode::Char('x')), &c), Action::ClearMessage);
    }

    #[test]
    fn targets_keys() {
        let c = ctx(ViewId::Targets);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::Select);
        assert_eq!(map_key(press(KeyCode::Char('a')), &c), Action::AddTarget);
        assert_eq!(map_key(press(KeyCode::Char('d')), &c), Action::DeleteTarget);
        assert_eq!(map_key(press(KeyCode::Char('i')), &c), Action::ToggleDetails);
    }

    #[test]
    fn form_editing_keys() {
        let c = form(FormMode::Editing);
        assert_eq!(map_key(press(KeyCode::Tab), &c), Action::NextField);
        assert_eq!(map_key(press(KeyCode::BackTab), &c), Action::PrevField);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::Submit);
        assert_eq!(map_key(press(KeyCode::Esc), &c), Action::Back);
        assert_eq!(map_key(press(KeyCode::Char('r')), &c), Action::FormInput('r'));
        assert_eq!(map_key(press(KeyCode::Char('é')), &c), Action::None);
        assert_eq!(
            map_key(press_with(KeyCode::Char('u'), KeyModifiers::CONTROL), &c),
            Action::FormClear
        );
    }

    #[test]
    fn form_result_keys() {
        let pending = form(FormMode::Result { pending_auth: true });
        assert_eq!(map_key(press(KeyCode::Char('r')), &pending), Action::Retry);
        assert_eq!(map_key(press(KeyCode::Char('c')), &pending), Action::CopyCommand);
        assert_eq!(map_key(press(KeyCode::Enter), &pending), Action::Back);

        let done = form(FormMode::Result { pending_auth: false });
        assert_eq!(map_key(press(KeyCode::Char('r')), &done), Action::None);
        assert_eq!(map_key(press(KeyCode::Char('c')), &done), Action::None);
    }

    #[test]
    fn auth_keys() {
        let c = ctx(ViewId::Auth);
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::Confirm);
        assert_eq!(map_key(press(KeyCode::Char('y')), &c), Action::Confirm);
        assert_eq!(map_key(press(KeyCode::Char('n')), &c), Action::Decline);
        assert_eq!(map_key(press(KeyCode::Esc), &c), Action::Back);
    }

    #[test]
    fn auth_ignores_keys_while_busy() {
        let c = InputContext {
            view: ViewId::Auth,
            auth_busy: true,
            ..InputContext::default()
        };
        assert_eq!(map_key(press(KeyCode::Enter), &c), Action::None);
        assert_eq!(map_key(press(KeyCode::Esc), &c), Action::None);
    }

    #[test]
    fn captures_text() {
        assert!(searching(ViewId::Jobs).captures_text());
        assert!(form(FormMode::Editing).captures_text());
        assert!(!form(FormMode::Busy).captures_text());
        assert!(!ctx(ViewId::Jobs).captures_text());
    }
}
