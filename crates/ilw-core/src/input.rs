use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveUp,
    MoveDown,
    ToggleSelect,
    Refresh,
    NextPage,
    PreviousPage,
    CycleTab,
    SelectTab(usize),
    CycleSort,
    Resolve,
    Ignore,
    MarkReviewed,
    Undo,
    ToggleRealtime,
    OpenBrowser,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub has_error: bool,
    pub is_loading: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Char(' ') => Action::ToggleSelect,
        KeyCode::Char('r') if !ctx.is_loading => Action::Refresh,
        KeyCode::Right | KeyCode::Char('n' | ']') => Action::NextPage,
        KeyCode::Left | KeyCode::Char('p' | '[') => Action::PreviousPage,
        KeyCode::Tab => Action::CycleTab,
        KeyCode::Char('s') => Action::CycleSort,
        KeyCode::Char('x') => Action::Resolve,
        KeyCode::Char('i') => Action::Ignore,
        KeyCode::Char('m') => Action::MarkReviewed,
        KeyCode::Char('u') => Action::Undo,
        KeyCode::Char('t') => Action::ToggleRealtime,
        KeyCode::Char('o') | KeyCode::Enter => Action::OpenBrowser,
        KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
            Action::SelectTab((c as u8 - b'1') as usize)
        }
        _ => Action::None,
    }
}
