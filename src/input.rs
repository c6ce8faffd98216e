use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Refresh,
    Quit,
}

pub fn parse_main_command(key_code: &KeyCode) -> Option<UiCommand> {
    match key_code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'r' => Some(UiCommand::Refresh),
            'q' => Some(UiCommand::Quit),
            _ => None,
        },
        KeyCode::F(5) => Some(UiCommand::Refresh),
        KeyCode::Esc => Some(UiCommand::Quit),
        _ => None,
    }
}
