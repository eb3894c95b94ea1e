use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Terminal-side input to the app loop
#[derive(Debug, Clone)]
pub enum Event {
    /// First event after startup; mounts the list.
    Init,
    Tick,
    Render,
    /// New terminal size in rows
    Resize(u16),
    Key(KeyEvent),
}

impl Event {
    pub fn is_quit(&self) -> bool {
        match self {
            Event::Key(key) => {
                key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
            }
            _ => false,
        }
    }
}
