use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    error::FieldError,
    proc::{CellState, Field},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleRun,
    Step,
    Reset,
    Slower,
    Faster,
    ZoomIn,
    ZoomOut,
    Pan(isize, isize),
    Save,
    Load,
    CycleAlive,
    CycleDead,
    CycleBorder,
    ToggleCounts,
    Quit,
}

impl Command {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Command::Quit),
                _ => None,
            };
        }

        let c = match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') => Command::ToggleRun,
            KeyCode::Char('s') | KeyCode::Char('n') => Command::Step,
            KeyCode::Char('r') => Command::Reset,
            KeyCode::Char('j') => Command::Slower,
            KeyCode::Char('k') => Command::Faster,
            KeyCode::Char('=') | KeyCode::Char('+') => Command::ZoomIn,
            KeyCode::Char('-') => Command::ZoomOut,
            KeyCode::Left => Command::Pan(-1, 0),
            KeyCode::Right => Command::Pan(1, 0),
            KeyCode::Up => Command::Pan(0, -1),
            KeyCode::Down => Command::Pan(0, 1),
            KeyCode::Char('w') => Command::Save,
            KeyCode::Char('l') => Command::Load,
            KeyCode::Char('1') => Command::CycleAlive,
            KeyCode::Char('2') => Command::CycleDead,
            KeyCode::Char('3') => Command::CycleBorder,
            KeyCode::Char('h') => Command::ToggleCounts,
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            _ => return None,
        };
        Some(c)
    }
}

/// One press-drag-release painting gesture.
///
/// The first touched cell is flipped and its new state becomes the state
/// painted onto every other cell the pointer crosses until release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stroke {
    target: Option<CellState>,
    last: Option<(usize, usize)>,
}

impl Stroke {
    #[inline]
    pub fn active(&self) -> bool {
        self.target.is_some()
    }

    pub fn press(&mut self, field: &mut Field, x: usize, y: usize) -> Result<CellState, FieldError> {
        let state = field.toggle(x, y)?;
        self.target = Some(state);
        self.last = Some((x, y));
        Ok(state)
    }

    /// Returns whether the cell changed.
    pub fn drag(&mut self, field: &mut Field, x: usize, y: usize) -> Result<bool, FieldError> {
        let Some(target) = self.target else {
            return Ok(false);
        };
        if self.last == Some((x, y)) {
            return Ok(false);
        }
        self.last = Some((x, y));

        let cell = field.get_cell_mut(x, y)?;
        if cell.state() == target {
            Ok(false)
        } else {
            cell.set_state(target);
            Ok(true)
        }
    }

    #[inline]
    pub fn release(&mut self) {
        *self = Stroke::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn keys() {
        let none = KeyModifiers::NONE;
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('p'), none)),
            Some(Command::ToggleRun)
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Left, none)),
            Some(Command::Pan(-1, 0))
        );
        assert_eq!(Command::from_key(&press(KeyCode::Char('z'), none)), None);
    }

    #[test]
    fn stroke_paints_opposite_of_first_cell() {
        let mut f = Field::new(4, 4).unwrap();
        f.set_state(2, 0, CellState::Alive).unwrap();

        let mut s = Stroke::default();
        assert_eq!(s.press(&mut f, 0, 0).unwrap(), CellState::Alive);
        assert!(s.drag(&mut f, 1, 0).unwrap());
        // already alive, left alone
        assert!(!s.drag(&mut f, 2, 0).unwrap());
        assert!(s.drag(&mut f, 3, 0).unwrap());
        s.release();
        assert!(!s.active());
        assert_eq!(f.alive_cells(), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);

        // now erasing
        assert_eq!(s.press(&mut f, 1, 0).unwrap(), CellState::Dead);
        s.drag(&mut f, 2, 0).unwrap();
        s.drag(&mut f, 2, 1).unwrap();
        assert_eq!(f.alive_cells(), vec![(0, 0), (3, 0)]);
    }

    #[test]
    fn drag_without_press_does_nothing() {
        let mut f = Field::new(2, 2).unwrap();
        let mut s = Stroke::default();
        assert!(!s.drag(&mut f, 0, 0).unwrap());
        assert_eq!(f.population(), 0);
    }

    #[test]
    fn press_out_of_bounds() {
        let mut f = Field::new(2, 2).unwrap();
        let mut s = Stroke::default();
        assert!(s.press(&mut f, 2, 0).is_err());
        assert!(!s.active());
    }
}
