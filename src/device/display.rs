//! Frame buffer standing in for the LED matrix.

use std::fmt;

use crate::game::{DisplaySurface, Position};
use crate::protocol::constants::{NUM_COLUMNS, NUM_ROWS};

const COLUMNS: usize = NUM_COLUMNS as usize;
const ROWS: usize = NUM_ROWS as usize;

/// The lit cells of the matrix, or the text it scrolls.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LedMatrix {
    cells: [[bool; COLUMNS]; ROWS],
    text: Option<String>,
}

impl LedMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl DisplaySurface for LedMatrix {
    fn clear(&mut self) {
        self.cells = [[false; COLUMNS]; ROWS];
        self.text = None;
    }

    fn plot(&mut self, position: Position, on: bool) {
        self.text = None;
        self.cells[usize::from(position.row())][usize::from(position.column())] = on;
    }

    fn show_text(&mut self, text: &str) {
        if self.text.as_deref() != Some(text) {
            self.cells = [[false; COLUMNS]; ROWS];
            self.text = Some(String::from(text));
        }
    }
}

impl fmt::Display for LedMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.text {
            return write!(f, "<< {text} >>");
        }
        for (index, row) in self.cells.iter().enumerate() {
            if index != 0 {
                writeln!(f)?;
            }
            for &lit in row {
                write!(f, "{}", if lit { '#' } else { '.' })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_and_render() {
        let mut matrix = LedMatrix::new();
        matrix.plot(Position::new(4, 0), true);
        matrix.plot(Position::new(0, 6), true);
        assert_eq!(
            matrix.to_string(),
            "....#\n.....\n.....\n.....\n.....\n.....\n#...."
        );
        matrix.plot(Position::new(4, 0), false);
        matrix.plot(Position::new(0, 6), false);
        assert_eq!(matrix, LedMatrix::new());
    }

    #[test]
    fn text_replaces_cells() {
        let mut matrix = LedMatrix::new();
        matrix.plot(Position::new(1, 1), true);
        matrix.show_text("TIE");
        assert_eq!(matrix.text(), Some("TIE"));
        assert_eq!(matrix.to_string(), "<< TIE >>");
        matrix.plot(Position::new(1, 1), true);
        assert_eq!(matrix.text(), None);
        matrix.clear();
        assert_eq!(matrix, LedMatrix::new());
    }
}
