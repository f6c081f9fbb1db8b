//! The field engine: cells, the toroidal field and the B3/S23 generation step.

use crate::error::FieldError;

type Result<T> = std::result::Result<T, FieldError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    #[default]
    Dead,
    Alive,
}

impl CellState {
    #[inline]
    pub fn is_alive(self) -> bool {
        self == CellState::Alive
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            CellState::Dead => CellState::Alive,
            CellState::Alive => CellState::Dead,
        }
    }

    /// Applies B3/S23 to a cell in the given state with `n` live neighbours.
    #[inline]
    pub fn next(self, n: u8) -> Self {
        match (self, n) {
            (CellState::Alive, 2) | (CellState::Alive, 3) => CellState::Alive,
            (CellState::Dead, 3) => CellState::Alive,
            _ => CellState::Dead,
        }
    }
}

impl From<bool> for CellState {
    #[inline]
    fn from(alive: bool) -> Self {
        if alive {
            CellState::Alive
        } else {
            CellState::Dead
        }
    }
}

impl From<CellState> for u8 {
    #[inline]
    fn from(state: CellState) -> Self {
        match state {
            CellState::Dead => 0,
            CellState::Alive => 1,
        }
    }
}

impl TryFrom<u8> for CellState {
    type Error = FieldError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(CellState::Dead),
            1 => Ok(CellState::Alive),
            other => Err(FieldError::InvalidState(other.into())),
        }
    }
}

impl TryFrom<char> for CellState {
    type Error = FieldError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            '0' => Ok(CellState::Dead),
            '1' => Ok(CellState::Alive),
            other => Err(FieldError::InvalidState(other.into())),
        }
    }
}

/// One field position. The position is fixed at creation, only the state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    x: usize,
    y: usize,
    state: CellState,
}

impl Cell {
    #[inline]
    pub fn new(x: usize, y: usize, state: CellState) -> Self {
        Cell { x, y, state }
    }

    #[inline]
    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    #[inline]
    pub fn x(&self) -> usize {
        self.x
    }

    #[inline]
    pub fn y(&self) -> usize {
        self.y
    }

    #[inline]
    pub fn state(&self) -> CellState {
        self.state
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    #[inline]
    pub fn set_state(&mut self, state: CellState) {
        self.state = state;
    }

    /// Sets the state from its numeric form, rejecting anything but `0` and `1`.
    pub fn set_raw_state(&mut self, raw: u8) -> Result<()> {
        self.state = CellState::try_from(raw)?;
        Ok(())
    }
}

/// A fixed-size toroidal field of cells, stored row by row.
///
/// Column `size_x - 1` neighbours column `0` and the last row neighbours the
/// first one. Advancing a generation never touches `self`: [`Field::step`]
/// builds a complete replacement from the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    size_x: usize,
    size_y: usize,
    data: Vec<Vec<Cell>>,
}

impl Field {
    /// Creates an all-dead field.
    pub fn new(size_x: usize, size_y: usize) -> Result<Self> {
        if size_x == 0 || size_y == 0 {
            return Err(FieldError::InvalidDimension { size_x, size_y });
        }
        Ok(Self::blank(size_x, size_y))
    }

    /// Builds a field from row-major states. All rows must be non-empty and equally long.
    pub fn from_rows(rows: Vec<Vec<CellState>>) -> Result<Self> {
        let size_y = rows.len();
        let size_x = rows.first().map_or(0, Vec::len);

        if size_x == 0 || !rows.iter().all(|r| r.len() == size_x) {
            return Err(FieldError::InvalidDimension { size_x, size_y });
        }

        let data = rows
            .into_iter()
            .enumerate()
            .map(|(y, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(x, state)| Cell::new(x, y, state))
                    .collect()
            })
            .collect();

        Ok(Field {
            size_x,
            size_y,
            data,
        })
    }

    /// A dead field of the same size.
    #[inline]
    pub fn cleared(&self) -> Self {
        Self::blank(self.size_x, self.size_y)
    }

    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.data
    }

    pub fn get_cell(&self, x: usize, y: usize) -> Result<&Cell> {
        self.check(x, y)?;
        Ok(&self.data[y][x])
    }

    pub fn get_cell_mut(&mut self, x: usize, y: usize) -> Result<&mut Cell> {
        self.check(x, y)?;
        Ok(&mut self.data[y][x])
    }

    #[inline]
    pub fn state(&self, x: usize, y: usize) -> Result<CellState> {
        self.get_cell(x, y).map(Cell::state)
    }

    pub fn set_state(&mut self, x: usize, y: usize, state: CellState) -> Result<()> {
        self.get_cell_mut(x, y)?.set_state(state);
        Ok(())
    }

    /// Flips a cell and returns its new state.
    pub fn toggle(&mut self, x: usize, y: usize) -> Result<CellState> {
        let cell = self.get_cell_mut(x, y)?;
        let state = cell.state().flipped();
        cell.set_state(state);
        Ok(state)
    }

    /// Number of live cells among the 8 toroidal neighbours of `(x, y)`.
    ///
    /// On a field one cell wide or tall the wrapped offsets land on the same
    /// cells more than once, and those cells are counted once per offset. That
    /// is the neighbourhood of a degenerate torus, not an off-by-one.
    pub fn alive_neighbor_count(&self, x: usize, y: usize) -> Result<u8> {
        self.check(x, y)?;
        Ok(self.neighbors_unchecked(x, y))
    }

    fn neighbors_unchecked(&self, x: usize, y: usize) -> u8 {
        // x + size - 1 is x - 1 without underflow.
        let xs = [
            (x + self.size_x - 1) % self.size_x,
            x,
            (x + 1) % self.size_x,
        ];
        let ys = [
            (y + self.size_y - 1) % self.size_y,
            y,
            (y + 1) % self.size_y,
        ];

        let mut n = 0;
        for (i, &ny) in ys.iter().enumerate() {
            for (j, &nx) in xs.iter().enumerate() {
                if (i, j) != (1, 1) && self.data[ny][nx].is_alive() {
                    n += 1;
                }
            }
        }
        n
    }

    /// Computes the next generation.
    ///
    /// Every cell is judged against `self` as it is when the call starts and
    /// the result is written into a fresh field, so no cell can observe a
    /// neighbour that has already advanced.
    pub fn step(&self) -> Field {
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, cell)| {
                        let n = self.neighbors_unchecked(x, y);
                        Cell::new(x, y, cell.state().next(n))
                    })
                    .collect()
            })
            .collect();

        Field {
            size_x: self.size_x,
            size_y: self.size_y,
            data,
        }
    }

    /// Positions of live cells in row-major order.
    pub fn alive_cells(&self) -> Vec<(usize, usize)> {
        self.data
            .iter()
            .flatten()
            .filter(|c| c.is_alive())
            .map(Cell::pos)
            .collect()
    }

    #[inline]
    pub fn population(&self) -> usize {
        self.data.iter().flatten().filter(|c| c.is_alive()).count()
    }

    fn blank(size_x: usize, size_y: usize) -> Self {
        let data = (0..size_y)
            .map(|y| (0..size_x).map(|x| Cell::new(x, y, CellState::Dead)).collect())
            .collect();
        Field {
            size_x,
            size_y,
            data,
        }
    }

    #[inline]
    fn check(&self, x: usize, y: usize) -> Result<()> {
        if x >= self.size_x || y >= self.size_y {
            Err(FieldError::OutOfBounds {
                x,
                y,
                size_x: self.size_x,
                size_y: self.size_y,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(size_x: usize, size_y: usize, alive: &[(usize, usize)]) -> Field {
        let mut f = Field::new(size_x, size_y).unwrap();
        for &(x, y) in alive {
            f.set_state(x, y, CellState::Alive).unwrap();
        }
        f
    }

    #[test]
    fn new_field_is_dead_and_positions_match() {
        let f = Field::new(4, 3).unwrap();
        assert_eq!(f.size(), (4, 3));
        for y in 0..3 {
            for x in 0..4 {
                let c = f.get_cell(x, y).unwrap();
                assert_eq!(c.pos(), (x, y));
                assert_eq!(c.state(), CellState::Dead);
            }
        }
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert_eq!(
            Field::new(0, 5),
            Err(FieldError::InvalidDimension { size_x: 0, size_y: 5 })
        );
        assert!(matches!(
            Field::new(5, 0),
            Err(FieldError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn out_of_bounds_access_is_an_error() {
        let mut f = Field::new(3, 3).unwrap();
        assert!(matches!(
            f.get_cell(3, 0),
            Err(FieldError::OutOfBounds { x: 3, y: 0, .. })
        ));
        assert!(f.set_state(0, 7, CellState::Alive).is_err());
        assert!(f.alive_neighbor_count(5, 5).is_err());
    }

    #[test]
    fn raw_states_are_validated() {
        let mut f = Field::new(2, 2).unwrap();
        let c = f.get_cell_mut(1, 1).unwrap();
        c.set_raw_state(1).unwrap();
        assert!(c.is_alive());
        assert_eq!(c.set_raw_state(2), Err(FieldError::InvalidState(2)));
        assert!(c.is_alive());
        assert!(CellState::try_from('x').is_err());
    }

    #[test]
    fn rule_table() {
        use CellState::*;
        for n in 0..=8u8 {
            let survive = matches!(n, 2 | 3);
            assert_eq!(Alive.next(n).is_alive(), survive, "alive with {n}");
            assert_eq!(Dead.next(n).is_alive(), n == 3, "dead with {n}");
        }
    }

    #[test]
    fn corner_wraps_to_all_other_corners() {
        let f = field_with(5, 5, &[(4, 4), (4, 0), (0, 4)]);
        assert_eq!(f.alive_neighbor_count(0, 0).unwrap(), 3);
    }

    #[test]
    fn single_row_counts_wrapped_cells_repeatedly() {
        // On a 3x1 torus the rows above and below are the row itself.
        let f = field_with(3, 1, &[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(f.alive_neighbor_count(1, 0).unwrap(), 8);

        let f = field_with(1, 1, &[(0, 0)]);
        assert_eq!(f.alive_neighbor_count(0, 0).unwrap(), 8);
    }

    #[test]
    fn step_does_not_touch_the_input() {
        let f = field_with(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let before = f.clone();
        let next = f.step();
        assert_eq!(f, before);
        assert_ne!(next, before);
    }

    #[test]
    fn toggle_flips() {
        let mut f = Field::new(2, 2).unwrap();
        assert_eq!(f.toggle(0, 1).unwrap(), CellState::Alive);
        assert_eq!(f.toggle(0, 1).unwrap(), CellState::Dead);
    }

    #[test]
    fn from_rows_rejects_ragged() {
        use CellState::*;
        assert!(Field::from_rows(vec![vec![Dead, Alive], vec![Dead]]).is_err());
        assert!(Field::from_rows(vec![]).is_err());
        let f = Field::from_rows(vec![vec![Dead, Alive], vec![Alive, Dead]]).unwrap();
        assert_eq!(f.alive_cells(), vec![(1, 0), (0, 1)]);
        assert_eq!(f.population(), 2);
    }
}
