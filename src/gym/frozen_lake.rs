use strum::{EnumIter, FromRepr, VariantArray};

use crate::{
    agent::{Action, State},
    env::Environment,
    error::{Error, Result},
};

/// A cell of the lake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Square {
    Frozen,
    Hole,
    Start,
    Goal,
}

impl TryFrom<char> for Square {
    type Error = Error;

    fn try_from(value: char) -> Result<Self> {
        match value {
            'F' => Ok(Square::Frozen),
            'H' => Ok(Square::Hole),
            'S' => Ok(Square::Start),
            'G' => Ok(Square::Goal),
            other => Err(Error::InvalidArgument(format!(
                "unknown map cell {:?}, expected one of S, F, H, G",
                other
            ))),
        }
    }
}

/// Actions for the [`FrozenLake`] environment
#[derive(FromRepr, EnumIter, VariantArray, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FLAction {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
}

impl TryFrom<Action> for FLAction {
    type Error = Error;

    fn try_from(value: Action) -> Result<Self> {
        Self::from_repr(value).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Bad action index {}. Has to be an integer in [0, {})",
                value,
                Self::VARIANTS.len()
            ))
        })
    }
}

impl From<FLAction> for Action {
    fn from(value: FLAction) -> Self {
        value as Action
    }
}

const DEFAULT_MAP: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

/// A very simple RL environment taken from Python [gymnasium](https://gymnasium.farama.org/)
///
/// The agent walks a grid of frozen cells from `S` to `G` without falling into a hole `H`.
/// States are cell indices in row-major order. Moving into the edge of the map leaves the
/// agent where it is. Reaching the goal pays `1.0`, every other step pays nothing, and the
/// episode ends on a hole or the goal. Movement is deterministic.
///
/// Intended for use with a [QAgent](crate::algo::QAgent)
#[derive(Debug, Clone)]
pub struct FrozenLake {
    map: Vec<Square>,
    ncols: usize,
    start: usize,
    pos: usize,
}

impl FrozenLake {
    /// The standard 4x4 map
    pub fn new() -> Self {
        Self::from_rows(&DEFAULT_MAP).expect("default map is valid")
    }

    /// Build a lake from rows of `S`, `F`, `H` and `G` characters
    ///
    /// Fails unless the rows are non-empty, equally long and contain exactly one `S`
    pub fn from_rows<T: AsRef<str>>(rows: &[T]) -> Result<Self> {
        let ncols = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if ncols == 0 {
            return Err(Error::InvalidArgument(String::from("map must not be empty")));
        }

        let mut map = Vec::with_capacity(rows.len() * ncols);
        for row in rows {
            let row = row.as_ref();
            if row.chars().count() != ncols {
                return Err(Error::InvalidArgument(format!(
                    "map rows must all have {} cells, got {:?}",
                    ncols, row
                )));
            }
            for c in row.chars() {
                map.push(Square::try_from(c)?);
            }
        }

        let mut starts = map
            .iter()
            .enumerate()
            .filter(|&(_, &square)| square == Square::Start)
            .map(|(i, _)| i);
        let start = match (starts.next(), starts.next()) {
            (Some(start), None) => start,
            _ => {
                return Err(Error::InvalidArgument(String::from(
                    "map must contain exactly one start cell",
                )))
            }
        };

        Ok(Self {
            map,
            ncols,
            start,
            pos: start,
        })
    }

    /// Current position of the agent
    pub fn position(&self) -> State {
        self.pos
    }

    pub fn square(&self, state: State) -> Option<Square> {
        self.map.get(state).copied()
    }

    fn nrows(&self) -> usize {
        self.map.len() / self.ncols
    }
}

impl Default for FrozenLake {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for FrozenLake {
    fn n_states(&self) -> usize {
        self.map.len()
    }

    fn n_actions(&self) -> usize {
        FLAction::VARIANTS.len()
    }

    fn step(&mut self, action: Action) -> Result<(State, f64, bool)> {
        let (row, col) = (self.pos / self.ncols, self.pos % self.ncols);
        let (row, col) = match FLAction::try_from(action)? {
            FLAction::Left => (row, col.saturating_sub(1)),
            FLAction::Down => ((row + 1).min(self.nrows() - 1), col),
            FLAction::Right => (row, (col + 1).min(self.ncols - 1)),
            FLAction::Up => (row.saturating_sub(1), col),
        };
        self.pos = row * self.ncols + col;

        let (reward, done) = match self.map[self.pos] {
            Square::Goal => (1.0, true),
            Square::Hole => (0.0, true),
            Square::Frozen | Square::Start => (0.0, false),
        };
        Ok((self.pos, reward, done))
    }

    fn reset(&mut self) -> State {
        self.pos = self.start;
        self.pos
    }
}
