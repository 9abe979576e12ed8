use std::{fs, path::Path};

use log::debug;
use ndarray::{Array2, ArrayView1};
use ndarray_npy::{ReadNpyError, WriteNpyError};

use crate::{
    agent::{Action, State},
    error::{Error, Result},
};

/// A dense table of action values with shape `[n_states, n_actions]`
///
/// Rows are indexed by state and columns by action. The shape is fixed once the table is
/// built; every accessor checks its indices against it.
///
/// On disk the table is a NumPy `.npy` file holding a single C-ordered `float64` array, so
/// tables written here can be inspected with `numpy.load` and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Array2<f64>,
}

impl QTable {
    /// Allocate a table with every entry set to `value`
    pub fn filled(n_states: usize, n_actions: usize, value: f64) -> Result<Self> {
        Self::from_array(Array2::from_elem((n_states, n_actions), value))
    }

    /// Wrap an existing array, taking ownership of it
    ///
    /// Fails if either dimension is zero or an entry is NaN or infinite
    pub fn from_array(values: Array2<f64>) -> Result<Self> {
        let (n_states, n_actions) = values.dim();
        if n_states == 0 || n_actions == 0 {
            return Err(Error::InvalidArgument(format!(
                "Q-table dimensions must be positive, got [{}, {}]",
                n_states, n_actions
            )));
        }
        if let Some(((state, action), value)) =
            values.indexed_iter().find(|(_, value)| !value.is_finite())
        {
            return Err(Error::InvalidArgument(format!(
                "Q-table entry [{}, {}] must be finite, got {}",
                state, action, value
            )));
        }
        Ok(Self { values })
    }

    pub fn n_states(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_actions(&self) -> usize {
        self.values.ncols()
    }

    /// `(n_states, n_actions)`
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Fails with [`Error::InvalidArgument`] unless `0 <= state < n_states`
    pub fn check_state(&self, state: State) -> Result<()> {
        if state < self.n_states() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "Bad state index {}. Has to be an integer in [0, {})",
                state,
                self.n_states()
            )))
        }
    }

    /// Fails with [`Error::InvalidArgument`] unless `0 <= action < n_actions`
    pub fn check_action(&self, action: Action) -> Result<()> {
        if action < self.n_actions() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "Bad action index {}. Has to be an integer in [0, {})",
                action,
                self.n_actions()
            )))
        }
    }

    /// Value of a single state-action pair
    pub fn get(&self, state: State, action: Action) -> Result<f64> {
        self.check_state(state)?;
        self.check_action(action)?;
        Ok(self.values[[state, action]])
    }

    /// Overwrite a single state-action pair
    pub fn set(&mut self, state: State, action: Action, value: f64) -> Result<()> {
        self.check_state(state)?;
        self.check_action(action)?;
        self.values[[state, action]] = value;
        Ok(())
    }

    /// All action values of `state`
    pub fn row(&self, state: State) -> Result<ArrayView1<'_, f64>> {
        self.check_state(state)?;
        Ok(self.values.row(state))
    }

    /// The greedy action in `state`
    ///
    /// Ties resolve to the lowest action index. NaN entries never win over a number.
    pub fn best_action(&self, state: State) -> Result<Action> {
        let row = self.row(state)?;
        let (best, _) = row
            .iter()
            .enumerate()
            .skip(1)
            .fold((0, row[0]), |(best, best_value), (i, &value)| {
                if best_value.is_nan() || value > best_value {
                    (i, value)
                } else {
                    (best, best_value)
                }
            });
        Ok(best)
    }

    /// The largest action value in `state`, i.e. the value of [`best_action`](Self::best_action)
    pub fn best_value(&self, state: State) -> Result<f64> {
        let action = self.best_action(state)?;
        Ok(self.values[[state, action]])
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_array(self) -> Array2<f64> {
        self.values
    }

    /// Write the table to `path` as a `.npy` file, creating missing parent directories
    ///
    /// An existing file at `path` is overwritten. The path is used verbatim.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        ndarray_npy::write_npy(path, &self.values).map_err(|err| match err {
            WriteNpyError::Io(err) => Error::Io(err),
            other => Error::Format {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;
        debug!("saved Q-table {:?} to {}", self.shape(), path.display());
        Ok(())
    }

    /// Read a table previously written by [`save`](Self::save)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let values: Array2<f64> = ndarray_npy::read_npy(path).map_err(|err| match err {
            ReadNpyError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Error::NotFound(path.to_path_buf())
            }
            ReadNpyError::Io(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::InvalidData
                ) =>
            {
                Error::Format {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                }
            }
            ReadNpyError::Io(err) => Error::Io(err),
            other => Error::Format {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;
        let table = Self::from_array(values).map_err(|err| Error::Format {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        debug!("loaded Q-table {:?} from {}", table.shape(), path.display());
        Ok(table)
    }
}
