//! Conway's Game of Life on a fixed-size toroidal field, with a terminal front-end.

pub mod app;
pub mod draw;
pub mod error;
pub mod input;
pub mod proc;
pub mod save;
pub mod session;
pub mod settings;

pub use error::{Error, Result};
pub use proc::{Cell, CellState, Field};
pub use session::{RunState, Session};
