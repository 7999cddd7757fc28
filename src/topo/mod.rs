//! 拓扑构建模块

pub mod grid;

pub use grid::{build_grid, GridOpts};
