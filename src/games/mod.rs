//! Game implementations.

pub mod shiritori;
