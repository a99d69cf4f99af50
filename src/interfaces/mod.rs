//! Input and output adapters for the command-line interface.

pub mod csv;
