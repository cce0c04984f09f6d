//! Unit and command-level tests for the borefence CLI.

mod helpers;
mod input;
