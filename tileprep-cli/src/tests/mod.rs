//! Shared test harness modules for the tileprep CLI.

use super::*;

mod check;
mod unit;
