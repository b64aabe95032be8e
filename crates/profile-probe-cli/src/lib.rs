//! profile-probe CLI: argument handling, interactive menu and report output.

pub mod cli;
pub mod interactive;
pub mod logging;
pub mod report;
pub mod run;

pub use cli::{Cli, Target};
pub use interactive::Action;
pub use run::{execute, Summary};
