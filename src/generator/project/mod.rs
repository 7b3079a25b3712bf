mod format;
mod generate;

pub use format::format_project;
pub use generate::{generate_project, GenerateReport, ProjectPaths};
