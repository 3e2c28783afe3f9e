//! Navigation targets of the monitor UI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The pages a user can navigate to.
///
/// The visit log stores the display name and accepts any string, so this
/// set is only a convenience for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
pub enum Page {
    #[default]
    Home,
    Monitor,
    About,
}

impl Page {
    /// Name recorded in the `pagename` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Monitor => "Monitor",
            Page::About => "About",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
