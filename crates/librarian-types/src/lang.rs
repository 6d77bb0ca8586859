//! Supported conversation locales.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two locales the librarian answers in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ro,
    #[default]
    En,
}

impl Lang {
    /// Binarize an ISO language code: anything starting with `ro` is Romanian,
    /// everything else is English.
    pub fn from_code(code: &str) -> Self {
        if code.trim().to_lowercase().starts_with("ro") {
            Lang::Ro
        } else {
            Lang::En
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::Ro => "ro",
            Lang::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
