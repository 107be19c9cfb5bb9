use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which backend capability a query targets.
///
/// `Database` queries reach real data and therefore require a bearer
/// credential; `General` queries are answered without one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    General,
    #[default]
    Database,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::General => "general",
            Mode::Database => "database",
        }
    }

    pub fn requires_credential(self) -> bool {
        matches!(self, Mode::Database)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Mode::General => "General Chat",
            Mode::Database => "Database Agent",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Mode::General),
            "database" | "db" => Ok(Mode::Database),
            other => Err(format!(
                "Unknown mode '{other}'. Expected 'general' or 'database'."
            )),
        }
    }
}
