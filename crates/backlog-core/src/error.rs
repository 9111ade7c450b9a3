//! Stable error codes for the CLI and JSON consumers.
//!
//! Codes are grouped by leading digit: `E1xxx` project files, `E2xxx` user
//! input, `E5xxx` the mutation gateway.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SnapshotMissing,
    SnapshotParseError,
    ItemNotFound,
    InvalidDate,
    ValidationFailed,
    GatewayFailed,
}

struct Entry {
    code: &'static str,
    summary: &'static str,
    hint: Option<&'static str>,
}

impl ErrorCode {
    pub const ALL: [Self; 7] = [
        Self::ConfigParseError,
        Self::SnapshotMissing,
        Self::SnapshotParseError,
        Self::ItemNotFound,
        Self::InvalidDate,
        Self::ValidationFailed,
        Self::GatewayFailed,
    ];

    const fn entry(self) -> Entry {
        match self {
            Self::ConfigParseError => Entry {
                code: "E1002",
                summary: "Project config could not be read",
                hint: Some("Check the TOML in .backlog/config.toml."),
            },
            Self::SnapshotMissing => Entry {
                code: "E1101",
                summary: "No backlog snapshot",
                hint: Some("Pass --snapshot or set BACKLOG_SNAPSHOT to a snapshot JSON file."),
            },
            Self::SnapshotParseError => Entry {
                code: "E1102",
                summary: "Backlog snapshot is malformed",
                hint: Some("A snapshot is a JSON object with an `items` array."),
            },
            Self::ItemNotFound => Entry {
                code: "E2001",
                summary: "No item or subitem with that id",
                hint: Some("Ids come from `bq queue --format text`."),
            },
            Self::InvalidDate => Entry {
                code: "E2006",
                summary: "Invalid date",
                hint: Some("Dates are local calendar days written YYYY-MM-DD."),
            },
            Self::ValidationFailed => Entry {
                code: "E2007",
                summary: "Edit rejected before it was sent",
                hint: None,
            },
            Self::GatewayFailed => Entry {
                code: "E5003",
                summary: "The backlog store refused or lost the edit",
                hint: Some("Nothing was changed locally. Reload and try again."),
            },
        }
    }

    /// `E####` identifier.
    #[must_use]
    pub const fn code(self) -> &'static str {
        self.entry().code
    }

    #[must_use]
    pub const fn summary(self) -> &'static str {
        self.entry().summary
    }

    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        self.entry().hint
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for code in ErrorCode::ALL {
            let id = code.code();
            assert!(seen.insert(id), "{id} used twice");
            assert_eq!(id.len(), 5);
            assert!(id.starts_with('E') && id[1..].chars().all(|c| c.is_ascii_digit()));
            assert!(!code.summary().is_empty());
        }
    }

    #[test]
    fn display_is_the_code() {
        assert_eq!(ErrorCode::ItemNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::InvalidDate.hint().map(|h| h.contains("YYYY-MM-DD")), Some(true));
    }
}
