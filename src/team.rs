// ⚽ Team Entity - the single record type held by the store
//
// Row id is identity, everything else is a value that may repeat:
// two teams with the same name in the same zone are two different teams.

use serde::{Deserialize, Serialize};

/// Stable identity assigned by the store (SQLite row id)
pub type TeamId = i64;

/// Flag asset used for teams added through the form
pub const PLACEHOLDER_IMAGE: &str = "wenderland-flag";

// ============================================================================
// TEAM RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub team_name: Option<String>,
    /// Grouping key for display sections
    pub qualifying_zone: Option<String>,
    /// Reference to a bundled flag image
    pub image_name: Option<String>,
    pub wins: i32,
    /// Stored but not used by any action
    pub losses: i32,
}

impl Team {
    /// Name as shown in a row (absent name renders as empty text)
    pub fn display_name(&self) -> &str {
        self.team_name.as_deref().unwrap_or("")
    }

    pub fn score_label(&self) -> String {
        format!("Wins: {}", self.wins)
    }
}

// ============================================================================
// NEW TEAM (staged, not yet persisted)
// ============================================================================

/// Field values for a team that has not been committed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub team_name: Option<String>,
    pub qualifying_zone: Option<String>,
    pub image_name: Option<String>,
    pub wins: i32,
    pub losses: i32,
}

impl NewTeam {
    /// Team entered through the add-team form: free text, placeholder flag, zero counters
    pub fn from_form(name: &str, zone: &str) -> Self {
        NewTeam {
            team_name: Some(name.to_string()),
            qualifying_zone: Some(zone.to_string()),
            image_name: Some(PLACEHOLDER_IMAGE.to_string()),
            wins: 0,
            losses: 0,
        }
    }
}
