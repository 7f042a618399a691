// 📋 Grouped View - pure (records, ordering rules) → (sections, rows)
//
// Ordering: zone ascending (absent zone first), then wins descending,
// then name ascending (absent name first), then id ascending.

use crate::team::{Team, TeamId};
use std::cmp::Ordering;

/// Position of a row inside the grouped view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexPath {
    pub section: usize,
    pub row: usize,
}

impl IndexPath {
    pub fn new(section: usize, row: usize) -> Self {
        IndexPath { section, row }
    }
}

impl std::fmt::Display for IndexPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.section, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub zone: Option<String>,
    pub teams: Vec<Team>,
}

impl Section {
    /// Header text (absent zone renders as empty text)
    pub fn name(&self) -> &str {
        self.zone.as_deref().unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

/// Sort comparator shared by the view and its tests
pub fn compare_teams(a: &Team, b: &Team) -> Ordering {
    a.qualifying_zone
        .cmp(&b.qualifying_zone)
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.team_name.cmp(&b.team_name))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedView {
    sections: Vec<Section>,
}

impl GroupedView {
    /// Sort and group records into sections
    pub fn build(mut records: Vec<Team>) -> Self {
        records.sort_by(compare_teams);

        let mut sections: Vec<Section> = Vec::new();
        for team in records {
            match sections.last_mut() {
                Some(section) if section.zone == team.qualifying_zone => section.teams.push(team),
                _ => sections.push(Section {
                    zone: team.qualifying_zone.clone(),
                    teams: vec![team],
                }),
            }
        }

        GroupedView { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map(Section::len).unwrap_or(0)
    }

    pub fn total_rows(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn object_at(&self, path: IndexPath) -> Option<&Team> {
        self.sections.get(path.section)?.teams.get(path.row)
    }

    pub fn index_path_of(&self, id: TeamId) -> Option<IndexPath> {
        self.iter_paths()
            .find(|(_, team)| team.id == id)
            .map(|(path, _)| path)
    }

    /// Every row with its position, in display order
    pub fn iter_paths(&self) -> impl Iterator<Item = (IndexPath, &Team)> {
        self.sections.iter().enumerate().flat_map(|(s, section)| {
            section
                .teams
                .iter()
                .enumerate()
                .map(move |(r, team)| (IndexPath::new(s, r), team))
        })
    }
}
