// 🧾 Table Model - the list widget's backing rows
//
// Operations apply immediately; ordering inside a batch is the presenter's job.

use crate::team::{Team, TeamId};
use crate::view::{IndexPath, Section};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowContent {
    pub team_id: TeamId,
    pub title: String,
    /// "Wins: N"
    pub detail: String,
    pub image_name: Option<String>,
}

impl From<&Team> for RowContent {
    fn from(team: &Team) -> Self {
        RowContent {
            team_id: team.id,
            title: team.display_name().to_string(),
            detail: team.score_label(),
            image_name: team.image_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionContent {
    pub title: String,
    pub rows: Vec<RowContent>,
}

impl From<&Section> for SectionContent {
    fn from(section: &Section) -> Self {
        SectionContent {
            title: section.name().to_string(),
            rows: section.teams.iter().map(RowContent::from).collect(),
        }
    }
}

/// Incremental two-level list interface the presenter drives
pub trait ListWidget {
    fn reload_data(&mut self, sections: Vec<SectionContent>);
    fn begin_updates(&mut self);
    fn end_updates(&mut self);
    fn insert_section(&mut self, index: usize, section: SectionContent);
    fn delete_section(&mut self, index: usize);
    fn insert_row(&mut self, path: IndexPath, row: RowContent);
    fn delete_row(&mut self, path: IndexPath);
    fn reload_row(&mut self, path: IndexPath, row: RowContent);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
    sections: Vec<SectionContent>,
    depth: usize,
    batches: usize,
}

impl TableModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[SectionContent] {
        &self.sections
    }

    pub fn row(&self, path: IndexPath) -> Option<&RowContent> {
        self.sections.get(path.section)?.rows.get(path.row)
    }

    pub fn total_rows(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    /// Completed update batches since creation
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn is_updating(&self) -> bool {
        self.depth > 0
    }

    /// Row paths in display order
    pub fn paths(&self) -> Vec<IndexPath> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(s, section)| (0..section.rows.len()).map(move |r| IndexPath::new(s, r)))
            .collect()
    }
}

impl ListWidget for TableModel {
    fn reload_data(&mut self, sections: Vec<SectionContent>) {
        self.sections = sections;
    }

    fn begin_updates(&mut self) {
        self.depth += 1;
    }

    fn end_updates(&mut self) {
        if self.depth == 0 {
            warn!("end_updates without begin_updates");
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.batches += 1;
        }
    }

    fn insert_section(&mut self, index: usize, section: SectionContent) {
        if index > self.sections.len() {
            warn!(index, "section insert out of range");
            return;
        }
        self.sections.insert(index, section);
    }

    fn delete_section(&mut self, index: usize) {
        if index >= self.sections.len() {
            warn!(index, "section delete out of range");
            return;
        }
        self.sections.remove(index);
    }

    fn insert_row(&mut self, path: IndexPath, row: RowContent) {
        match self.sections.get_mut(path.section) {
            Some(section) if path.row <= section.rows.len() => section.rows.insert(path.row, row),
            _ => warn!(%path, "row insert out of range"),
        }
    }

    fn delete_row(&mut self, path: IndexPath) {
        match self.sections.get_mut(path.section) {
            Some(section) if path.row < section.rows.len() => {
                section.rows.remove(path.row);
            }
            _ => warn!(%path, "row delete out of range"),
        }
    }

    fn reload_row(&mut self, path: IndexPath, row: RowContent) {
        match self
            .sections
            .get_mut(path.section)
            .and_then(|section| section.rows.get_mut(path.row))
        {
            Some(slot) => *slot = row,
            None => warn!(%path, "row reload out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: TeamId, title: &str) -> RowContent {
        RowContent {
            team_id: id,
            title: title.to_string(),
            detail: "Wins: 0".to_string(),
            image_name: None,
        }
    }

    #[test]
    fn test_operations_and_batch_count() {
        let mut table = TableModel::new();
        table.reload_data(vec![SectionContent {
            title: "X".to_string(),
            rows: vec![row(1, "A")],
        }]);

        table.begin_updates();
        table.insert_row(IndexPath::new(0, 1), row(2, "B"));
        table.insert_section(
            1,
            SectionContent {
                title: "Y".to_string(),
                rows: vec![row(3, "C")],
            },
        );
        table.delete_row(IndexPath::new(0, 0));
        assert!(table.is_updating());
        table.end_updates();

        assert_eq!(table.batches(), 1);
        assert_eq!(table.total_rows(), 2);
        assert_eq!(table.row(IndexPath::new(0, 0)).unwrap().title, "B");
        assert_eq!(table.paths(), vec![IndexPath::new(0, 0), IndexPath::new(1, 0)]);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut table = TableModel::new();

        table.delete_row(IndexPath::new(0, 0));
        table.delete_section(3);
        table.reload_row(IndexPath::new(1, 1), row(1, "A"));
        table.end_updates();

        assert_eq!(table, TableModel::new());
    }
}
