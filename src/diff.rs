// 🔀 Change Events - diff two grouped view snapshots into a change bracket
//
// Batch semantics (what a subscriber may rely on):
//   - delete/move paths refer to the OLD view
//   - insert/move paths refer to the NEW view
//   - update carries both; the row keeps its relative position
//   - rows inside an inserted/deleted section are implied by the section event

use crate::team::{Team, TeamId};
use crate::view::{GroupedView, IndexPath};
use std::collections::HashMap;

// ============================================================================
// EVENT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Delete,
    Update,
    Move,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Delete => "delete",
            ChangeKind::Update => "update",
            ChangeKind::Move => "move",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Whole group appeared (index in new view) or disappeared (index in old view)
    Section {
        kind: ChangeKind,
        index: usize,
        zone: Option<String>,
    },
    Row {
        kind: ChangeKind,
        team_id: TeamId,
        old: Option<IndexPath>,
        new: Option<IndexPath>,
    },
}

impl ChangeEvent {
    pub fn insert_section(index: usize, zone: Option<String>) -> Self {
        ChangeEvent::Section {
            kind: ChangeKind::Insert,
            index,
            zone,
        }
    }

    pub fn delete_section(index: usize, zone: Option<String>) -> Self {
        ChangeEvent::Section {
            kind: ChangeKind::Delete,
            index,
            zone,
        }
    }

    pub fn insert_row(team_id: TeamId, new: IndexPath) -> Self {
        ChangeEvent::Row {
            kind: ChangeKind::Insert,
            team_id,
            old: None,
            new: Some(new),
        }
    }

    pub fn delete_row(team_id: TeamId, old: IndexPath) -> Self {
        ChangeEvent::Row {
            kind: ChangeKind::Delete,
            team_id,
            old: Some(old),
            new: None,
        }
    }

    pub fn update_row(team_id: TeamId, old: IndexPath, new: IndexPath) -> Self {
        ChangeEvent::Row {
            kind: ChangeKind::Update,
            team_id,
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn move_row(team_id: TeamId, old: IndexPath, new: IndexPath) -> Self {
        ChangeEvent::Row {
            kind: ChangeKind::Move,
            team_id,
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Section { kind, .. } | ChangeEvent::Row { kind, .. } => *kind,
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, ChangeEvent::Section { .. })
    }
}

impl std::fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeEvent::Section { kind, index, zone } => write!(
                f,
                "section {} at {} ({})",
                kind.as_str(),
                index,
                zone.as_deref().unwrap_or("<none>")
            ),
            ChangeEvent::Row {
                kind,
                team_id,
                old,
                new,
            } => {
                write!(f, "row {} team={}", kind.as_str(), team_id)?;
                if let Some(old) = old {
                    write!(f, " old={}", old)?;
                }
                if let Some(new) = new {
                    write!(f, " new={}", new)?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// SUBSCRIBER + BATCH
// ============================================================================

/// Receives one change bracket: `begin`, every event in emission order, `end`
pub trait ChangeSubscriber {
    fn begin(&mut self);
    fn apply(&mut self, event: &ChangeEvent);
    fn end(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    events: Vec<ChangeEvent>,
}

impl ChangeBatch {
    pub fn new(events: Vec<ChangeEvent>) -> Self {
        ChangeBatch { events }
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    /// Run a full bracket on the subscriber. Empty batches open no bracket.
    pub fn deliver(&self, subscriber: &mut dyn ChangeSubscriber) {
        if self.events.is_empty() {
            return;
        }
        subscriber.begin();
        for event in &self.events {
            subscriber.apply(event);
        }
        subscriber.end();
    }
}

// ============================================================================
// DIFF
// ============================================================================

/// Row present in the same (surviving) section before and after
struct StayingRow {
    team_id: TeamId,
    old: IndexPath,
    new: IndexPath,
    changed: bool,
}

/// Compute the event set that turns `old` into `new`.
///
/// Emission order: section deletes, section inserts, row deletes, row inserts,
/// moves, updates. Each group is sorted by the path it refers to.
pub fn diff(old: &GroupedView, new: &GroupedView) -> ChangeBatch {
    let old_sections: HashMap<&Option<String>, usize> = old
        .sections()
        .iter()
        .enumerate()
        .map(|(i, s)| (&s.zone, i))
        .collect();
    let new_sections: HashMap<&Option<String>, usize> = new
        .sections()
        .iter()
        .enumerate()
        .map(|(i, s)| (&s.zone, i))
        .collect();

    let mut events = Vec::new();

    for (index, section) in old.sections().iter().enumerate() {
        if !new_sections.contains_key(&section.zone) {
            events.push(ChangeEvent::delete_section(index, section.zone.clone()));
        }
    }
    for (index, section) in new.sections().iter().enumerate() {
        if !old_sections.contains_key(&section.zone) {
            events.push(ChangeEvent::insert_section(index, section.zone.clone()));
        }
    }

    let old_alive = |section: usize| new_sections.contains_key(&old.sections()[section].zone);
    let new_alive = |section: usize| old_sections.contains_key(&new.sections()[section].zone);

    let old_rows: HashMap<TeamId, IndexPath> =
        old.iter_paths().map(|(path, team)| (team.id, path)).collect();
    let new_rows: HashMap<TeamId, (IndexPath, &Team)> =
        new.iter_paths().map(|(path, team)| (team.id, (path, team))).collect();

    let mut deletes = Vec::new();
    let mut inserts = Vec::new();
    let mut moves = Vec::new();
    let mut updates = Vec::new();

    for (old_path, team) in old.iter_paths() {
        let Some(&(new_path, _)) = new_rows.get(&team.id) else {
            if old_alive(old_path.section) {
                deletes.push(ChangeEvent::delete_row(team.id, old_path));
            }
            continue;
        };

        match (old_alive(old_path.section), new_alive(new_path.section)) {
            (false, false) => {}
            (false, true) => inserts.push(ChangeEvent::insert_row(team.id, new_path)),
            (true, false) => deletes.push(ChangeEvent::delete_row(team.id, old_path)),
            (true, true) => {
                // zone changed between two surviving sections
                if old.sections()[old_path.section].zone != new.sections()[new_path.section].zone {
                    moves.push(ChangeEvent::move_row(team.id, old_path, new_path));
                }
            }
        }
    }

    for (new_path, team) in new.iter_paths() {
        if !old_rows.contains_key(&team.id) && new_alive(new_path.section) {
            inserts.push(ChangeEvent::insert_row(team.id, new_path));
        }
    }

    for (old_index, section) in old.sections().iter().enumerate() {
        let Some(&new_index) = new_sections.get(&section.zone) else {
            continue;
        };

        let staying: Vec<StayingRow> = section
            .teams
            .iter()
            .enumerate()
            .filter_map(|(row, team)| {
                let &(new_path, new_team) = new_rows.get(&team.id)?;
                (new_path.section == new_index).then(|| StayingRow {
                    team_id: team.id,
                    old: IndexPath::new(old_index, row),
                    new: new_path,
                    changed: team != new_team,
                })
            })
            .collect();

        let keep = stationary_rows(&staying);
        for (row, kept) in staying.iter().zip(keep) {
            if !kept {
                moves.push(ChangeEvent::move_row(row.team_id, row.old, row.new));
            } else if row.changed {
                updates.push(ChangeEvent::update_row(row.team_id, row.old, row.new));
            }
        }
    }

    moves.sort_by_key(old_path_key);
    deletes.sort_by_key(old_path_key);
    inserts.sort_by_key(new_path_key);
    updates.sort_by_key(old_path_key);

    events.extend(deletes);
    events.extend(inserts);
    events.extend(moves);
    events.extend(updates);

    ChangeBatch::new(events)
}

fn old_path_key(event: &ChangeEvent) -> Option<IndexPath> {
    match event {
        ChangeEvent::Row { old, .. } => *old,
        ChangeEvent::Section { .. } => None,
    }
}

fn new_path_key(event: &ChangeEvent) -> Option<IndexPath> {
    match event {
        ChangeEvent::Row { new, .. } => *new,
        ChangeEvent::Section { .. } => None,
    }
}

/// Pick the rows that stay put: the longest run (in old order) whose new rows
/// are increasing. Among equally long runs, keep as many unchanged rows as
/// possible so the edited row is the one that moves.
fn stationary_rows(rows: &[StayingRow]) -> Vec<bool> {
    let n = rows.len();
    if n == 0 {
        return Vec::new();
    }

    // length dominates, unchanged count breaks ties
    let weight = |row: &StayingRow| (n + 1) + usize::from(!row.changed);

    let mut best = vec![0usize; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        best[i] = weight(&rows[i]);
        for j in 0..i {
            if rows[j].new.row < rows[i].new.row && best[j] + weight(&rows[i]) > best[i] {
                best[i] = best[j] + weight(&rows[i]);
                prev[i] = Some(j);
            }
        }
    }

    let mut end = 0;
    for i in 1..n {
        if best[i] > best[end] {
            end = i;
        }
    }

    let mut keep = vec![false; n];
    let mut cursor = Some(end);
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = prev[i];
    }
    keep
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// One bracket as seen by a subscriber
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Bracket {
        pub(crate) events: Vec<ChangeEvent>,
        pub(crate) closed: bool,
    }

    /// Subscriber that records brackets into a shared log
    #[derive(Clone, Default)]
    pub(crate) struct Recorder {
        pub(crate) brackets: Rc<RefCell<Vec<Bracket>>>,
    }

    impl ChangeSubscriber for Recorder {
        fn begin(&mut self) {
            self.brackets.borrow_mut().push(Bracket {
                events: Vec::new(),
                closed: false,
            });
        }

        fn apply(&mut self, event: &ChangeEvent) {
            if let Some(bracket) = self.brackets.borrow_mut().last_mut() {
                bracket.events.push(event.clone());
            }
        }

        fn end(&mut self) {
            if let Some(bracket) = self.brackets.borrow_mut().last_mut() {
                bracket.closed = true;
            }
        }
    }

    fn team(id: TeamId, name: &str, zone: &str, wins: i32) -> Team {
        Team {
            id,
            team_name: Some(name.to_string()),
            qualifying_zone: Some(zone.to_string()),
            image_name: None,
            wins,
            losses: 0,
        }
    }

    type Model = Vec<(Option<String>, Vec<TeamId>)>;

    fn model_of(view: &GroupedView) -> Model {
        view.sections()
            .iter()
            .map(|s| (s.zone.clone(), s.teams.iter().map(|t| t.id).collect()))
            .collect()
    }

    /// Apply a batch to the old model with list-widget batch semantics
    fn replay(old: &GroupedView, new: &GroupedView, batch: &ChangeBatch) -> Model {
        let mut model = model_of(old);
        let mut row_deletes = Vec::new();
        let mut row_inserts = Vec::new();
        let mut section_deletes = Vec::new();
        let mut section_inserts = Vec::new();

        for event in batch.iter() {
            match event {
                ChangeEvent::Section { kind, index, .. } => match kind {
                    ChangeKind::Delete => section_deletes.push(*index),
                    ChangeKind::Insert => section_inserts.push(*index),
                    _ => panic!("unexpected section event {}", event),
                },
                ChangeEvent::Row {
                    kind,
                    team_id,
                    old,
                    new,
                } => match kind {
                    ChangeKind::Delete => row_deletes.push(old.unwrap()),
                    ChangeKind::Insert => row_inserts.push((new.unwrap(), *team_id)),
                    ChangeKind::Move => {
                        assert_ne!(old, new, "no-op move emitted");
                        row_deletes.push(old.unwrap());
                        row_inserts.push((new.unwrap(), *team_id));
                    }
                    ChangeKind::Update => {}
                },
            }
        }

        row_deletes.sort();
        for path in row_deletes.iter().rev() {
            model[path.section].1.remove(path.row);
        }
        section_deletes.sort();
        for index in section_deletes.iter().rev() {
            model.remove(*index);
        }
        section_inserts.sort();
        for index in section_inserts {
            let section = &new.sections()[index];
            model.insert(
                index,
                (section.zone.clone(), section.teams.iter().map(|t| t.id).collect()),
            );
        }
        row_inserts.sort();
        for (path, id) in row_inserts {
            model[path.section].1.insert(path.row, id);
        }
        model
    }

    #[test]
    fn test_identical_views_produce_no_events() {
        let view = GroupedView::build(vec![team(1, "A", "X", 3), team(2, "B", "X", 5)]);
        assert!(diff(&view, &view).is_empty());
    }

    #[test]
    fn test_win_without_rank_change_is_update() {
        let old = GroupedView::build(vec![team(1, "A", "X", 3), team(2, "B", "X", 5)]);
        let new = GroupedView::build(vec![team(1, "A", "X", 4), team(2, "B", "X", 5)]);

        let batch = diff(&old, &new);

        assert_eq!(
            batch.events(),
            &[ChangeEvent::update_row(1, IndexPath::new(0, 1), IndexPath::new(0, 1))]
        );
    }

    #[test]
    fn test_rank_change_moves_the_edited_row() {
        let old = GroupedView::build(vec![team(1, "A", "X", 4), team(2, "B", "X", 5)]);
        let new = GroupedView::build(vec![team(1, "A", "X", 5), team(2, "B", "X", 5)]);

        let batch = diff(&old, &new);

        // B keeps its place, A (the one that changed) moves up
        assert_eq!(
            batch.events(),
            &[ChangeEvent::move_row(1, IndexPath::new(0, 1), IndexPath::new(0, 0))]
        );
        assert_eq!(replay(&old, &new, &batch), model_of(&new));
    }

    #[test]
    fn test_first_team_in_new_zone_inserts_section_only() {
        let old = GroupedView::build(vec![team(1, "A", "X", 0)]);
        let new = GroupedView::build(vec![team(1, "A", "X", 0), team(2, "Atlantis", "Mythic", 0)]);

        let batch = diff(&old, &new);

        assert_eq!(
            batch.events(),
            &[ChangeEvent::insert_section(0, Some("Mythic".to_string()))]
        );
        assert_eq!(replay(&old, &new, &batch), model_of(&new));
    }

    #[test]
    fn test_insert_into_existing_zone() {
        let old = GroupedView::build(vec![team(1, "A", "X", 3), team(2, "C", "X", 0)]);
        let new = GroupedView::build(vec![
            team(1, "A", "X", 3),
            team(2, "C", "X", 0),
            team(3, "B", "X", 0),
        ]);

        let batch = diff(&old, &new);

        assert_eq!(batch.events(), &[ChangeEvent::insert_row(3, IndexPath::new(0, 1))]);
    }

    #[test]
    fn test_removed_rows_and_sections() {
        let old = GroupedView::build(vec![
            team(1, "A", "X", 0),
            team(2, "B", "X", 0),
            team(3, "C", "Y", 0),
        ]);
        let new = GroupedView::build(vec![team(2, "B", "X", 0)]);

        let batch = diff(&old, &new);

        assert_eq!(
            batch.events(),
            &[
                ChangeEvent::delete_section(1, Some("Y".to_string())),
                ChangeEvent::delete_row(1, IndexPath::new(0, 0)),
            ]
        );
        assert_eq!(replay(&old, &new, &batch), model_of(&new));
    }

    #[test]
    fn test_zone_change_between_surviving_sections_is_move() {
        let old = GroupedView::build(vec![
            team(1, "A", "X", 0),
            team(2, "B", "X", 0),
            team(3, "C", "Y", 0),
        ]);
        let new = GroupedView::build(vec![
            team(1, "A", "Y", 0),
            team(2, "B", "X", 0),
            team(3, "C", "Y", 0),
        ]);

        let batch = diff(&old, &new);

        assert_eq!(
            batch.events(),
            &[ChangeEvent::move_row(1, IndexPath::new(0, 0), IndexPath::new(1, 0))]
        );
        assert_eq!(replay(&old, &new, &batch), model_of(&new));
    }

    #[test]
    fn test_zone_change_into_new_section_deletes_old_row() {
        let old = GroupedView::build(vec![team(1, "A", "X", 0), team(2, "B", "X", 0)]);
        let new = GroupedView::build(vec![team(1, "A", "Z", 0), team(2, "B", "X", 0)]);

        let batch = diff(&old, &new);

        assert_eq!(
            batch.events(),
            &[
                ChangeEvent::insert_section(1, Some("Z".to_string())),
                ChangeEvent::delete_row(1, IndexPath::new(0, 0)),
            ]
        );
        assert_eq!(replay(&old, &new, &batch), model_of(&new));
    }

    #[test]
    fn test_deliver_brackets_events_in_order() {
        let old = GroupedView::build(vec![team(1, "A", "X", 3)]);
        let new = GroupedView::build(vec![team(1, "A", "X", 4), team(2, "B", "Y", 0)]);
        let batch = diff(&old, &new);

        let mut recorder = Recorder::default();
        batch.deliver(&mut recorder);
        ChangeBatch::default().deliver(&mut recorder);

        let brackets = recorder.brackets.borrow();
        assert_eq!(brackets.len(), 1, "empty batch must not open a bracket");
        assert!(brackets[0].closed);
        assert_eq!(brackets[0].events, batch.events().to_vec());
        assert!(brackets[0].events[0].is_section());
    }

    /// Deterministic pseudo-random walk over many edits; every diff must replay
    /// onto the old view and reproduce the new one exactly.
    #[test]
    fn test_random_edits_replay_exactly() {
        let zones = ["Africa", "Asia", "Europe", "Oceania"];
        let names = ["A", "B", "C", "D", "E"];
        let mut seed: u64 = 0x2018;
        let mut next = move |bound: usize| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) as usize) % bound
        };

        let mut records: Vec<Team> = Vec::new();
        let mut next_id = 1;
        for _ in 0..400 {
            let old = GroupedView::build(records.clone());

            for _ in 0..=next(3) {
                match next(5) {
                    0 | 1 if !records.is_empty() => {
                        let i = next(records.len());
                        records[i].wins += 1 + next(3) as i32;
                    }
                    2 if !records.is_empty() => {
                        let i = next(records.len());
                        records.remove(i);
                    }
                    3 if !records.is_empty() => {
                        let i = next(records.len());
                        records[i].qualifying_zone = Some(zones[next(zones.len())].to_string());
                    }
                    _ => {
                        records.push(team(
                            next_id,
                            names[next(names.len())],
                            zones[next(zones.len())],
                            next(4) as i32,
                        ));
                        next_id += 1;
                    }
                }
            }

            let new = GroupedView::build(records.clone());
            let batch = diff(&old, &new);
            assert_eq!(replay(&old, &new, &batch), model_of(&new));

            for event in batch.iter() {
                if let ChangeEvent::Row {
                    kind: ChangeKind::Update,
                    team_id,
                    old: Some(o),
                    new: Some(n),
                } = event
                {
                    assert_ne!(old.object_at(*o), new.object_at(*n));
                    assert_eq!(new.object_at(*n).map(|t| t.id), Some(*team_id));
                }
            }
        }
    }
}
