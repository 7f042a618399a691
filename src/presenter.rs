// 🎛️ List Presenter - store changes → incremental list updates, user actions → store
//
// Events are buffered between `begin` and `end` and applied as one batch:
//   1. row deletes     (old paths, descending)
//   2. section deletes (old indexes, descending)
//   3. section inserts (new indexes, ascending)
//   4. row inserts     (new paths, ascending)
//   5. row refreshes   (new paths)
// Moves are split into a delete (step 1) and an insert (step 4).

use crate::db::{StoreError, TeamStore};
use crate::diff::{ChangeEvent, ChangeKind, ChangeSubscriber};
use crate::table::{ListWidget, RowContent, SectionContent};
use crate::team::NewTeam;
use crate::view::IndexPath;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PresenterError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("a change batch is still being applied")]
    UpdateInProgress,

    #[error("no team at {0}")]
    NoSuchRow(IndexPath),

    #[error("adding teams is disabled")]
    AddTeamDisabled,

    #[error("no add-team form is open")]
    NoOpenForm,
}

// ============================================================================
// ADD-TEAM FORM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Zone,
}

/// Two free-text inputs; no validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTeamForm {
    pub name: String,
    pub zone: String,
    pub focus: FormField,
}

impl Default for AddTeamForm {
    fn default() -> Self {
        AddTeamForm {
            name: String::new(),
            zone: String::new(),
            focus: FormField::Name,
        }
    }
}

impl AddTeamForm {
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FormField::Name => FormField::Zone,
            FormField::Zone => FormField::Name,
        };
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Name => &mut self.name,
            FormField::Zone => &mut self.zone,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
    }
}

// ============================================================================
// PRESENTER
// ============================================================================

pub struct ListPresenter<W: ListWidget> {
    store: TeamStore,
    widget: W,
    pending: Vec<ChangeEvent>,
    updating: bool,
    add_enabled: bool,
    form: Option<AddTeamForm>,
}

impl<W: ListWidget> ListPresenter<W> {
    /// Take ownership of the store and render its current view into the widget
    pub fn new(store: TeamStore, mut widget: W) -> Self {
        widget.reload_data(
            store
                .grouped_view()
                .sections()
                .iter()
                .map(SectionContent::from)
                .collect(),
        );

        ListPresenter {
            store,
            widget,
            pending: Vec::new(),
            updating: false,
            add_enabled: false,
            form: None,
        }
    }

    pub fn store(&self) -> &TeamStore {
        &self.store
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn into_parts(self) -> (TeamStore, W) {
        (self.store, self.widget)
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Selecting a row counts one more win for that team
    pub fn tap_row(&mut self, path: IndexPath) -> Result<(), PresenterError> {
        self.ensure_idle()?;
        let team = self
            .store
            .grouped_view()
            .object_at(path)
            .ok_or(PresenterError::NoSuchRow(path))?;
        let id = team.id;
        debug!(team = id, %path, "tap");

        self.store.increment_wins(id);
        self.commit()
    }

    /// Shake gesture unlocks the add button
    pub fn device_shaken(&mut self) {
        if !self.add_enabled {
            info!("add button enabled");
        }
        self.add_enabled = true;
    }

    pub fn is_add_enabled(&self) -> bool {
        self.add_enabled
    }

    pub fn begin_add_team(&mut self) -> Result<(), PresenterError> {
        if !self.add_enabled {
            return Err(PresenterError::AddTeamDisabled);
        }
        self.form = Some(AddTeamForm::default());
        Ok(())
    }

    pub fn form(&self) -> Option<&AddTeamForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut AddTeamForm> {
        self.form.as_mut()
    }

    /// Save the open form as a new team. The form closes whether or not the commit succeeds.
    pub fn confirm_add_team(&mut self) -> Result<(), PresenterError> {
        self.ensure_idle()?;
        let form = self.form.take().ok_or(PresenterError::NoOpenForm)?;
        self.add_team(&form.name, &form.zone)
    }

    pub fn cancel_add_team(&mut self) {
        self.form = None;
    }

    pub fn add_team(&mut self, name: &str, zone: &str) -> Result<(), PresenterError> {
        self.ensure_idle()?;
        info!(name, zone, "adding team");
        self.store.insert(NewTeam::from_form(name, zone));
        self.commit()
    }

    /// Flush anything still staged (called on shutdown)
    pub fn save(&mut self) -> Result<(), PresenterError> {
        self.ensure_idle()?;
        self.commit()
    }

    fn ensure_idle(&self) -> Result<(), PresenterError> {
        if self.updating {
            return Err(PresenterError::UpdateInProgress);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PresenterError> {
        let batch = self.store.commit()?;
        batch.deliver(self);
        Ok(())
    }

    // ========================================================================
    // BATCH APPLICATION
    // ========================================================================

    fn apply_pending(&mut self) {
        let events = std::mem::take(&mut self.pending);

        let mut row_deletes = Vec::new();
        let mut section_deletes = Vec::new();
        let mut section_inserts = Vec::new();
        let mut row_inserts = Vec::new();
        let mut refreshes = Vec::new();

        for event in &events {
            match event {
                ChangeEvent::Section { kind, index, .. } => match kind {
                    ChangeKind::Insert => section_inserts.push(*index),
                    ChangeKind::Delete => section_deletes.push(*index),
                    ChangeKind::Update | ChangeKind::Move => {
                        warn!(%event, "ignoring section event");
                    }
                },
                ChangeEvent::Row { kind, old, new, .. } => match (kind, *old, *new) {
                    (ChangeKind::Insert, _, Some(new)) => row_inserts.push(new),
                    (ChangeKind::Delete, Some(old), _) => row_deletes.push(old),
                    (ChangeKind::Update, old, new) => {
                        if let Some(path) = new.or(old) {
                            refreshes.push(path);
                        }
                    }
                    (ChangeKind::Move, Some(old), Some(new)) if old == new => refreshes.push(new),
                    (ChangeKind::Move, Some(old), Some(new)) => {
                        row_deletes.push(old);
                        row_inserts.push(new);
                    }
                    _ => warn!(%event, "ignoring row event without paths"),
                },
            }
        }

        row_deletes.sort();
        row_deletes.dedup();
        section_deletes.sort();
        section_deletes.dedup();
        section_inserts.sort();
        section_inserts.dedup();
        row_inserts.sort();
        row_inserts.dedup();

        let view = self.store.grouped_view();
        let widget = &mut self.widget;

        widget.begin_updates();
        for path in row_deletes.iter().rev() {
            widget.delete_row(*path);
        }
        for index in section_deletes.iter().rev() {
            widget.delete_section(*index);
        }
        for index in section_inserts {
            match view.section(index) {
                Some(section) => widget.insert_section(index, SectionContent::from(section)),
                None => warn!(index, "inserted section missing from view"),
            }
        }
        for path in row_inserts {
            match view.object_at(path) {
                Some(team) => widget.insert_row(path, RowContent::from(team)),
                None => warn!(%path, "inserted row missing from view"),
            }
        }
        for path in refreshes {
            // re-read current values from the store
            match view.object_at(path) {
                Some(team) => widget.reload_row(path, RowContent::from(team)),
                None => warn!(%path, "updated row missing from view"),
            }
        }
        widget.end_updates();

        debug!(events = events.len(), "applied change batch");
    }
}

impl<W: ListWidget> ChangeSubscriber for ListPresenter<W> {
    fn begin(&mut self) {
        self.updating = true;
        self.pending.clear();
    }

    fn apply(&mut self, event: &ChangeEvent) {
        self.pending.push(event.clone());
    }

    fn end(&mut self) {
        self.apply_pending();
        self.updating = false;
    }
}
