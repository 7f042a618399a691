// World Cup standings - Core Library
// Store, seed import and list presenter; used by the binary and the tests

pub mod config;
pub mod db;
pub mod diff;
pub mod logging;
pub mod presenter;
pub mod seed;
pub mod table;
pub mod team;
pub mod view;

// Re-export commonly used types
pub use db::{count_teams, get_all_teams, setup_database, StoreError, TeamStore};
pub use diff::{diff, ChangeBatch, ChangeEvent, ChangeKind, ChangeSubscriber};
pub use presenter::{AddTeamForm, FormField, ListPresenter, PresenterError};
pub use seed::{
    import_if_empty, import_json, parse_seed, ImportOutcome, SeedEntry, SeedError, SeedSource,
    BUNDLED_SEED,
};
pub use table::{ListWidget, RowContent, SectionContent, TableModel};
pub use team::{NewTeam, Team, TeamId, PLACEHOLDER_IMAGE};
pub use view::{GroupedView, IndexPath, Section};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
