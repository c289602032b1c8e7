pub mod catalog;
pub mod count;
pub mod engine;
pub mod hotkeys;
pub mod lane;
pub mod ledger;
pub mod notice;
pub mod remote;
pub mod rows;
pub mod session;
pub mod variants;

// Re-exports for convenience
pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use count::{Count, CountError, MAX_COUNT, MIN_COUNT};
pub use engine::{DataPaths, Engine, EngineError, EngineOptions};
pub use hotkeys::{
    DetachedHook, HookError, HotkeyBinding, HotkeyRouter, KeyEvent, KeyHook, KeySymbol,
    RouterState,
};
pub use lane::{Bound, CountingLane, LaneUpdate, Mutation};
pub use ledger::{FileStore, LedgerStore, MemoryStore, ProgressLedger};
pub use notice::Notice;
pub use remote::{CatalogApi, HttpSource, RemoteError, SpriteSource};
pub use session::{SessionState, SessionStore};
pub use variants::{LaneImage, Variant, VariantError, VariantListing};

pub use shinycount_types::{HuntMode, LaneId};
