//! Engine facade: owns the catalog, the shared ledger, up to two counting
//! lanes and the hotkey router.
//!
//! ```text
//!   OS hook thread ──KeyEvent──► mpsc (32) ──► Engine::handle_key
//!                                                   │
//!                                     HotkeyRouter::route → lane 1 | lane 2
//!                                                   │
//!                                     CountingLane::increment → LaneUpdate
//! ```
//!
//! Everything runs on the caller's task. Remote and file problems never
//! fail the engine; they become [`Notice`]s the front end can show.

mod paths;


use std::future::Future;
use std::io;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use shinycount_types::{AppConfig, HuntMode, LaneId, ThrottleConfig};

use crate::catalog::{self, Catalog, CatalogError};
use crate::count::Count;
use crate::hotkeys::{HookError, HotkeyBinding, HotkeyRouter, KeyEvent, KeyHook, KeySymbol};
use crate::lane::{CountingLane, LaneUpdate};
use crate::ledger::ProgressLedger;
use crate::notice::Notice;
use crate::remote::{CatalogApi, SpriteSource};
use crate::variants::{LaneImage, VariantError, VariantListing};

pub use paths::DataPaths;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("'{0}' is not in the catalog")]
    UnknownEntry(String),
    #[error("{0} is not active")]
    LaneInactive(LaneId),
    #[error("{0} has no entry selected")]
    NoEntryBound(LaneId),
    #[error(transparent)]
    Variant(#[from] VariantError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to save hotkeys to {path}: {source}")]
    SaveBinding {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub throttle: ThrottleConfig,
    pub hunt_mode: HuntMode,
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            throttle: config.throttle.clone(),
            hunt_mode: config.hunt_mode,
        }
    }
}

pub struct Engine<S, H> {
    paths: DataPaths,
    catalog: Catalog,
    ledger: ProgressLedger,
    source: Arc<S>,
    throttle: ThrottleConfig,
    primary: CountingLane<S>,
    secondary: Option<CountingLane<S>>,
    router: HotkeyRouter<H>,
    notices: Vec<Notice>,
}

impl<S: SpriteSource, H: KeyHook> Engine<S, H> {
    /// Open the engine on a data directory, with the ledger at
    /// `progress.csv`. Returns the receiving end of the hotkey channel.
    pub fn open(
        paths: DataPaths,
        source: Arc<S>,
        hook: H,
        options: EngineOptions,
    ) -> (Self, mpsc::Receiver<KeyEvent>) {
        let ledger = ProgressLedger::open(paths.progress());
        Self::with_ledger(paths, ledger, source, hook, options)
    }

    pub fn with_ledger(
        paths: DataPaths,
        ledger: ProgressLedger,
        source: Arc<S>,
        hook: H,
        options: EngineOptions,
    ) -> (Self, mpsc::Receiver<KeyEvent>) {
        let mut notices = Vec::new();

        let catalog_path = paths.catalog();
        let catalog = match Catalog::load(&catalog_path) {
            Ok(catalog) => catalog,
            Err(e) if e.is_not_found() => {
                tracing::warn!(path = ?catalog_path, "Catalog file not found");
                notices.push(Notice::new(
                    "Catalog missing",
                    "No catalog file found. Refresh the catalog to download it.",
                ));
                Catalog::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load catalog");
                notices.push(Notice::new("Catalog unreadable", e.to_string()));
                Catalog::new()
            }
        };

        let binding = HotkeyBinding::load(&paths.hotkeys());
        let (mut router, rx) = HotkeyRouter::new(hook, binding);
        if let Err(e) = router.start() {
            notices.push(Notice::new("Hotkeys unavailable", e.to_string()));
        }

        let mut primary = CountingLane::new(
            LaneId::Primary,
            paths.root(),
            ledger.clone(),
            source.clone(),
            &options.throttle,
        );
        primary.restore();

        let mut engine = Self {
            paths,
            catalog,
            ledger,
            source,
            throttle: options.throttle,
            primary,
            secondary: None,
            router,
            notices,
        };
        engine.set_mode(options.hunt_mode);

        tracing::info!(
            data_dir = ?engine.paths.root(),
            entries = engine.catalog.len(),
            mode = ?engine.mode(),
            "Engine ready"
        );
        (engine, rx)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mode and routing
    // ─────────────────────────────────────────────────────────────────────────

    /// Switch hunt mode. Dual brings up lane 2 (restoring its last session);
    /// single saves and drops it, leaving its files in place.
    pub fn set_mode(&mut self, mode: HuntMode) {
        match mode {
            HuntMode::Dual if self.secondary.is_none() => {
                let mut lane = CountingLane::new(
                    LaneId::Secondary,
                    self.paths.root(),
                    self.ledger.clone(),
                    self.source.clone(),
                    &self.throttle,
                );
                lane.restore();
                self.secondary = Some(lane);
            }
            HuntMode::Single => {
                if let Some(lane) = self.secondary.take() {
                    lane.persist();
                }
            }
            HuntMode::Dual => {}
        }
        self.router.set_mode(mode);
    }

    pub fn mode(&self) -> HuntMode {
        self.router.mode()
    }

    /// Route one key press and increment the target lane.
    pub fn handle_key(&mut self, key: KeySymbol) -> Option<LaneUpdate> {
        let Some(id) = self.router.route(key) else {
            tracing::trace!(%key, "Ignoring key");
            return None;
        };
        match self.lane_mut(id) {
            Ok(lane) => Some(lane.increment()),
            Err(e) => {
                tracing::debug!(%key, error = %e, "Dropping routed key");
                None
            }
        }
    }

    /// Drain hotkey events until `shutdown` resolves or the channel closes,
    /// calling `on_update` for every increment. Events already queued are
    /// handled before shutdown is honoured.
    pub async fn run_hotkeys<F>(
        &mut self,
        rx: &mut mpsc::Receiver<KeyEvent>,
        shutdown: F,
        mut on_update: impl FnMut(&LaneUpdate),
    ) where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                event = rx.recv() => match event {
                    Some(event) => {
                        if let Some(update) = self.handle_key(event.key) {
                            on_update(&update);
                        }
                    }
                    None => break,
                },
                () = &mut shutdown => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lane operations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn increment(&mut self, lane: LaneId) -> Result<LaneUpdate, EngineError> {
        Ok(self.lane_mut(lane)?.increment())
    }

    pub fn decrement(&mut self, lane: LaneId) -> Result<LaneUpdate, EngineError> {
        Ok(self.lane_mut(lane)?.decrement())
    }

    pub fn set_value(&mut self, lane: LaneId, count: Count) -> Result<LaneUpdate, EngineError> {
        Ok(self.lane_mut(lane)?.set_value(count))
    }

    /// Bind `name` to `lane` and list its variants. Names outside the
    /// catalog are refused before anything goes to the network.
    pub async fn select_entry(
        &mut self,
        lane: LaneId,
        name: &str,
    ) -> Result<(LaneUpdate, VariantListing), EngineError> {
        if !self.catalog.contains(name) {
            return Err(EngineError::UnknownEntry(name.to_string()));
        }

        let lane = self.lane_mut(lane)?;
        let update = lane.bind_entry(name);
        let listing = lane.resolve_variants().await;
        if let Some(notice) = &listing.notice {
            self.notices.push(notice.clone());
        }
        Ok((update, listing))
    }

    /// Re-list the bound entry's variants
    pub async fn refresh_variants(&mut self, lane: LaneId) -> Result<VariantListing, EngineError> {
        let lane = self.lane_mut(lane)?;
        if lane.entry().is_none() {
            return Err(EngineError::NoEntryBound(lane.id()));
        }
        let listing = lane.resolve_variants().await;
        if let Some(notice) = &listing.notice {
            self.notices.push(notice.clone());
        }
        Ok(listing)
    }

    /// Select a variant on `lane`. When the lane has no listed variants yet
    /// (fresh start after a restore) they are listed first.
    pub async fn select_variant(
        &mut self,
        lane: LaneId,
        label: &str,
    ) -> Result<LaneImage, EngineError> {
        let id = lane;
        let listing_notice = {
            let lane = self.lane_mut(id)?;
            if lane.entry().is_none() {
                return Err(EngineError::NoEntryBound(id));
            }
            if lane.variants().is_empty() {
                lane.resolve_variants().await.notice
            } else {
                None
            }
        };
        if let Some(notice) = listing_notice {
            self.notices.push(notice);
            return Err(VariantError::UnknownVariant(label.to_string()).into());
        }

        let selected = self.lane_mut(id)?.select_variant(label).await.cloned();
        match selected {
            Ok(image) => Ok(image),
            Err(e) => {
                if !matches!(e, VariantError::UnknownVariant(_)) {
                    self.notices.push(Notice::new("Image unavailable", e.to_string()));
                }
                Err(e.into())
            }
        }
    }

    pub fn lane(&self, id: LaneId) -> Option<&CountingLane<S>> {
        match id {
            LaneId::Primary => Some(&self.primary),
            LaneId::Secondary => self.secondary.as_ref(),
        }
    }

    pub fn lanes(&self) -> impl Iterator<Item = &CountingLane<S>> {
        std::iter::once(&self.primary).chain(self.secondary.as_ref())
    }

    fn lane_mut(&mut self, id: LaneId) -> Result<&mut CountingLane<S>, EngineError> {
        match id {
            LaneId::Primary => Ok(&mut self.primary),
            LaneId::Secondary => self
                .secondary
                .as_mut()
                .ok_or(EngineError::LaneInactive(id)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hotkeys and catalog
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the hotkey binding and save it. The new binding is written
    /// even if the hook refuses it, so it applies on the next start.
    pub fn rebind(&mut self, binding: HotkeyBinding) -> Result<(), EngineError> {
        let hooked = self.router.rebind(binding);

        let path = self.paths.hotkeys();
        binding
            .save(&path)
            .map_err(|source| EngineError::SaveBinding { path, source })?;

        if let Err(e) = &hooked {
            self.notices.push(Notice::new("Hotkeys unavailable", e.to_string()));
        }
        hooked.map_err(EngineError::from)
    }

    pub fn binding(&self) -> &HotkeyBinding {
        self.router.binding()
    }

    pub fn router(&self) -> &HotkeyRouter<H> {
        &self.router
    }

    /// Rebuild the catalog from the listing API and swap it in. On failure
    /// the current catalog and file stay as they were.
    pub async fn refresh_catalog<A: CatalogApi>(&mut self, api: &A) -> Result<usize, EngineError> {
        match catalog::refresh_catalog(api, &self.paths.catalog()).await {
            Ok(catalog) => {
                self.catalog = catalog;
                Ok(self.catalog.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog refresh failed");
                self.notices.push(Notice::new("Catalog refresh failed", e.to_string()));
                Err(e.into())
            }
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        mem::take(&mut self.notices)
    }

    /// Save every lane and remove the OS hook.
    pub fn shutdown(&mut self) {
        for lane in self.lanes() {
            lane.persist();
        }
        self.router.shutdown();
        tracing::info!("Engine shut down");
    }
}
