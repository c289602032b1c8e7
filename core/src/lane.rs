//! One counting session: the bound entry, its counter, the chosen variant
//! and the image being shown.
//!
//! Mutations never call into a UI. Each returns a [`LaneUpdate`] describing
//! what changed and whether feedback (the click sound) should fire; the front
//! end decides what to do with it. Persistence failures are logged and do not
//! roll back the in-memory value.

use std::path::Path;
use std::sync::Arc;

use shinycount_types::{LaneId, ThrottleConfig};

use crate::count::{Count, MAX_COUNT, MIN_COUNT};
use crate::ledger::ProgressLedger;
use crate::remote::SpriteSource;
use crate::session::SessionStore;
use crate::variants::{LaneImage, VariantCache, VariantError, VariantListing, VariantResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Increment,
    Decrement,
    Set,
    Rebind,
}

/// Counter limit the value sits on after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Floor,
    Ceiling,
}

impl Bound {
    fn at(value: u32) -> Option<Self> {
        match value {
            MIN_COUNT => Some(Bound::Floor),
            MAX_COUNT => Some(Bound::Ceiling),
            _ => None,
        }
    }
}

/// What a lane mutation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneUpdate {
    pub lane: LaneId,
    pub entry: Option<String>,
    pub mutation: Mutation,
    pub previous: u32,
    pub value: u32,
    pub bound: Option<Bound>,
    /// Front end should play the click
    pub feedback: bool,
}

impl LaneUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.value
    }
}

pub struct CountingLane<S> {
    id: LaneId,
    entry: Option<String>,
    variant: Option<String>,
    value: u32,
    image: Option<LaneImage>,
    ledger: ProgressLedger,
    session: SessionStore,
    resolver: VariantResolver<S>,
}

impl<S> CountingLane<S> {
    pub fn new(
        id: LaneId,
        data_dir: &Path,
        ledger: ProgressLedger,
        source: Arc<S>,
        throttle: &ThrottleConfig,
    ) -> Self {
        Self {
            id,
            entry: None,
            variant: None,
            value: MIN_COUNT,
            image: None,
            ledger,
            session: SessionStore::for_lane(data_dir, id),
            resolver: VariantResolver::new(source, throttle),
        }
    }

    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn image(&self) -> Option<&LaneImage> {
        self.image.as_ref()
    }

    pub fn variants(&self) -> &VariantCache {
        self.resolver.cache()
    }

    pub fn resolver(&self) -> &VariantResolver<S> {
        &self.resolver
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Counter
    // ─────────────────────────────────────────────────────────────────────────

    /// Add one, saturating at the ceiling. Always persists and asks for
    /// feedback, even when already at the ceiling.
    pub fn increment(&mut self) -> LaneUpdate {
        let previous = self.value;
        self.value = previous.saturating_add(1).min(MAX_COUNT);
        self.persist();
        self.update(Mutation::Increment, previous, true)
    }

    /// Subtract one. At zero this is a no-op and nothing is written.
    pub fn decrement(&mut self) -> LaneUpdate {
        let previous = self.value;
        if previous > MIN_COUNT {
            self.value = previous - 1;
            self.persist();
        }
        self.update(Mutation::Decrement, previous, false)
    }

    pub fn set_value(&mut self, count: Count) -> LaneUpdate {
        let previous = self.value;
        self.value = count.get();
        self.persist();
        self.update(Mutation::Set, previous, false)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry / session
    // ─────────────────────────────────────────────────────────────────────────

    /// Switch to `name`: drop the variant, cached variants and image, load the
    /// stored count (0 if none) and record the new session state.
    pub fn bind_entry(&mut self, name: &str) -> LaneUpdate {
        let previous = self.value;
        self.entry = Some(name.to_string());
        self.variant = None;
        self.image = None;
        self.resolver.clear();
        self.value = self.ledger.get(name).unwrap_or(MIN_COUNT);
        self.save_session();

        tracing::debug!(lane = %self.id, entry = name, value = self.value, "Bound entry");
        self.update(Mutation::Rebind, previous, false)
    }

    /// Pick up the lane's last session, if there is one. Returns whether
    /// anything was restored.
    pub fn restore(&mut self) -> bool {
        let Some(state) = self.session.restore() else {
            return false;
        };

        self.value = self.ledger.get(&state.entry).unwrap_or(MIN_COUNT);
        tracing::info!(
            lane = %self.id,
            entry = %state.entry,
            variant = ?state.variant,
            value = self.value,
            "Restored lane"
        );
        self.entry = Some(state.entry);
        self.variant = state.variant;
        true
    }

    /// Write the counter and session state. Every counter change goes through
    /// here, as do shutdown and mode switch.
    pub fn persist(&self) {
        self.save_progress();
        self.save_session();
    }

    fn save_progress(&self) {
        let Some(entry) = self.entry.as_deref() else {
            return;
        };
        if let Err(e) = self.ledger.upsert(entry, self.value) {
            tracing::warn!(lane = %self.id, entry, value = self.value, error = %e, "Failed to save progress");
        }
    }

    fn save_session(&self) {
        let Some(entry) = self.entry.as_deref() else {
            return;
        };
        if let Err(e) = self.session.save(entry, self.variant.as_deref()) {
            tracing::warn!(lane = %self.id, path = ?self.session.path(), error = %e, "Failed to save lane state");
        }
    }

    fn update(&self, mutation: Mutation, previous: u32, feedback: bool) -> LaneUpdate {
        LaneUpdate {
            lane: self.id,
            entry: self.entry.clone(),
            mutation,
            previous,
            value: self.value,
            bound: Bound::at(self.value),
            feedback,
        }
    }
}

impl<S: SpriteSource> CountingLane<S> {
    /// List the bound entry's variants. With no entry bound the list is empty.
    pub async fn resolve_variants(&mut self) -> VariantListing {
        let entry = self.entry.clone().unwrap_or_default();
        self.resolver.list_variants(&entry).await
    }

    /// Fetch the image for `label` and make it the lane's variant. On failure
    /// the displayed image is cleared.
    pub async fn select_variant(&mut self, label: &str) -> Result<&LaneImage, VariantError> {
        match self.resolver.fetch_image(label).await {
            Ok(image) => {
                self.variant = Some(image.label.clone());
                self.persist();
                tracing::debug!(lane = %self.id, variant = label, "Selected variant");
                Ok(self.image.insert(image))
            }
            Err(e) => {
                self.image = None;
                tracing::warn!(lane = %self.id, variant = label, error = %e, "Failed to load variant image");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryStore;
    use crate::variants::tests::{FakeSprites, pikachu_page};
    use proptest::prelude::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<MemoryStore>,
        lane: CountingLane<FakeSprites>,
    }

    fn fixture(ledger: &str, sprites: FakeSprites) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_contents(ledger));
        let lane = CountingLane::new(
            LaneId::Primary,
            dir.path(),
            ProgressLedger::new(store.clone()),
            Arc::new(sprites),
            &ThrottleConfig::default(),
        );
        Fixture {
            _dir: dir,
            store,
            lane,
        }
    }

    #[test]
    fn test_bind_then_increment_updates_ledger() {
        let mut f = fixture("Pikachu,5\n", FakeSprites::default());

        let bound = f.lane.bind_entry("Pikachu");
        assert_eq!(bound.value, 5);
        assert_eq!(bound.mutation, Mutation::Rebind);

        let update = f.lane.increment();
        assert_eq!((update.previous, update.value), (5, 6));
        assert!(update.feedback);
        assert_eq!(f.store.contents().unwrap(), "Pikachu,6\n");
    }

    #[test]
    fn test_decrement_at_floor_writes_nothing() {
        let mut f = fixture("", FakeSprites::default());
        f.lane.bind_entry("Eevee");

        let update = f.lane.decrement();
        assert!(!update.changed());
        assert_eq!(update.bound, Some(Bound::Floor));
        assert!(f.store.writes().is_empty());

        f.lane.increment();
        let update = f.lane.decrement();
        assert_eq!(update.value, 0);
        assert!(!update.feedback);
        assert_eq!(f.store.writes().len(), 2);
    }

    #[test]
    fn test_increment_at_ceiling_still_persists() {
        let mut f = fixture("Eevee,999999\n", FakeSprites::default());
        f.lane.bind_entry("Eevee");

        let update = f.lane.increment();
        assert_eq!(update.value, MAX_COUNT);
        assert_eq!(update.bound, Some(Bound::Ceiling));
        assert!(update.feedback);
        assert_eq!(f.store.writes(), vec!["Eevee,999999\n".to_string()]);
    }

    #[test]
    fn test_counter_mutations_rewrite_lane_state() {
        let mut f = fixture("Pikachu,5\n", FakeSprites::default());
        f.lane.bind_entry("Pikachu");
        let state = f.lane.session().path().to_path_buf();

        std::fs::remove_file(&state).unwrap();
        f.lane.increment();
        assert!(state.exists());

        std::fs::remove_file(&state).unwrap();
        f.lane.set_value(Count::new(9).unwrap());
        assert!(state.exists());

        std::fs::remove_file(&state).unwrap();
        f.lane.decrement();
        assert!(state.exists());
        assert_eq!(f.lane.session().restore().unwrap().entry, "Pikachu");
    }

    #[test]
    fn test_decrement_at_floor_leaves_lane_state_alone() {
        let mut f = fixture("", FakeSprites::default());
        f.lane.bind_entry("Eevee");
        let state = f.lane.session().path().to_path_buf();

        std::fs::remove_file(&state).unwrap();
        f.lane.decrement();
        assert!(!state.exists());
    }

    proptest! {
        #[test]
        fn test_counter_stays_in_range(
            start in prop_oneof![0..=16u32, (MAX_COUNT - 16)..=MAX_COUNT],
            steps in proptest::collection::vec(any::<bool>(), 0..64),
        ) {
            let mut f = fixture("", FakeSprites::default());
            f.lane.bind_entry("Eevee");
            f.lane.set_value(Count::new(start).unwrap());

            let mut expected = start;
            for up in steps {
                let update = if up { f.lane.increment() } else { f.lane.decrement() };
                expected = if up {
                    (expected + 1).min(MAX_COUNT)
                } else {
                    expected.saturating_sub(1)
                };
                prop_assert!(update.value <= MAX_COUNT);
                prop_assert_eq!(update.value, expected);
                prop_assert_eq!(update.bound, Bound::at(expected));
            }
            prop_assert_eq!(f.lane.value(), expected);
        }
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut f = fixture("Pikachu,5\nEevee,2\n", FakeSprites::default());

        f.lane.bind_entry("Pikachu");
        let again = f.lane.bind_entry("Pikachu");

        assert!(!again.changed());
        assert_eq!(f.lane.value(), 5);
        assert_eq!(f.store.contents().unwrap(), "Pikachu,5\nEevee,2\n");
    }

    #[test]
    fn test_unbound_lane_counts_without_persisting() {
        let mut f = fixture("", FakeSprites::default());
        assert_eq!(f.lane.increment().value, 1);
        assert!(f.store.writes().is_empty());
        assert!(!f.lane.session().path().exists());
    }

    #[test]
    fn test_restore_picks_up_saved_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_contents("Pikachu,41\n"));
        let source = Arc::new(FakeSprites::default());
        let new_lane = || {
            CountingLane::new(
                LaneId::Secondary,
                dir.path(),
                ProgressLedger::new(store.clone()),
                source.clone(),
                &ThrottleConfig::default(),
            )
        };

        let mut first = new_lane();
        assert!(!first.restore());
        first.bind_entry("Pikachu");
        first.increment();

        let mut second = new_lane();
        assert!(second.restore());
        assert_eq!(second.entry(), Some("Pikachu"));
        assert_eq!(second.value(), 42);
        assert!(dir.path().join("last_state_2.txt").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_variant_updates_lane() {
        let mut f = fixture("Pikachu,5\n", FakeSprites::default().with_page("Pikachu", pikachu_page()));
        f.lane.bind_entry("Pikachu");

        let listing = f.lane.resolve_variants().await;
        assert_eq!(listing.variants.len(), 2);

        let image = f.lane.select_variant("home: pikachu").await.unwrap();
        assert_eq!(image.width, 2);
        assert_eq!(f.lane.variant(), Some("home: pikachu"));
        assert_eq!(
            f.lane.session().restore().unwrap().variant.as_deref(),
            Some("home: pikachu")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_variant_clears_image() {
        let mut f = fixture("", FakeSprites::default().with_page("Pikachu", pikachu_page()));
        f.lane.bind_entry("Pikachu");
        f.lane.resolve_variants().await;
        f.lane.select_variant("home: pikachu").await.unwrap();
        assert!(f.lane.image().is_some());

        assert!(f.lane.select_variant("x-y: pikachu").await.is_err());
        assert!(f.lane.image().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_variant_clears_image() {
        let mut f = fixture("", FakeSprites::default().with_page("Pikachu", pikachu_page()));
        f.lane.bind_entry("Pikachu");
        f.lane.resolve_variants().await;
        f.lane.select_variant("home: pikachu").await.unwrap();
        assert!(f.lane.image().is_some());

        let mut broken = fixture(
            "",
            FakeSprites {
                image_bytes: Some(b"not an image".to_vec()),
                ..FakeSprites::default()
            }
            .with_page("Pikachu", pikachu_page()),
        );
        broken.lane.bind_entry("Pikachu");
        broken.lane.resolve_variants().await;
        broken.lane.image = f.lane.image.take();

        let err = broken.lane.select_variant("home: pikachu").await.unwrap_err();
        assert!(matches!(err, VariantError::Decode(_)), "{err:?}");
        assert!(broken.lane.image().is_none());
        assert!(broken.lane.variant().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebind_clears_variant_state() {
        let mut f = fixture("", FakeSprites::default().with_page("Pikachu", pikachu_page()));
        f.lane.bind_entry("Pikachu");
        f.lane.resolve_variants().await;
        f.lane.select_variant("home: pikachu").await.unwrap();

        f.lane.bind_entry("Eevee");
        assert!(f.lane.variant().is_none());
        assert!(f.lane.image().is_none());
        assert!(f.lane.variants().is_empty());
    }
}
