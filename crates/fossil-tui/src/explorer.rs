use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fossil_client::{sorted_versions, KeyValueStore, StoreError};
use fossil_core::outline::{Outline, OutlineLine};
use fossil_core::types::CollectionKey;
use fossil_core::view::RecordView;
use tracing::info;

/// State of one open record: its versions, fetched values and outline.
///
/// Values are fetched once per version and kept until the explorer closes.
#[derive(Debug)]
pub struct RecordExplorer {
    pub key: CollectionKey,
    /// Ascending.
    pub versions: Vec<u64>,
    pub selected: usize,
    pub outline: Outline,
    pub cursor: usize,
    pub hex: bool,
    cache: HashMap<u64, Vec<u8>>,
    view: Option<RecordView>,
    /// Outline of `view` under the current fold state.
    lines: Vec<OutlineLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterDelete {
    /// Another version is now selected.
    Remaining,
    /// No versions are left; the explorer should close.
    Exhausted,
}

impl RecordExplorer {
    pub async fn open<S: KeyValueStore>(
        store: &mut S,
        key: CollectionKey,
    ) -> Result<Self, StoreError> {
        let versions = sorted_versions(store, &key).await?;
        let mut explorer = Self {
            key,
            selected: versions.len().saturating_sub(1),
            versions,
            outline: Outline::new(),
            cursor: 0,
            hex: false,
            cache: HashMap::new(),
            view: None,
            lines: Vec::new(),
        };
        if let Some(version) = explorer.selected_version() {
            explorer.fetch(store, version).await?;
            explorer.rebuild_view();
        }
        Ok(explorer)
    }

    pub fn selected_version(&self) -> Option<u64> {
        self.versions.get(self.selected).copied()
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.cache.get(&self.selected_version()?).map(Vec::as_slice)
    }

    pub fn view(&self) -> Option<&RecordView> {
        self.view.as_ref()
    }

    pub fn lines(&self) -> &[OutlineLine] {
        &self.lines
    }

    /// Fetches `version` into the cache unless it is already there.
    async fn fetch<S: KeyValueStore>(
        &mut self,
        store: &mut S,
        version: u64,
    ) -> Result<(), StoreError> {
        if !self.cache.contains_key(&version) {
            let fetched = store.get(&self.key, Some(version)).await?;
            info!(
                collection = %self.key.collection,
                key = %self.key.key,
                version,
                bytes = fetched.value.len(),
                "fetched version"
            );
            self.cache.insert(version, fetched.value);
        }
        Ok(())
    }

    fn rebuild_view(&mut self) {
        self.view = self.data().map(|bytes| {
            if self.hex {
                RecordView::hex(bytes, None)
            } else {
                RecordView::from_bytes(bytes)
            }
        });
        self.rebuild_lines();
    }

    fn rebuild_lines(&mut self) {
        self.lines = match &self.view {
            Some(view) => self.outline.lines(view),
            None => Vec::new(),
        };
        self.cursor = self.cursor.min(self.lines.len().saturating_sub(1));
    }

    fn clear_view(&mut self) {
        self.view = None;
        self.lines.clear();
        self.cursor = 0;
    }

    /// Nothing changes unless the version's value could be fetched.
    pub async fn select<S: KeyValueStore>(
        &mut self,
        store: &mut S,
        index: usize,
    ) -> Result<(), StoreError> {
        if index >= self.versions.len() || index == self.selected {
            return Ok(());
        }
        let version = self.versions[index];
        self.fetch(store, version).await?;
        self.selected = index;
        self.outline = Outline::new();
        self.cursor = 0;
        self.rebuild_view();
        Ok(())
    }

    pub async fn step_version<S: KeyValueStore>(
        &mut self,
        store: &mut S,
        delta: isize,
    ) -> Result<(), StoreError> {
        if self.versions.is_empty() {
            return Ok(());
        }
        let last = self.versions.len() as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, last) as usize;
        self.select(store, next).await
    }

    pub fn toggle_hex(&mut self) {
        self.hex = !self.hex;
        self.cursor = 0;
        self.rebuild_view();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.lines.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    /// Collapses or expands the nested field under the cursor.
    pub fn toggle_at_cursor(&mut self) {
        let Some(path) = self
            .lines
            .get(self.cursor)
            .filter(|l| l.expandable)
            .map(|l| l.path.clone())
        else {
            return;
        };
        self.outline.toggle(&path);
        self.rebuild_lines();
    }

    /// Writes the selected version's bytes into `dir` and returns the path.
    pub fn save(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let (Some(version), Some(bytes)) = (self.selected_version(), self.data()) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no version selected",
            ));
        };
        let path = dir.join(self.key.version_file_name(version));
        std::fs::write(&path, bytes)?;
        info!(
            collection = %self.key.collection,
            key = %self.key.key,
            version,
            path = %path.display(),
            "saved version"
        );
        Ok(path)
    }

    /// Deletes the selected version, relists, and selects the newest remaining one.
    /// When the relist or the fetch fails the view stays empty.
    pub async fn delete_selected<S: KeyValueStore>(
        &mut self,
        store: &mut S,
    ) -> Result<AfterDelete, StoreError> {
        let Some(version) = self.selected_version() else {
            return Ok(AfterDelete::Exhausted);
        };
        store.delete_version(&self.key, version).await?;
        info!(
            collection = %self.key.collection,
            key = %self.key.key,
            version,
            "deleted version"
        );
        self.cache.remove(&version);
        self.versions.retain(|&v| v != version);
        self.selected = self.versions.len().saturating_sub(1);
        self.outline = Outline::new();
        self.clear_view();
        self.versions = sorted_versions(store, &self.key).await?;
        let Some(&latest) = self.versions.last() else {
            return Ok(AfterDelete::Exhausted);
        };
        self.selected = self.versions.len() - 1;
        self.fetch(store, latest).await?;
        self.rebuild_view();
        Ok(AfterDelete::Remaining)
    }
}
