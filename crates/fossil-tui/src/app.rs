use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fossil_client::{sorted_versions, KeyValueStore};
use fossil_core::types::{CollectionKey, KeyQuery};
use fossil_observe::metrics::RpcStats;
use tracing::{info, warn};

use crate::explorer::{AfterDelete, RecordExplorer};

/// File the key browser writes the latest value of a key to.
pub const OUT_FILE: &str = "out.bin";

#[derive(Debug, Clone)]
pub struct Settings {
    pub collection: String,
    pub page_size: u32,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Collection,
    AfterKey,
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    ConfirmDelete { version: u64 },
    Notice(String),
}

/// Versions of the highlighted key, or why they could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub key: String,
    pub versions: Result<Vec<u64>, String>,
}

#[derive(Debug)]
pub struct App<S> {
    pub store: S,
    pub settings: Settings,
    pub collection: String,
    pub after_key: String,
    pub prefix: String,
    pub input_mode: InputMode,
    pub input: String,
    pub keys: Vec<String>,
    pub selected_row: usize,
    pub key_info: Option<KeyInfo>,
    pub explorer: Option<RecordExplorer>,
    pub modal: Option<Modal>,
    pub status: String,
    pub rpc_stats: Option<Arc<RpcStats>>,
    pub quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        Self {
            store,
            collection: settings.collection.clone(),
            settings,
            after_key: String::new(),
            prefix: String::new(),
            input_mode: InputMode::Normal,
            input: String::new(),
            keys: Vec::new(),
            selected_row: 0,
            key_info: None,
            explorer: None,
            modal: None,
            status: "starting".to_string(),
            rpc_stats: None,
            quit: false,
        }
    }

    pub fn with_rpc_stats(mut self, stats: Arc<RpcStats>) -> Self {
        self.rpc_stats = Some(stats);
        self
    }

    pub fn query(&self) -> KeyQuery {
        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        KeyQuery {
            collection: self.collection.clone(),
            start_after: non_empty(&self.after_key),
            prefix: non_empty(&self.prefix),
            limit: self.settings.page_size,
        }
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.keys.get(self.selected_row).map(String::as_str)
    }

    pub async fn refresh_keys(&mut self) {
        let query = self.query();
        match self.store.list_keys(&query).await {
            Ok(keys) => {
                self.status = format!(
                    "{} keys from {} after '{}'",
                    keys.len(),
                    query.collection,
                    query.start_after.as_deref().unwrap_or("")
                );
                self.keys = keys;
            }
            Err(err) => {
                warn!(collection = %query.collection, error = %err, "list keys failed");
                self.keys.clear();
                self.status = format!("Could not load keys: {err}");
            }
        }
        self.selected_row = 0;
        self.update_key_info().await;
    }

    /// Next page starts after the last key of the current one.
    pub async fn show_next(&mut self) {
        match self.keys.last() {
            Some(last) => {
                self.after_key = last.clone();
                self.refresh_keys().await;
            }
            None => self.status = "no more keys".to_string(),
        }
    }

    async fn update_key_info(&mut self) {
        let Some(key) = self.selected_key().map(str::to_string) else {
            self.key_info = None;
            return;
        };
        let ck = CollectionKey::new(self.collection.clone(), key.clone());
        let versions = sorted_versions(&mut self.store, &ck)
            .await
            .map_err(|err| format!("Could not load versions: {err}"));
        self.key_info = Some(KeyInfo { key, versions });
    }

    pub async fn move_selection(&mut self, delta: isize) {
        if self.keys.is_empty() {
            self.selected_row = 0;
            return;
        }
        let len = self.keys.len() as isize;
        let next = (self.selected_row as isize + delta).clamp(0, len - 1) as usize;
        if next != self.selected_row || self.key_info.is_none() {
            self.selected_row = next;
            self.update_key_info().await;
        }
    }

    /// Writes the latest value of the highlighted key to `out.bin`.
    pub async fn write_latest(&mut self) -> Result<PathBuf> {
        let key = self
            .selected_key()
            .ok_or_else(|| anyhow::anyhow!("no key selected"))?;
        let ck = CollectionKey::new(self.collection.clone(), key);
        let value = self.store.get(&ck, None).await?;
        let path = self.settings.out_dir.join(OUT_FILE);
        tokio::fs::write(&path, &value.value).await?;
        info!(
            collection = %ck.collection,
            key = %ck.key,
            version = value.version,
            path = %path.display(),
            "wrote latest version"
        );
        Ok(path)
    }

    pub async fn open_explorer(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        let ck = CollectionKey::new(self.collection.clone(), key);
        match RecordExplorer::open(&mut self.store, ck).await {
            Ok(explorer) if explorer.versions.is_empty() => {
                self.status = format!("{} has no versions", explorer.key.key);
            }
            Ok(explorer) => self.explorer = Some(explorer),
            Err(err) => self.status = format!("Could not open record: {err}"),
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }
        if self.modal.is_some() {
            self.handle_modal_key(key).await;
        } else if self.explorer.is_some() {
            self.handle_explorer_key(key).await;
        } else if self.input_mode != InputMode::Normal {
            self.handle_input_key(key).await;
        } else {
            self.handle_browser_key(key).await;
        }
    }

    async fn handle_browser_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1).await,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1).await,
            KeyCode::PageDown => self.move_selection(self.settings.page_size as isize).await,
            KeyCode::PageUp => {
                self.move_selection(-(self.settings.page_size as isize))
                    .await
            }
            KeyCode::Char('r') => self.refresh_keys().await,
            KeyCode::Char('n') => self.show_next().await,
            KeyCode::Char('c') => self.begin_input(InputMode::Collection),
            KeyCode::Char('a') => self.begin_input(InputMode::AfterKey),
            KeyCode::Char('p') | KeyCode::Char('/') => self.begin_input(InputMode::Prefix),
            KeyCode::Char('w') => match self.write_latest().await {
                Ok(path) => self.status = format!("Wrote data to {}", path.display()),
                Err(err) => self.status = format!("Could not write key: {err}"),
            },
            KeyCode::Enter | KeyCode::Char('o') => self.open_explorer().await,
            _ => {}
        }
    }

    fn begin_input(&mut self, mode: InputMode) {
        self.input = match mode {
            InputMode::Collection => self.collection.clone(),
            InputMode::AfterKey => self.after_key.clone(),
            InputMode::Prefix => self.prefix.clone(),
            InputMode::Normal => String::new(),
        };
        self.input_mode = mode;
    }

    async fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => {
                let value = std::mem::take(&mut self.input);
                match self.input_mode {
                    InputMode::Collection => {
                        self.collection = value.trim().to_string();
                        self.after_key.clear();
                    }
                    InputMode::AfterKey => self.after_key = value,
                    InputMode::Prefix => self.prefix = value,
                    InputMode::Normal => {}
                }
                self.input_mode = InputMode::Normal;
                self.refresh_keys().await;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c)
            }
            _ => {}
        }
    }

    async fn handle_explorer_key(&mut self, key: KeyEvent) {
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };
        let res = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.explorer = None;
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                explorer.move_cursor(1);
                Ok(())
            }
            KeyCode::Up | KeyCode::Char('k') => {
                explorer.move_cursor(-1);
                Ok(())
            }
            KeyCode::PageDown => {
                explorer.move_cursor(10);
                Ok(())
            }
            KeyCode::PageUp => {
                explorer.move_cursor(-10);
                Ok(())
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                explorer.toggle_at_cursor();
                Ok(())
            }
            KeyCode::Char('x') => {
                explorer.toggle_hex();
                Ok(())
            }
            KeyCode::Left | KeyCode::Char('h') => explorer.step_version(&mut self.store, -1).await,
            KeyCode::Right | KeyCode::Char('l') => explorer.step_version(&mut self.store, 1).await,
            KeyCode::Char('s') => {
                match explorer.save(&self.settings.out_dir) {
                    Ok(path) => {
                        self.modal = Some(Modal::Notice(format!(
                            "The version has been stored in {}",
                            path.display()
                        )))
                    }
                    Err(err) => self.status = format!("Could not save version: {err}"),
                }
                Ok(())
            }
            KeyCode::Char('d') => {
                if let Some(version) = explorer.selected_version() {
                    self.modal = Some(Modal::ConfirmDelete { version });
                }
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(err) = res {
            self.status = format!("Could not load version: {err}");
        }
    }

    async fn handle_modal_key(&mut self, key: KeyEvent) {
        match self.modal.clone() {
            Some(Modal::Notice(_)) => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.modal = None;
                }
            }
            Some(Modal::ConfirmDelete { version }) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.modal = None;
                    self.delete_selected(version).await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.modal = None,
                _ => {}
            },
            None => {}
        }
    }

    async fn delete_selected(&mut self, version: u64) {
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };
        if explorer.selected_version() != Some(version) {
            return;
        }
        match explorer.delete_selected(&mut self.store).await {
            Ok(AfterDelete::Remaining) => {
                self.status = format!("Deleted version {version} of {}", explorer.key.key);
            }
            Ok(AfterDelete::Exhausted) => {
                self.status = format!(
                    "Deleted version {version}; {} has no versions left",
                    explorer.key.key
                );
                self.explorer = None;
                self.refresh_keys().await;
            }
            Err(err) => self.status = format!("Could not delete version: {err}"),
        }
    }

    pub fn metrics_line(&self) -> String {
        self.rpc_stats
            .as_ref()
            .map(|stats| stats.snapshot().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use fossil_client::{MemoryStore, StoreError};
    use fossil_core::types::{BackupInfo, VersionedValue};
    use fossil_core::view::RecordView;

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fossil-tui-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn app_with(store: MemoryStore, page_size: u32, out_dir: PathBuf) -> App<MemoryStore> {
        App::new(
            store,
            Settings {
                collection: "volumeData".to_string(),
                page_size,
                out_dir,
            },
        )
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        for key in ["a", "b", "c", "d", "e"] {
            store.put("volumeData", key, 1, vec![0x08, 0x01]);
        }
        store.put("volumeData", "b", 2, vec![0x08, 0x02]);
        store.put("volumeData", "b", 5, vec![0x0a, 0x02, 0x08, 0x01]);
        store.put("skeletons", "x", 0, vec![0xff, 0xff]);
        store
    }

    async fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::from(code)).await;
    }

    async fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c)).await;
        }
    }

    #[tokio::test]
    async fn next_page_starts_after_last_key() {
        let mut app = app_with(seeded(), 2, std::env::temp_dir());
        app.refresh_keys().await;
        assert_eq!(app.keys, vec!["a", "b"]);

        press(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.after_key, "b");
        assert_eq!(app.keys, vec!["c", "d"]);

        press(&mut app, KeyCode::Char('n')).await;
        press(&mut app, KeyCode::Char('n')).await;
        assert!(app.keys.is_empty());
        press(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.status, "no more keys");
    }

    #[tokio::test]
    async fn inputs_change_collection_and_prefix() {
        let mut app = app_with(seeded(), 20, std::env::temp_dir());
        press(&mut app, KeyCode::Char('p')).await;
        assert_eq!(app.input_mode, InputMode::Prefix);
        type_text(&mut app, "d").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.keys, vec!["d"]);

        press(&mut app, KeyCode::Char('p')).await;
        press(&mut app, KeyCode::Backspace).await;
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Char('c')).await;
        app.input.clear();
        type_text(&mut app, "skeletons").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.collection, "skeletons");
        assert_eq!(app.keys, vec!["x"]);
    }

    #[tokio::test]
    async fn highlighted_key_lists_sorted_versions() {
        let mut app = app_with(seeded(), 20, std::env::temp_dir());
        app.refresh_keys().await;
        press(&mut app, KeyCode::Char('j')).await;
        assert_eq!(
            app.key_info,
            Some(KeyInfo {
                key: "b".to_string(),
                versions: Ok(vec![1, 2, 5]),
            })
        );
    }

    #[tokio::test]
    async fn explorer_opens_latest_and_caches_versions() {
        let mut app = app_with(seeded(), 20, std::env::temp_dir());
        app.refresh_keys().await;
        press(&mut app, KeyCode::Char('j')).await;
        press(&mut app, KeyCode::Enter).await;

        let explorer = app.explorer.as_ref().unwrap();
        assert_eq!(explorer.versions, vec![1, 2, 5]);
        assert_eq!(explorer.selected_version(), Some(5));
        assert!(matches!(explorer.view(), Some(RecordView::Tree(_))));
        assert_eq!(explorer.lines().len(), 2);
        assert_eq!(app.store.get_calls(), 1);

        press(&mut app, KeyCode::Char('h')).await;
        press(&mut app, KeyCode::Char('l')).await;
        let explorer = app.explorer.as_ref().unwrap();
        assert_eq!(explorer.selected_version(), Some(5));
        assert_eq!(app.store.get_calls(), 2);

        press(&mut app, KeyCode::Char(' ')).await;
        assert_eq!(app.explorer.as_ref().unwrap().lines().len(), 1);

        press(&mut app, KeyCode::Esc).await;
        assert!(app.explorer.is_none());
    }

    #[tokio::test]
    async fn undecodable_value_is_shown_as_hex() {
        let mut app = app_with(seeded(), 20, std::env::temp_dir());
        app.collection = "skeletons".to_string();
        app.refresh_keys().await;
        press(&mut app, KeyCode::Enter).await;
        let lines = app.explorer.as_ref().unwrap().lines();
        assert!(lines.iter().any(|l| l.title.contains("FF FF")));

        press(&mut app, KeyCode::Char('x')).await;
        assert!(app.explorer.as_ref().unwrap().hex);
    }

    #[tokio::test]
    async fn delete_requires_confirmation_and_reselects_latest() {
        let mut app = app_with(seeded(), 20, std::env::temp_dir());
        app.refresh_keys().await;
        press(&mut app, KeyCode::Char('j')).await;
        press(&mut app, KeyCode::Enter).await;

        press(&mut app, KeyCode::Char('d')).await;
        assert_eq!(app.modal, Some(Modal::ConfirmDelete { version: 5 }));
        press(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.modal, None);
        assert_eq!(app.explorer.as_ref().unwrap().versions, vec![1, 2, 5]);

        press(&mut app, KeyCode::Char('d')).await;
        press(&mut app, KeyCode::Char('y')).await;
        let explorer = app.explorer.as_ref().unwrap();
        assert_eq!(explorer.versions, vec![1, 2]);
        assert_eq!(explorer.selected_version(), Some(2));
    }

    #[tokio::test]
    async fn deleting_the_only_version_closes_the_explorer() {
        let mut app = app_with(seeded(), 20, std::env::temp_dir());
        app.refresh_keys().await;
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Char('d')).await;
        press(&mut app, KeyCode::Char('y')).await;
        assert!(app.explorer.is_none());
        assert_eq!(app.keys, vec!["b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn save_and_write_use_expected_file_names() {
        let dir = temp_dir("save");
        let mut app = app_with(seeded(), 20, dir.clone());
        app.refresh_keys().await;

        press(&mut app, KeyCode::Char('w')).await;
        assert_eq!(std::fs::read(dir.join(OUT_FILE)).unwrap(), vec![0x08, 0x01]);

        press(&mut app, KeyCode::Char('j')).await;
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Char('s')).await;
        let saved = dir.join("volumeData_b_5.bin");
        assert_eq!(std::fs::read(&saved).unwrap(), vec![0x0a, 0x02, 0x08, 0x01]);
        assert!(matches!(app.modal, Some(Modal::Notice(_))));
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.modal, None);

        std::fs::remove_dir_all(dir).unwrap();
    }

    /// `MemoryStore` whose `get` can be switched to fail.
    #[derive(Debug, Default)]
    struct FailingGets {
        inner: MemoryStore,
        fail: bool,
    }

    impl KeyValueStore for FailingGets {
        async fn health(&mut self) -> Result<(), StoreError> {
            self.inner.health().await
        }

        async fn list_keys(&mut self, query: &KeyQuery) -> Result<Vec<String>, StoreError> {
            self.inner.list_keys(query).await
        }

        async fn list_versions(&mut self, key: &CollectionKey) -> Result<Vec<u64>, StoreError> {
            self.inner.list_versions(key).await
        }

        async fn get(
            &mut self,
            key: &CollectionKey,
            version: Option<u64>,
        ) -> Result<VersionedValue, StoreError> {
            if self.fail {
                return Err(StoreError::Rejected {
                    rpc: "Get",
                    message: "unavailable".to_string(),
                });
            }
            self.inner.get(key, version).await
        }

        async fn delete_version(
            &mut self,
            key: &CollectionKey,
            version: u64,
        ) -> Result<(), StoreError> {
            self.inner.delete_version(key, version).await
        }

        async fn backup(&mut self) -> Result<BackupInfo, StoreError> {
            self.inner.backup().await
        }

        async fn restore_from_backup(&mut self) -> Result<(), StoreError> {
            self.inner.restore_from_backup().await
        }
    }

    #[tokio::test]
    async fn failed_version_fetch_keeps_the_shown_version() {
        let mut app = app_with(seeded(), 20, std::env::temp_dir());
        app.refresh_keys().await;
        press(&mut app, KeyCode::Char('j')).await;
        press(&mut app, KeyCode::Enter).await;

        let b = CollectionKey::new("volumeData", "b");
        app.store.delete_version(&b, 2).await.unwrap();
        press(&mut app, KeyCode::Char('h')).await;

        assert!(app.status.starts_with("Could not load version"));
        let explorer = app.explorer.as_ref().unwrap();
        assert_eq!(explorer.selected_version(), Some(5));
        assert_eq!(explorer.data(), Some(&[0x0a, 0x02, 0x08, 0x01][..]));
        assert_eq!(explorer.lines().len(), 2);
    }

    #[tokio::test]
    async fn failed_reload_after_delete_clears_the_view() {
        let mut store = FailingGets::default();
        store.inner = seeded();
        let mut app = App::new(
            store,
            Settings {
                collection: "volumeData".to_string(),
                page_size: 20,
                out_dir: std::env::temp_dir(),
            },
        );
        app.refresh_keys().await;
        app.move_selection(1).await;
        app.open_explorer().await;
        assert_eq!(app.explorer.as_ref().unwrap().selected_version(), Some(5));

        app.store.fail = true;
        app.handle_key(KeyEvent::from(KeyCode::Char('d'))).await;
        app.handle_key(KeyEvent::from(KeyCode::Char('y'))).await;

        assert!(app.status.starts_with("Could not delete version"));
        let explorer = app.explorer.as_ref().unwrap();
        assert_eq!(explorer.versions, vec![1, 2]);
        assert_eq!(explorer.selected_version(), Some(2));
        assert!(explorer.view().is_none());
        assert!(explorer.lines().is_empty());
        assert_eq!(explorer.data(), None);
    }
}
