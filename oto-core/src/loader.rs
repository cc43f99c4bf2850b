use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::{OtoError, OtoResult};
use crate::events::{LoadPhase, PhaseEvent, PhaseHandler};
use crate::fetch::Fetcher;
use crate::models::{ErrorRecord, InitSummary, LoadResult, LoadedModule, ModuleManifest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoaderState {
    Constructed = 0,
    Initializing = 1,
    Initialized = 2,
}

impl LoaderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoaderState::Constructed,
            1 => LoaderState::Initializing,
            _ => LoaderState::Initialized,
        }
    }
}

impl std::fmt::Display for LoaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderState::Constructed => write!(f, "constructed"),
            LoaderState::Initializing => write!(f, "initializing"),
            LoaderState::Initialized => write!(f, "initialized"),
        }
    }
}

/// Fetches the fragments named in a [`ModuleManifest`] and mounts them into
/// a [`Document`].
///
/// Critical modules load one after another in ascending `order`, lazy modules
/// load concurrently afterwards. A failing module is recorded in the error
/// report and never stops its siblings.
///
/// `initialize()` runs once per loader; later calls return a failed summary
/// without touching the network or the document.
pub struct ModuleLoader<D: Document> {
    manifest: ModuleManifest,
    fetcher: Arc<dyn Fetcher>,
    document: Mutex<D>,
    modules: RwLock<HashMap<String, LoadedModule>>,
    errors: RwLock<Vec<ErrorRecord>>,
    state: AtomicU8,
    phase_handlers: RwLock<Vec<PhaseHandler>>,
}

impl<D: Document> ModuleLoader<D> {
    pub fn new(manifest: ModuleManifest, fetcher: Arc<dyn Fetcher>, document: D) -> Self {
        Self {
            manifest,
            fetcher,
            document: Mutex::new(document),
            modules: RwLock::new(HashMap::new()),
            errors: RwLock::new(Vec::new()),
            state: AtomicU8::new(LoaderState::Constructed as u8),
            phase_handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    pub fn state(&self) -> LoaderState {
        LoaderState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn on_phase<F>(&self, handler: F)
    where
        F: Fn(PhaseEvent) + Send + Sync + 'static,
    {
        write_lock(&self.phase_handlers).push(Arc::new(handler));
    }

    /// Fetches one module and stores it, replacing any earlier copy.
    ///
    /// Failures are appended to the error report and returned.
    pub async fn load_module(&self, name: &str) -> OtoResult<String> {
        match self.fetch_module(name).await {
            Ok(html) => Ok(html),
            Err(e) => {
                self.record_error(name, &e);
                Err(e)
            }
        }
    }

    async fn fetch_module(&self, name: &str) -> OtoResult<String> {
        let config = self
            .manifest
            .find(name)
            .cloned()
            .ok_or_else(|| OtoError::NotFound(name.to_string()))?;

        debug!(module = %name, path = %config.path, fetcher = %self.fetcher.name(), "Loading module");

        let response = self
            .fetcher
            .get(&config.path)
            .await
            .map_err(|e| OtoError::NetworkError {
                module: name.to_string(),
                message: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(OtoError::FetchFailed {
                module: name.to_string(),
                status: response.status,
            });
        }

        let html = response.body;
        write_lock(&self.modules).insert(
            name.to_string(),
            LoadedModule::new(html.clone(), config),
        );

        debug!(module = %name, bytes = html.len(), "Module loaded");
        Ok(html)
    }

    /// Loads each name only after the previous one has settled.
    pub async fn load_modules_in_order<I, S>(&self, names: I) -> Vec<LoadResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();

        for name in names {
            let name = name.as_ref();
            let result = match self.load_module(name).await {
                Ok(html) => LoadResult::loaded(name, html),
                Err(e) => LoadResult::failed(name, &e),
            };
            results.push(result);
        }

        results
    }

    /// Starts every load at once and waits for all of them to settle.
    /// Results come back in input order.
    pub async fn load_modules_concurrent<I, S>(&self, names: I) -> Vec<LoadResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let loads = names.into_iter().map(|name| async move {
            let name = name.as_ref();
            match self.load_module(name).await {
                Ok(html) => LoadResult::loaded(name, html),
                Err(e) => LoadResult::failed(name, &e),
            }
        });

        join_all(loads).await
    }

    /// Replaces the content of the single element matching `selector` with
    /// the module's markup.
    pub fn mount_module(&self, name: &str, selector: &str) -> OtoResult<()> {
        let result = self.try_mount(name, selector);
        if let Err(e) = &result {
            self.record_error(name, e);
        }
        result
    }

    fn try_mount(&self, name: &str, selector: &str) -> OtoResult<()> {
        let html = read_lock(&self.modules)
            .get(name)
            .map(|module| module.html.clone())
            .ok_or_else(|| OtoError::ModuleNotLoaded(name.to_string()))?;

        let mut document = lock(&self.document);
        let matches = document.select(selector);

        match matches.as_slice() {
            [] => Err(OtoError::MountTargetMissing(selector.to_string())),
            [element] => {
                document.set_inner_html(element, &html)?;
                debug!(module = %name, target = %selector, "Module mounted");
                Ok(())
            }
            _ => Err(OtoError::MountTargetAmbiguous {
                selector: selector.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Loads and mounts the whole manifest. Never returns an error: problems
    /// outside individual modules produce a summary with `success: false`.
    pub async fn initialize(&self) -> InitSummary {
        if self
            .state
            .compare_exchange(
                LoaderState::Constructed as u8,
                LoaderState::Initializing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            let e = OtoError::AlreadyInitialized;
            warn!(state = %self.state(), "{}", e);
            return InitSummary::aborted(&e, self.errors());
        }

        let summary = match self.run_phases().await {
            Ok((critical_count, lazy_count)) => {
                InitSummary::completed(critical_count, lazy_count, self.errors())
            }
            Err(e) => {
                e.log();
                InitSummary::aborted(&e, self.errors())
            }
        };

        self.state
            .store(LoaderState::Initialized as u8, Ordering::SeqCst);

        info!(
            success = summary.success,
            critical = summary.critical_count,
            lazy = summary.lazy_count,
            errors = summary.errors.len(),
            "Module initialization finished"
        );

        summary
    }

    async fn run_phases(&self) -> OtoResult<(usize, usize)> {
        self.manifest.validate()?;

        let critical: Vec<&str> = self
            .manifest
            .critical_modules()
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        let lazy: Vec<&str> = self
            .manifest
            .lazy_modules()
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();

        info!(count = critical.len(), "Loading critical modules");
        let critical_results = self.load_modules_in_order(&critical).await;
        self.mount_results(&critical_results)?;

        let critical_count = count_loaded(&critical_results);
        self.emit(PhaseEvent::new(
            LoadPhase::Critical,
            critical_count,
            critical_results.len() - critical_count,
        ));

        let mut lazy_count = 0;
        if !lazy.is_empty() {
            info!(count = lazy.len(), "Loading lazy modules");
            let lazy_results = self.load_modules_concurrent(&lazy).await;
            self.mount_results(&lazy_results)?;

            lazy_count = count_loaded(&lazy_results);
            self.emit(PhaseEvent::new(
                LoadPhase::Complete,
                lazy_count,
                lazy_results.len() - lazy_count,
            ));
        }

        Ok((critical_count, lazy_count))
    }

    /// Mounts each successful result to its configured target, in order.
    fn mount_results(&self, results: &[LoadResult]) -> OtoResult<()> {
        for result in results.iter().filter(|r| r.is_success()) {
            let config = self.manifest.find(&result.name).ok_or_else(|| {
                OtoError::Internal(format!("loaded module \"{}\" has no config", result.name))
            })?;

            // Mount failures are already in the error report.
            let _ = self.mount_module(&result.name, &config.target);
        }
        Ok(())
    }

    fn emit(&self, event: PhaseEvent) {
        info!(
            phase = %event.phase,
            succeeded = event.succeeded,
            failed = event.failed,
            "Modules loaded"
        );
        // Handlers may register further handlers, so call them unlocked.
        let handlers: Vec<PhaseHandler> = read_lock(&self.phase_handlers).clone();
        for handler in handlers {
            handler(event.clone());
        }
    }

    fn record_error(&self, name: &str, error: &OtoError) {
        warn!(
            module = %name,
            error_code = %error.error_code(),
            "Error loading module \"{}\": {}",
            name,
            error
        );
        write_lock(&self.errors).push(ErrorRecord::new(name, error));
    }

    /// Every module error recorded so far, oldest first.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        read_lock(&self.errors).clone()
    }

    pub fn loaded_module(&self, name: &str) -> Option<LoadedModule> {
        read_lock(&self.modules).get(name).cloned()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        read_lock(&self.modules).contains_key(name)
    }

    pub fn loaded_count(&self) -> usize {
        read_lock(&self.modules).len()
    }

    pub fn with_document<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        let document = lock(&self.document);
        f(&*document)
    }

    pub fn into_document(self) -> D {
        self.document
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn count_loaded(results: &[LoadResult]) -> usize {
    results.iter().filter(|r| r.is_success()).count()
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
