//! Data Store
//!
//! Process-wide cache of data sets keyed by id. A data set is fetched at
//! most once at a time: concurrent `load` calls for an id that is already
//! in flight only queue their callback. Completions are fed back through
//! `complete` by whoever drives the network.

mod loader;

pub use loader::{Loader, LoaderConfig, LoaderFactory, LoaderRegistry, XhrGet};

use crate::ClsError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::Instant;
use tc_net::{Client, NetError, Response, Ticket};

/// Data store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("could not find suitable loader for data id {0}, is it assigned?")]
    Unassigned(String),

    #[error("XHRGet loader needs url ({0})")]
    MissingUrl(String),

    #[error("loader for {0} does not implement load")]
    NotImplemented(String),

    #[error(transparent)]
    Cls(#[from] ClsError),

    #[error(transparent)]
    Net(#[from] NetError),
}

/// A loaded data set
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub id: String,
    pub data: Value,
}

pub type LoadCallback = Box<dyn FnOnce(&Payload)>;

/// Options for `DataStore::load`
#[derive(Default)]
pub struct LoadOptions {
    pub callback: Option<LoadCallback>,
    /// Fetch again even if cached
    pub reload: bool,
    pub config: LoaderConfig,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(mut self, f: impl FnOnce(&Payload) + 'static) -> Self {
        self.callback = Some(Box::new(f));
        self
    }

    pub fn reload(mut self) -> Self {
        self.reload = true;
        self
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("callback", &self.callback.is_some())
            .field("reload", &self.reload)
            .field("config", &self.config)
            .finish()
    }
}

/// What `load` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Served from cache, callback already invoked
    Cached,
    /// Joined a load already in flight
    Queued,
    /// Request sent
    Dispatched(Ticket),
}

/// Result of feeding a completion to the store
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Loaded { payload: Payload, all_done: bool },
    Failed { id: String, error: NetError, all_done: bool },
}

impl LoadEvent {
    pub fn id(&self) -> &str {
        match self {
            LoadEvent::Loaded { payload, .. } => &payload.id,
            LoadEvent::Failed { id, .. } => id,
        }
    }

    /// No loads remain in flight after this one
    pub fn all_done(&self) -> bool {
        match self {
            LoadEvent::Loaded { all_done, .. } | LoadEvent::Failed { all_done, .. } => *all_done,
        }
    }
}

static EMPTY: LazyLock<Value> = LazyLock::new(|| Value::Object(Map::new()));

/// Cached, single-flight data store
pub struct DataStore {
    data: HashMap<String, Value>,
    loading: HashMap<String, Instant>,
    listeners: HashMap<String, Vec<LoadCallback>>,
    done_listeners: Vec<Box<dyn FnOnce()>>,
    tickets: HashMap<Ticket, Box<dyn Loader>>,
    loaders: LoaderRegistry,
}

impl DataStore {
    pub fn new(loaders: LoaderRegistry) -> Self {
        Self {
            data: HashMap::new(),
            loading: HashMap::new(),
            listeners: HashMap::new(),
            done_listeners: Vec::new(),
            tickets: HashMap::new(),
            loaders,
        }
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    pub fn loaders_mut(&mut self) -> &mut LoaderRegistry {
        &mut self.loaders
    }

    /// Cached data set, or an empty object
    pub fn get(&self, id: &str) -> &Value {
        self.data.get(id).unwrap_or(&EMPTY)
    }

    /// Data set is cached (and not null)
    pub fn has(&self, id: &str) -> bool {
        self.data.get(id).is_some_and(|v| !v.is_null())
    }

    pub fn set(&mut self, id: &str, value: Value) {
        self.data.insert(id.to_string(), value);
    }

    /// Shallow-merge `partial` into the cached object
    pub fn update(&mut self, id: &str, partial: Value) {
        match (self.data.get_mut(id), partial) {
            (Some(Value::Object(existing)), Value::Object(partial)) => {
                for (k, v) in partial {
                    existing.insert(k, v);
                }
            }
            (_, partial) => {
                self.data.insert(id.to_string(), partial);
            }
        }
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loading.contains_key(id)
    }

    /// When the in-flight load of `id` started
    pub fn loading_since(&self, id: &str) -> Option<Instant> {
        self.loading.get(id).copied()
    }

    pub fn in_flight(&self) -> usize {
        self.loading.len()
    }

    /// Whether `ticket` belongs to one of this store's loads
    pub fn owns(&self, ticket: Ticket) -> bool {
        self.tickets.contains_key(&ticket)
    }

    /// Make data set `id` available, fetching it if needed
    pub fn load(&mut self, net: &mut Client, id: &str, opts: LoadOptions) -> Result<LoadStatus, DataError> {
        let LoadOptions { callback, reload, config } = opts;

        if self.has(id) && !reload {
            if let Some(cb) = callback {
                cb(&Payload {
                    id: id.to_string(),
                    data: self.get(id).clone(),
                });
            }
            return Ok(LoadStatus::Cached);
        }

        if self.is_loading(id) {
            if let Some(cb) = callback {
                self.listeners.entry(id.to_string()).or_default().push(cb);
            }
            tracing::debug!("data {} already loading, queued", id);
            return Ok(LoadStatus::Queued);
        }

        let loader = self.loaders.loader(id, config)?;
        let ticket = net.send(loader.request()?)?;
        tracing::debug!("loading data {} ({})", id, ticket);

        self.loading.insert(id.to_string(), Instant::now());
        self.tickets.insert(ticket, loader);
        if let Some(cb) = callback {
            self.listeners.entry(id.to_string()).or_default().push(cb);
        }
        Ok(LoadStatus::Dispatched(ticket))
    }

    /// Feed a network completion; `None` if the ticket is not ours
    pub fn complete(&mut self, ticket: Ticket, result: Result<Response, NetError>) -> Option<LoadEvent> {
        let loader = self.tickets.remove(&ticket)?;
        let id = loader.data_id().to_string();
        self.loading.remove(&id);

        let body = result.and_then(|resp| {
            if resp.is_success() {
                resp.json()
            } else {
                Err(NetError::HttpError { status: resp.status })
            }
        });

        match body {
            Ok(body) => {
                let data = loader.retrieve(&body);
                self.data.insert(id.clone(), data.clone());
                let payload = Payload { id, data };
                tracing::info!("data {} loaded", payload.id);
                for cb in self.listeners.remove(&payload.id).unwrap_or_default() {
                    cb(&payload);
                }
                let all_done = self.check_done();
                Some(LoadEvent::Loaded { payload, all_done })
            }
            Err(error) => {
                let dropped = self.listeners.remove(&id).map_or(0, |l| l.len());
                tracing::warn!("data {} failed to load: {} ({} callbacks dropped)", id, error, dropped);
                let all_done = self.check_done();
                Some(LoadEvent::Failed { id, error, all_done })
            }
        }
    }

    /// Run `callback` once no loads are in flight (immediately if idle)
    pub fn done(&mut self, callback: impl FnOnce() + 'static) -> bool {
        self.done_listeners.push(Box::new(callback));
        self.check_done()
    }

    fn check_done(&mut self) -> bool {
        if !self.loading.is_empty() {
            return false;
        }
        for cb in self.done_listeners.drain(..) {
            cb();
        }
        true
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(LoaderRegistry::with_defaults())
    }
}
