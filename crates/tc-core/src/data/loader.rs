//! Data loaders
//!
//! A loader knows how to fetch one data set and how to pull that set out
//! of the response envelope. Loader strategies are registered by name and
//! data ids are assigned to a strategy before they can be loaded.

use super::DataError;
use crate::{ClsError, Registry};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::rc::Rc;
use tc_net::Request;

/// Per-load loader configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderConfig {
    /// Request URL, required by XHR loaders
    pub url: Option<String>,
    /// Query parameters
    pub params: Vec<(String, String)>,
}

impl LoaderConfig {
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.retain(|(k, _)| k != key);
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// One loader instance, bound to a data id
pub trait Loader {
    fn data_id(&self) -> &str;

    /// Request that fetches the data set
    fn request(&self) -> Result<Request, DataError>;

    /// Extract the data set from the response body
    fn retrieve(&self, body: &Value) -> Value {
        body.get(self.data_id()).cloned().unwrap_or_else(|| json!({}))
    }
}

/// Loader strategy, registered by name
pub trait LoaderFactory {
    fn create(&self, id: &str, config: LoaderConfig) -> Box<dyn Loader>;
}

struct BaseLoader {
    id: String,
}

impl Loader for BaseLoader {
    fn data_id(&self) -> &str {
        &self.id
    }

    fn request(&self) -> Result<Request, DataError> {
        Err(DataError::NotImplemented(self.id.clone()))
    }
}

struct BaseFactory;

impl LoaderFactory for BaseFactory {
    fn create(&self, id: &str, _config: LoaderConfig) -> Box<dyn Loader> {
        Box::new(BaseLoader { id: id.to_string() })
    }
}

/// GET `config.url` with `config.params` as query
pub struct XhrGet {
    id: String,
    config: LoaderConfig,
}

impl Loader for XhrGet {
    fn data_id(&self) -> &str {
        &self.id
    }

    fn request(&self) -> Result<Request, DataError> {
        let url = self.config.url.as_deref().ok_or_else(|| DataError::MissingUrl(self.id.clone()))?;
        let mut req = Request::get(url);
        for (k, v) in &self.config.params {
            req = req.with_query(k, v);
        }
        Ok(req)
    }
}

struct XhrGetFactory;

impl LoaderFactory for XhrGetFactory {
    fn create(&self, id: &str, config: LoaderConfig) -> Box<dyn Loader> {
        Box::new(XhrGet {
            id: id.to_string(),
            config,
        })
    }
}

/// `/data/<id>` endpoint on top of XHRGet
struct DataFactory {
    parent: Rc<dyn LoaderFactory>,
}

impl LoaderFactory for DataFactory {
    fn create(&self, id: &str, config: LoaderConfig) -> Box<dyn Loader> {
        self.parent.create(id, config.with_url(&format!("/data/{}", id)))
    }
}

/// `/data/<id>` scoped by an `id` query parameter (defaults to the data id)
struct NetworkDataFactory {
    parent: Rc<dyn LoaderFactory>,
}

impl LoaderFactory for NetworkDataFactory {
    fn create(&self, id: &str, config: LoaderConfig) -> Box<dyn Loader> {
        let scope = config.param("id").unwrap_or(id).to_string();
        let config = config.with_url(&format!("/data/{}", id)).with_param("id", &scope);
        self.parent.create(id, config)
    }
}

fn register_base(classes: &mut Registry<dyn LoaderFactory>) -> Result<(), ClsError> {
    let xhr: Rc<dyn LoaderFactory> = Rc::new(XhrGetFactory);
    classes.register("Base", Rc::new(BaseFactory))?;
    classes.extend("XHRGet", "Base", |_| xhr)?;
    Ok(())
}

/// Loader strategies plus the data id -> strategy assignments
pub struct LoaderRegistry {
    classes: Registry<dyn LoaderFactory>,
    assigned: HashMap<String, String>,
}

impl LoaderRegistry {
    /// Empty registry holding only `Base` and `XHRGet`
    pub fn new() -> Self {
        Self::from_classes(Registry::builtin("loader", register_base))
    }

    /// Registry with the `data` and `network_data` strategies as well
    pub fn with_defaults() -> Self {
        Self::from_classes(Registry::builtin("loader", |classes| {
            register_base(classes)?;
            classes.extend("data", "XHRGet", |parent| Rc::new(DataFactory { parent }) as Rc<dyn LoaderFactory>)?;
            classes.extend("network_data", "XHRGet", |parent| {
                Rc::new(NetworkDataFactory { parent }) as Rc<dyn LoaderFactory>
            })?;
            Ok(())
        }))
    }

    fn from_classes(classes: Registry<dyn LoaderFactory>) -> Self {
        Self {
            classes,
            assigned: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, factory: Rc<dyn LoaderFactory>) -> Result<(), DataError> {
        self.classes.register(name, factory)?;
        Ok(())
    }

    pub fn extend(
        &mut self,
        name: &str,
        parent: &str,
        build: impl FnOnce(Rc<dyn LoaderFactory>) -> Rc<dyn LoaderFactory>,
    ) -> Result<(), DataError> {
        self.classes.extend(name, parent, build)?;
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.classes.has(name)
    }

    /// Assign a data id to a registered loader strategy
    pub fn assign(&mut self, id: &str, loader: &str) -> Result<(), DataError> {
        self.classes.get(loader)?;
        self.assigned.insert(id.to_string(), loader.to_string());
        Ok(())
    }

    pub fn assigned(&self, id: &str) -> Option<&str> {
        self.assigned.get(id).map(String::as_str)
    }

    /// Loader instance for an assigned data id
    pub fn loader(&self, id: &str, config: LoaderConfig) -> Result<Box<dyn Loader>, DataError> {
        let name = self.assigned.get(id).ok_or_else(|| DataError::Unassigned(id.to_string()))?;
        Ok(self.classes.get(name)?.create(id, config))
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
