//! tc Core
//!
//! Building blocks shared by the editing runtime: named class registries
//! with single-parent extension, the cached data store with its loaders,
//! a virtual-clock timer queue and a fan-in barrier.

pub mod cls;
pub mod data;
pub mod join;
pub mod timer;

pub use cls::{make_name, ClsError, Registry};
pub use data::{DataError, DataStore, LoadEvent, LoadOptions, LoadStatus, Loader, LoaderConfig, LoaderFactory, LoaderRegistry, Payload, XhrGet};
pub use join::{Arrival, Join};
pub use timer::{SmartTimeout, TimerHandle, TimerQueue};
