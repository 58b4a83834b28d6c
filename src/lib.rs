//! controducer: store registry, reducer dispatch and path-addressed store
//! composition for component UIs.
//!
//! ```text
//! StoreConfig ─┐
//!              ├─→ combine_stores ─→ CombinedConfig ─→ configure_root ─→ Root
//! plain tree ──┘                                           │
//!                                                          ▼
//!             Controller / hooks ─→ dispatch ─→ Registry (store, tables)
//!                                      ▲                   │
//!                   DutyExecutor ──────┘                   ▼
//!                                               listeners notified per commit
//! ```

pub mod action;
pub mod config;
pub mod controller;
pub mod duty;
pub mod engine;
pub mod error;
pub mod logging;
pub mod reducer;
pub mod registry;
pub mod settings;
pub mod store;

pub use action::{Action, ActionCreator, ActionTable, Chain, ChainStep, Dispatchable};
pub use config::{
    combine_stores, parse_configs, CombinedConfig, ConfigError, ConfigNode, ConfigSet, Segment,
    StoreConfig, StorePath,
};
pub use controller::{
    should_update, use_call_of, use_controller, use_dispatch, use_store, Controller, ControllerId,
    UsedStores,
};
pub use duty::{CallOf, Duty, DutyCall, DutyExecutor, DutyHandle, DutyOptions, Lifecycle, StoreKit};
pub use engine::{configure_root, DispatchError, ListenerId, Root};
pub use error::CoreError;
pub use reducer::{Reducer, TypedReducer};
pub use registry::{ControllerValue, Registry, Selection, Selector};
pub use settings::{Settings, SettingsError};
pub use store::{Slice, Store};
