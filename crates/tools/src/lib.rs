//! Developer tooling: scene inspector and model hierarchy dumps.
//!
//! # Invariants
//! - Tools only read. Nothing here mutates a scene or a context.

mod inspector;
mod model_dump;

pub use inspector::{ContextStatus, NodeInfo, SceneInspector, SceneSummary};
pub use model_dump::{ModelReport, dump_hierarchy};

pub fn crate_info() -> &'static str {
    "seascape-tools v0.1.0"
}
