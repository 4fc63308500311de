//! Chunk planning and chunk rendering.
//!
//! | Module    | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | `group`   | Cache-group rules, priority resolution           |
//! | `reach`   | Entry / async-root reachability                  |
//! | `planner` | Module → chunk partitioning, runtime extraction  |
//! | `render`  | Chunk script + extracted stylesheet              |
//! | `runtime` | Per-entry bootstrap chunk                        |

mod group;
mod planner;
mod reach;
mod render;
mod runtime;

pub use group::{CacheGroup, ChunkMode, TieBreak};
pub use planner::{
    Chunk, ChunkPlan, ChunkPlanner, ChunkPlanningError, EntryPlan, RUNTIME_PREFIX, SHARED_PREFIX,
    runtime_name,
};
pub use reach::{ModuleReach, Reachability};
pub use render::{RenderError, RenderedChunk, render_chunk};
pub use runtime::{render_runtime, runtime_data};
