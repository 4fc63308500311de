//! Configuration section definitions.
//!
//! Each module corresponds to a section in `bale.toml`:
//!
//! | Module         | TOML Section     | Purpose                            |
//! |----------------|------------------|------------------------------------|
//! | `output`       | `[output]`       | Directory, public path, templates  |
//! | `module`       | `[module]`       | Ordered classification rules       |
//! | `optimization` | `[optimization]` | Minimizers, cache groups           |
//! | `failure`      | `[failure]`      | Transform failure policy           |
//! | `html`         | `[html]`         | Generated HTML pages               |
//! | `copy`         | `[copy]`         | Static file copy                   |
//! | `graph`        | `[graph]`        | Module graph manifest (CLI)        |

mod copy;
mod failure;
mod graph;
mod html;
mod module;
mod optimization;
mod output;

pub use copy::{CopyConfig, CopyPlan};
pub use failure::{FailurePolicy, Severity};
pub use graph::GraphConfig;
pub use html::{HtmlConfig, HtmlPlan};
pub use module::{ModuleConfig, RuleConfig};
pub use optimization::{CacheGroupConfig, OptimizationConfig};
pub use output::{
    AssetTemplatesConfig, DEFAULT_INLINE_LIMIT, OutputConfig, OutputTemplates, parse_template,
};
