//! Per-entry runtime chunk.
//!
//! The runtime embeds only topology: the entry module, its initial chunk
//! names, the deferred-import chunk map and the public path. Hashed file
//! names are looked up at run time from the manifest global, so editing an
//! ordinary module never changes the runtime's bytes.

use serde_json::{Map, Value};

use super::{ChunkPlan, EntryPlan};
use crate::embed::chunk::{RUNTIME_JS, RuntimeVars};

fn strings<'a>(items: impl IntoIterator<Item = &'a String>) -> Value {
    Value::Array(items.into_iter().cloned().map(Value::String).collect())
}

/// JSON object literal the runtime template is parameterized with.
pub fn runtime_data(entry: &EntryPlan, plan: &ChunkPlan, public_path: &str) -> String {
    let lazy: Map<String, Value> = plan
        .async_chunks
        .iter()
        .map(|(root, names)| (root.to_string(), strings(names)))
        .collect();

    let mut data = Map::new();
    data.insert("entry".into(), Value::String(entry.module.to_string()));
    data.insert("initial".into(), strings(&entry.initial_chunks));
    data.insert("lazy".into(), Value::Object(lazy));
    data.insert("publicPath".into(), Value::String(public_path.to_string()));
    Value::Object(data).to_string()
}

pub fn render_runtime(entry: &EntryPlan, plan: &ChunkPlan, public_path: &str) -> Vec<u8> {
    let data = runtime_data(entry, plan, public_path);
    RUNTIME_JS.render(&RuntimeVars { data: &data }).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkPlanner;
    use crate::graph::{Dependency, Module, ModuleGraph, ModuleId};
    use std::collections::BTreeMap;

    fn plan(main_source: &str) -> ChunkPlan {
        let graph = ModuleGraph::new(vec![
            Module::new("main.js", main_source).with_deps([Dependency::deferred("page.js")]),
            Module::new("page.js", "export default 1"),
        ])
        .unwrap();
        let entries = BTreeMap::from([("main".to_string(), ModuleId::new("main.js"))]);
        ChunkPlanner::new(&[]).plan(&graph, &entries).unwrap()
    }

    #[test]
    fn test_runtime_data_shape() {
        let plan = plan("");
        let data = runtime_data(&plan.entrypoints["main"], &plan, "/static/");
        assert_eq!(
            data,
            r#"{"entry":"main.js","initial":["main"],"lazy":{"page.js":["page_js"]},"publicPath":"/static/"}"#
        );
    }

    #[test]
    fn test_runtime_independent_of_module_content() {
        let a = plan("console.log(1)");
        let b = plan("console.log(2)");
        assert_eq!(
            render_runtime(&a.entrypoints["main"], &a, "/"),
            render_runtime(&b.entrypoints["main"], &b, "/")
        );
    }
}
