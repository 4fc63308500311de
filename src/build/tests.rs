//! End-to-end builds over in-memory graphs.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::*;
use crate::config::{BaleConfig, Pipeline};
use crate::config::section::Severity;
use crate::graph::{Dependency, Module, ModuleGraph, ModuleId};
use crate::transform::{PluginError, TransformRegistry};

const BASE: &str = r#"
    mode = "development"
    workers = 2

    [copy]
    enable = false
"#;

fn pipeline(extra: &str) -> Pipeline {
    pipeline_with(extra, &TransformRegistry::with_builtins())
}

fn pipeline_with(extra: &str, registry: &TransformRegistry) -> Pipeline {
    BaleConfig::from_str(&format!("{BASE}\n{extra}"))
        .unwrap()
        .compile(registry)
        .unwrap()
}

fn two_entries(utils_source: &str) -> ModuleGraph {
    ModuleGraph::new(vec![
        Module::new("src/main.js", "require(\"./utils\")").with_deps([
            Dependency::sync("src/utils.js"),
            Dependency::sync("node_modules/libX/index.js"),
        ]),
        Module::new("src/admin.js", "require(\"./utils\")").with_deps([
            Dependency::sync("src/utils.js"),
            Dependency::sync("node_modules/libX/index.js"),
        ]),
        Module::new("src/utils.js", utils_source),
        Module::new("node_modules/libX/index.js", "module.exports = 42;"),
    ])
    .unwrap()
}

const TWO_ENTRIES: &str = r#"
    [entry]
    main = "src/main.js"
    admin = "src/admin.js"

    [[optimization.cache_groups]]
    name = "vendor"
    test = "libX"
    priority = 10

    [[optimization.cache_groups]]
    name = "common"
    priority = 0
    min_chunks = 2
"#;

fn chunk_paths(output: &BuildOutput, chunk: &str) -> Vec<String> {
    output
        .artifacts
        .iter()
        .filter(|a| a.source == ArtifactSource::Chunk(chunk.to_string()))
        .map(|a| a.path.clone())
        .collect()
}

#[test]
fn test_shared_modules_split_into_groups() {
    let pipeline = pipeline(TWO_ENTRIES);
    let output = Orchestrator::new(&pipeline).run(&two_entries("exports.x = 1;")).unwrap();
    let plan = &output.plan;

    let vendor = plan.chunk("vendor").unwrap();
    assert_eq!(vendor.modules, [ModuleId::new("node_modules/libX/index.js")]);
    let common = plan.chunk("common").unwrap();
    assert_eq!(common.modules, [ModuleId::new("src/utils.js")]);
    assert_eq!(plan.chunk("main").unwrap().modules, [ModuleId::new("src/main.js")]);

    for entry in ["main", "admin"] {
        let initial = &plan.entrypoints[entry].initial_chunks;
        assert!(initial.contains(&"vendor".to_string()));
        assert!(initial.contains(&"common".to_string()));
        assert_eq!(initial.last().map(String::as_str), Some(entry));
        assert_eq!(plan.entrypoints[entry].runtime, format!("runtime~{entry}"));
        assert_eq!(chunk_paths(&output, &format!("runtime~{entry}")).len(), 1);
    }

    assert!(output.artifacts.contains("js/runtime~main.js"));
    assert!(output.artifacts.contains("js/vendor.chunk.js"));
    assert!(output.artifacts.contains("manifest.json"));
    assert!(output.artifacts.contains("main.html"));
    assert!(output.artifacts.contains("admin.html"));
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_small_image_inlined() {
    let pipeline = pipeline(
        r#"
        [entry]
        main = "src/main.js"
        "#,
    );
    let graph = ModuleGraph::new(vec![
        Module::new("src/main.js", "").with_deps([Dependency::sync("src/logo.png")]),
        Module::new("src/logo.png", vec![7u8; 5 * 1024]),
    ])
    .unwrap();

    let output = Orchestrator::new(&pipeline).run(&graph).unwrap();
    assert!(
        !output
            .artifacts
            .iter()
            .any(|a| matches!(a.source, ArtifactSource::Asset(_)))
    );
    assert!(output.manifest.assets.is_empty());
    let main = output.artifacts.get("js/main.js").unwrap();
    let script = String::from_utf8_lossy(&main.bytes);
    assert!(script.contains("data:image/png;base64,"));
}

#[test]
fn test_large_image_emitted() {
    let pipeline = pipeline(
        r#"
        [entry]
        main = "src/main.js"
        "#,
    );
    let graph = ModuleGraph::new(vec![
        Module::new("src/main.js", "").with_deps([Dependency::sync("src/logo.png")]),
        Module::new("src/logo.png", vec![7u8; 20 * 1024]),
    ])
    .unwrap();

    let output = Orchestrator::new(&pipeline).run(&graph).unwrap();
    let path = &output.manifest.assets["src/logo.png"];
    assert!(path.starts_with("asset/imgs/"));
    assert!(path.ends_with(".png"));
    assert!(output.artifacts.contains(path));
    let main = output.artifacts.get("js/main.js").unwrap();
    assert!(String::from_utf8_lossy(&main.bytes).contains("require.url(\"src/logo.png\")"));
}

fn failing_registry() -> TransformRegistry {
    let mut registry = TransformRegistry::with_builtins();
    registry.register("explode", |_: &[u8]| -> Result<Vec<u8>, PluginError> {
        Err("unexpected token".into())
    });
    registry
}

fn styled_graph() -> ModuleGraph {
    ModuleGraph::new(vec![
        Module::new("src/main.js", "").with_deps([
            Dependency::sync("src/app.css"),
            Dependency::sync("src/logo.svg"),
        ]),
        Module::new("src/app.css", "body { color: red; }"),
        Module::new("src/logo.svg", "<svg></svg>"),
    ])
    .unwrap()
}

#[test]
fn test_fatal_style_failure_aborts() {
    let pipeline = pipeline_with(
        r#"
        [entry]
        main = "src/main.js"

        [[module.rules]]
        test = '\.css$'
        use = ["explode"]
        type = "style"
        "#,
        &failing_registry(),
    );

    let failure = Orchestrator::new(&pipeline).run(&styled_graph()).unwrap_err();
    assert!(matches!(failure.error, BuildError::Transform(_)));
    assert!(!failure.diagnostics.is_empty());
    assert!(failure.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::TransformFailed { severity: Severity::Fatal, module, .. }
            if module.as_str() == "src/app.css"
    )));
}

#[test]
fn test_non_utf8_script_fails_render() {
    let pipeline = pipeline("[entry]\nmain = \"src/main.js\"\n");
    let graph = ModuleGraph::new(vec![
        Module::new("src/main.js", "").with_deps([Dependency::sync("src/blob.js")]),
        Module::new("src/blob.js", vec![0xc3, 0x28]),
    ])
    .unwrap();

    let failure = Orchestrator::new(&pipeline).run(&graph).unwrap_err();
    match failure.error {
        BuildError::Render(err) => assert_eq!(err.module.as_str(), "src/blob.js"),
        other => panic!("expected a render error, got {other}"),
    }
}

#[test]
fn test_orchestrator_reusable_after_fatal_failure() {
    let pipeline = pipeline_with(
        r#"
        [entry]
        main = "src/main.js"

        [[module.rules]]
        test = '\.css$'
        use = ["explode"]
        type = "style"
        "#,
        &failing_registry(),
    );
    let cancel = Arc::new(AtomicBool::new(false));
    let orchestrator = Orchestrator::new(&pipeline).with_cancel(Arc::clone(&cancel));

    assert!(orchestrator.run(&styled_graph()).is_err());
    assert!(!cancel.load(std::sync::atomic::Ordering::Relaxed));

    let healthy = ModuleGraph::new(vec![Module::new("src/main.js", "console.log(1)")]).unwrap();
    let output = orchestrator.run(&healthy).unwrap();
    assert!(output.artifacts.contains("js/main.js"));
}

#[test]
fn test_warn_policy_keeps_raw_content() {
    let pipeline = pipeline_with(
        r#"
        [entry]
        main = "src/main.js"

        [[module.rules]]
        test = '\.svg$'
        use = ["explode"]
        type = "asset"
        "#,
        &failing_registry(),
    );

    let output = Orchestrator::new(&pipeline).run(&styled_graph()).unwrap();
    assert!(output.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::TransformFailed { severity: Severity::Warn, .. }
    )));
    let main = output.artifacts.get("js/main.js").unwrap();
    // Raw svg inlined as a data URI.
    assert!(String::from_utf8_lossy(&main.bytes).contains("data:image/svg+xml"));
}

#[test]
fn test_styles_extracted_per_chunk() {
    let pipeline = pipeline(
        r#"
        [entry]
        main = "src/main.js"
        "#,
    );
    let output = Orchestrator::new(&pipeline).run(&styled_graph()).unwrap();
    let css = output.artifacts.get("asset/css/main.css").unwrap();
    assert_eq!(css.bytes, b"body { color: red; }");
    assert_eq!(output.manifest.chunks["main"].css.as_deref(), Some("asset/css/main.css"));

    let page = output.artifacts.get("index.html").unwrap();
    let page = String::from_utf8_lossy(&page.bytes);
    assert!(page.contains("href=\"/asset/css/main.css\""));
    let runtime = page.find("src=\"/js/runtime~main.js\"").unwrap();
    assert!(runtime < page.find("src=\"/js/main.js\"").unwrap());
}

#[test]
fn test_runtime_unchanged_by_module_edit() {
    let config = format!(
        "{TWO_ENTRIES}\n[output]\nfilename = \"js/[name].[contenthash:8].js\"\nchunk_filename = \"js/[name].[contenthash:8].chunk.js\"\n"
    );
    let pipeline = pipeline(&config);
    let before = Orchestrator::new(&pipeline).run(&two_entries("exports.x = 1;")).unwrap();
    let after = Orchestrator::new(&pipeline).run(&two_entries("exports.x = 2;")).unwrap();

    assert_eq!(chunk_paths(&before, "runtime~main"), chunk_paths(&after, "runtime~main"));
    assert_eq!(chunk_paths(&before, "main"), chunk_paths(&after, "main"));
    assert_ne!(chunk_paths(&before, "common"), chunk_paths(&after, "common"));
    assert_ne!(
        before.artifacts.get("manifest.json").unwrap().bytes,
        after.artifacts.get("manifest.json").unwrap().bytes
    );
}

#[test]
fn test_builds_are_deterministic() {
    let pipeline = pipeline(TWO_ENTRIES);
    let graph = two_entries("exports.x = 1;");
    let first = Orchestrator::new(&pipeline).run(&graph).unwrap();
    let second = Orchestrator::new(&pipeline).run(&graph).unwrap();

    let collect = |output: &BuildOutput| -> Vec<(String, Vec<u8>)> {
        output
            .artifacts
            .iter()
            .map(|a| (a.path.clone(), a.bytes.clone()))
            .collect()
    };
    assert_eq!(collect(&first), collect(&second));
}

#[test]
fn test_orphans_reported() {
    let pipeline = pipeline(
        r#"
        [entry]
        main = "src/main.js"
        "#,
    );
    let graph = ModuleGraph::new(vec![
        Module::new("src/main.js", ""),
        Module::new("src/unused.js", "exports.dead = true;"),
    ])
    .unwrap();

    let output = Orchestrator::new(&pipeline).run(&graph).unwrap();
    let orphans: Vec<_> = output.diagnostics.orphans().collect();
    assert_eq!(orphans, [&ModuleId::new("src/unused.js")]);
    assert!(output.plan.chunks_of(&ModuleId::new("src/unused.js")).next().is_none());
}

#[test]
fn test_unknown_entry_fails() {
    let pipeline = pipeline(
        r#"
        [entry]
        main = "src/missing.js"
        "#,
    );
    let graph = ModuleGraph::new(vec![Module::new("src/main.js", "")]).unwrap();
    let failure = Orchestrator::new(&pipeline).run(&graph).unwrap_err();
    assert!(matches!(failure.error, BuildError::Graph(_)));
}

#[test]
fn test_cancelled_build_has_no_output() {
    let pipeline = pipeline(TWO_ENTRIES);
    let cancel = Arc::new(AtomicBool::new(true));
    let failure = Orchestrator::new(&pipeline)
        .with_cancel(cancel)
        .run(&two_entries("exports.x = 1;"))
        .unwrap_err();
    assert!(matches!(failure.error, BuildError::Cancelled));
}

#[test]
fn test_minimize_shrinks_scripts() {
    let graph = ModuleGraph::new(vec![Module::new(
        "src/main.js",
        "function add(first, second) {\n    return first + second;\n}\nconsole.log(add(1, 2));\n",
    )])
    .unwrap();
    let entry = "[entry]\nmain = \"src/main.js\"\n";

    let plain = pipeline(entry);
    let minimized = pipeline(&format!("{entry}\n[optimization]\nminimize = true\n"));
    let plain = Orchestrator::new(&plain).run(&graph).unwrap();
    let minimized = Orchestrator::new(&minimized).run(&graph).unwrap();

    let size = |output: &BuildOutput| output.artifacts.get("js/main.js").unwrap().bytes.len();
    assert!(size(&minimized) < size(&plain));
}

#[test]
fn test_page_and_static_file_collide() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("public")).unwrap();
    std::fs::write(dir.path().join("public/index.html"), "<p>static</p>").unwrap();
    std::fs::write(dir.path().join("public/robots.txt"), "User-agent: *").unwrap();
    std::fs::write(
        dir.path().join("bale.toml"),
        "mode = \"development\"\n[entry]\nmain = \"src/main.js\"\n[copy]\nignore = []\n",
    )
    .unwrap();

    let config = BaleConfig::load(&dir.path().join("bale.toml")).unwrap();
    let pipeline = config.compile(&TransformRegistry::with_builtins()).unwrap();
    let graph = ModuleGraph::new(vec![Module::new("src/main.js", "")]).unwrap();
    let failure = Orchestrator::new(&pipeline).run(&graph).unwrap_err();
    assert!(matches!(failure.error, BuildError::NamingCollision(_)));
}

#[test]
fn test_write_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("public")).unwrap();
    std::fs::write(dir.path().join("public/robots.txt"), "User-agent: *").unwrap();
    std::fs::write(
        dir.path().join("bale.toml"),
        "mode = \"development\"\n[entry]\nmain = \"src/main.js\"\n",
    )
    .unwrap();

    let config = BaleConfig::load(&dir.path().join("bale.toml")).unwrap();
    let pipeline = config.compile(&TransformRegistry::with_builtins()).unwrap();
    let graph = ModuleGraph::new(vec![Module::new("src/main.js", "console.log(1)")]).unwrap();
    let output = Orchestrator::new(&pipeline).run(&graph).unwrap();

    let out = config.output_dir();
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("stale.js"), "old").unwrap();
    output.artifacts.write_to(&out, true).unwrap();

    assert!(out.join("js/main.js").is_file());
    assert!(out.join("js/runtime~main.js").is_file());
    assert!(out.join("index.html").is_file());
    assert!(out.join("manifest.json").is_file());
    assert_eq!(std::fs::read_to_string(out.join("robots.txt")).unwrap(), "User-agent: *");
    assert!(!out.join("stale.js").exists());
}
