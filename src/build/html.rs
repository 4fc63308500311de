//! Entry HTML pages.
//!
//! Tags go right before `</head>`: the manifest global, the entry's initial
//! stylesheets, then the runtime and the initial chunks as deferred scripts
//! (deferred scripts execute in document order).

use super::manifest::Manifest;
use crate::chunk::EntryPlan;
use crate::config::section::HtmlPlan;
use crate::embed::page::{INDEX_HTML, PageVars};
use crate::utils::html::escape;

pub fn render_page(html: &HtmlPlan, entry: &EntryPlan, manifest: &Manifest) -> String {
    let document = match &html.template {
        Some(template) => template.clone(),
        None => INDEX_HTML.render(&PageVars {
            title: &escape(&html.title),
        }),
    };
    inject(&document, &head_tags(entry, manifest))
}

fn head_tags(entry: &EntryPlan, manifest: &Manifest) -> String {
    let url = |path: &str| escape(&format!("{}{path}", manifest.public_path)).into_owned();
    let initial: Vec<_> = entry
        .initial_chunks
        .iter()
        .filter_map(|name| manifest.chunks.get(name))
        .collect();

    let mut tags = format!("<script>{}</script>\n", manifest.global_script());
    for css in initial.iter().filter_map(|files| files.css.as_deref()) {
        tags.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", url(css)));
    }
    let runtime = manifest.chunks.get(&entry.runtime);
    for files in runtime.into_iter().chain(initial.iter().copied()) {
        tags.push_str(&format!("<script defer src=\"{}\"></script>\n", url(&files.js)));
    }
    tags
}

/// Insert `tags` before `</head>`, falling back to `</body>` and then the end.
fn inject(document: &str, tags: &str) -> String {
    let lower = document.to_ascii_lowercase();
    let at = lower
        .find("</head>")
        .or_else(|| lower.find("</body>"))
        .unwrap_or(document.len());
    let mut out = String::with_capacity(document.len() + tags.len());
    out.push_str(&document[..at]);
    out.push_str(tags);
    out.push_str(&document[at..]);
    out
}
