//! Embedded static resources.
//!
//! - `chunk/runtime.js`: per-entry bootstrap (module registry, chunk
//!   loader, entry start)
//! - `page/index.html`: fallback page when no HTML template is configured

mod template;

pub use template::{Template, TemplateVars};

pub mod chunk {
    use super::{Template, TemplateVars};

    /// Variables for runtime.js.
    ///
    /// `data` is a JSON object literal; it must depend only on chunk topology
    /// so the runtime's bytes stay stable across content edits.
    pub struct RuntimeVars<'a> {
        pub data: &'a str,
    }

    impl TemplateVars for RuntimeVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__BALE_RUNTIME_DATA__", self.data)
        }
    }

    pub const RUNTIME_JS: Template<RuntimeVars<'static>> =
        Template::new(include_str!("chunk/runtime.js"));
}

pub mod page {
    use super::{Template, TemplateVars};

    /// Variables for index.html.
    pub struct PageVars<'a> {
        pub title: &'a str,
    }

    impl TemplateVars for PageVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__BALE_TITLE__", self.title)
        }
    }

    pub const INDEX_HTML: Template<PageVars<'static>> =
        Template::new(include_str!("page/index.html"));
}

#[cfg(test)]
mod tests {
    use super::chunk::{RUNTIME_JS, RuntimeVars};
    use super::page::{INDEX_HTML, PageVars};

    #[test]
    fn test_runtime_placeholder_replaced() {
        let js = RUNTIME_JS.render(&RuntimeVars { data: "{\"entry\":\"a.js\"}" });
        assert!(js.contains("{\"entry\":\"a.js\"}"));
        assert!(!js.contains("__BALE_RUNTIME_DATA__"));
    }

    #[test]
    fn test_page_has_head() {
        let html = INDEX_HTML.render(&PageVars { title: "app" });
        assert!(html.contains("<title>app</title>"));
        assert!(html.contains("</head>"));
    }
}
