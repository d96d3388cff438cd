use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// The project being generated: its name, the application it hosts and
/// where it lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub name: String,
    pub app: String,
    pub root: PathBuf,
}

impl ProjectDescriptor {
    /// Describe project `name` created under `parent`.
    pub fn new(parent: impl AsRef<Path>, name: impl Into<String>, app: impl Into<String>) -> Self {
        let name = name.into();
        ProjectDescriptor {
            root: parent.as_ref().join(&name),
            name,
            app: app.into(),
        }
    }

    /// Rust identifier for the package (`my-svc` → `my_svc`).
    pub fn crate_name(&self) -> String {
        self.name.replace('-', "_")
    }

    /// Variables visible to templates: `project_name`, `app_name`,
    /// `crate_name`.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert("project_name", &self.name);
        ctx.insert("app_name", &self.app);
        ctx.insert("crate_name", &self.crate_name());
        ctx
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the target.
    Create,
    /// Append to a target that already exists.
    Append,
}

/// One file copied from the template repository into the new project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateFile {
    /// Path inside the template checkout.
    pub source: &'static str,
    /// Path inside the new project.
    pub target: &'static str,
    pub mode: WriteMode,
}

/// Module directories created next to `src/main.rs`.
pub const PROJECT_SUBDIRS: [&str; 3] = ["src/log", "src/middlewares", "src/handlers"];

pub const TEMPLATE_MANIFEST: [TemplateFile; 5] = [
    TemplateFile {
        source: "log/logger.rs",
        target: "src/log/mod.rs",
        mode: WriteMode::Create,
    },
    TemplateFile {
        source: "middlewares/middlewares.rs",
        target: "src/middlewares/mod.rs",
        mode: WriteMode::Create,
    },
    TemplateFile {
        source: "handlers/handlers.rs",
        target: "src/handlers/mod.rs",
        mode: WriteMode::Create,
    },
    TemplateFile {
        source: "conf.yaml",
        target: "conf.yaml",
        mode: WriteMode::Create,
    },
    TemplateFile {
        source: "dependencies.toml",
        target: "Cargo.toml",
        mode: WriteMode::Append,
    },
];

pub const ENTRY_POINT: &str = "src/main.rs";

/// Entry point of every generated service.
pub const ENTRY_POINT_TEMPLATE: &str = r#"//! {{ project_name }}: {{ app_name }} service.

mod handlers;
mod log;
mod middlewares;

use std::process;

fn main() {
    let env = std::env::var("envID")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "dev".to_string());

    let config = match log::load_config("conf.yaml") {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to read conf.yaml: {err}");
            process::exit(1);
        }
    };
    log::init(&config, &env);

    let port = config.app.port.unwrap_or(8080);
    let app = middlewares::wrap(handlers::routes("/{{ app_name }}"));

    log::info("starting {{ app_name }}", &[log::Field::new("port", port)]);
    if let Err(err) = middlewares::serve(port, app) {
        log::error("{{ app_name }} stopped", &err);
        process::exit(1);
    }
}
"#;

#[derive(thiserror::Error, Debug)]
#[error("failed to render template {name}: {source}")]
pub struct RenderError {
    pub name: String,
    #[source]
    pub source: tera::Error,
}

/// Render `text` with the descriptor's variables. Only `{{ ... }}`
/// placeholders are substituted; unknown variables are an error.
pub fn render(name: &str, text: &str, project: &ProjectDescriptor) -> Result<String, RenderError> {
    let wrap = |source| RenderError { name: name.to_string(), source };

    let mut tera = Tera::default();
    tera.add_raw_template(name, text).map_err(wrap)?;
    tera.render(name, &project.context()).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectDescriptor {
        ProjectDescriptor::new("/work", "order-svc", "orders")
    }

    #[test]
    fn descriptor_paths_and_names() {
        let p = project();
        assert_eq!(p.root, PathBuf::from("/work/order-svc"));
        assert_eq!(p.crate_name(), "order_svc");
    }

    #[test]
    fn substitutes_only_placeholders() {
        let text = "name: {{ project_name }}\n# project_name stays literal in prose\napp: {{ app_name }}\n";
        let out = render("conf.yaml", text, &project()).unwrap();
        assert_eq!(out, "name: order-svc\n# project_name stays literal in prose\napp: orders\n");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = render("x.rs", "{{ owner }}", &project()).unwrap_err();
        assert_eq!(err.name, "x.rs");
    }

    #[test]
    fn entry_point_renders() {
        let out = render(ENTRY_POINT, ENTRY_POINT_TEMPLATE, &project()).unwrap();
        assert!(out.starts_with("//! order-svc: orders service."));
        assert!(out.contains(r#"handlers::routes("/orders")"#));
        assert!(out.contains("eprintln!(\"failed to read conf.yaml: {err}\")"));
        assert!(!out.contains("{{"));
    }
}
