//! Generate a new service project wired to the leveled logger.
//!
//! ```text
//! svc-template <PROJECT_PATH> <PROJECT_NAME> <APP_NAME> --template-repo <URL>
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use tracing_leveled_sink::env::TEMPLATE_REPO_ENV;
use tracing_leveled_sink::scaffold::{ScaffoldOptions, Scaffolder};
use tracing_leveled_sink::template::ProjectDescriptor;

#[derive(Parser, Debug)]
#[command(name = "svc-template", version, about = "Create a service project from the template repository")]
struct Args {
    /// Directory the project is created in.
    project_path: PathBuf,

    /// Project (package) name; also the new directory's name.
    project_name: String,

    /// Application name, used for the route prefix and log paths.
    app_name: String,

    /// Git URL of the template repository.
    #[arg(long, env = TEMPLATE_REPO_ENV)]
    template_repo: String,

    /// Do not run `cargo fetch` after generating.
    #[arg(long)]
    skip_fetch: bool,

    /// Log every command that is run.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let project = ProjectDescriptor::new(&args.project_path, &args.project_name, &args.app_name);
    let mut options = ScaffoldOptions::new(args.template_repo);
    options.fetch_dependencies = !args.skip_fetch;

    Scaffolder::system(options)
        .run(&project)
        .with_context(|| format!("failed to create {}", project.root.display()))?;

    println!("created {}", project.root.display());
    Ok(())
}
