//! `gofunc resolve` command implementation.

use std::path::Path;

use colored::Colorize;
use gofunc::{Config, Session};

/// Run the resolve command.
pub fn run(dir: &Path, import_path: &str, config: &Config) -> Result<(), gofunc::Error> {
    let session = Session::open(dir, config)?;
    let resolver = session.resolver();

    println!(
        "{}: {} ({})",
        "Module".white().bold(),
        resolver.manifest().module.cyan(),
        resolver.manifest_dir().display()
    );

    match resolver.resolve(import_path)? {
        Some(resolved) => {
            let status = if resolved.is_dir() {
                "found".green()
            } else {
                "missing".yellow()
            };
            println!(
                "{}: {} [{status}]",
                import_path.cyan(),
                resolved.display()
            );
        }
        None => {
            println!("{}: {}", import_path.cyan(), "not resolvable".dimmed());
            println!(
                "\n{}: standard library packages and paths outside the module's requirements do not resolve.",
                "hint".dimmed()
            );
        }
    }
    Ok(())
}
