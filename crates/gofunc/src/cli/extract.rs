//! `gofunc extract` command implementation.

use std::path::Path;

use gofunc::{Config, Renderer, Session};

/// Run the extract command.
pub fn run(dir: &Path, name: &str, config: &Config, json: bool) -> Result<(), gofunc::Error> {
    let mut session = Session::open(dir, config)?;
    let bundle = session.extract(dir, name)?;

    tracing::info!(
        function = %name,
        params = bundle.params.len(),
        returns = bundle.returns.len(),
        calls = bundle.funcs.len(),
        "Extracted function"
    );

    let output = if json {
        gofunc::render_json(&bundle)?
    } else {
        Renderer::from_config(config)?.render(&bundle)?
    };
    println!("{output}");
    Ok(())
}
