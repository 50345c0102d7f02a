use std::path::{Path, PathBuf};

use tera::Tera;
use walkdir::WalkDir;

use crate::{compose::render_site, context::Context, site::Site};

pub fn copy_static_files(context: &Context) -> anyhow::Result<()> {
    let static_dir: PathBuf = context.absolute("static");

    if !static_dir.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(&static_dir) {
        let entry = entry?;

        if !entry.file_type().is_file() {
            continue;
        }

        context.copy_to_output(entry.path(), entry.path().strip_prefix(&static_dir)?)?;
    }

    Ok(())
}

fn copy_assets(context: &Context, site: &Site) -> anyhow::Result<()> {
    for (name, source) in &site.assets {
        tracing::info!(path = %name, "copying asset to output");
        context.copy_to_output(source, Path::new(name))?;
    }

    Ok(())
}

/// Writes the composed site, static files and content assets to the output
/// directory, replacing whatever was there.
pub fn write_site(context: &Context, tera: &Tera, site: &Site) -> anyhow::Result<()> {
    context.clean_output_dir()?;

    copy_static_files(context)?;
    copy_assets(context, site)?;

    for (name, contents) in render_site(&context.config, tera, site)? {
        tracing::debug!(path = %name, "writing page");
        context.write_to_output(Path::new(&name), &contents)?;
    }

    Ok(())
}
