//! Render a low-fidelity colour preview from four separation plates.
//!
//! Usage: `plate-preview <cyan.tif> <magenta.tif> <yellow.tif> <black.tif> <out.png>`

use std::path::{Path, PathBuf};

use anyhow::Context;
use bitplate::{BitImage, CmykPlates, PlateCodec, TiffCodec};
use tracing_subscriber::EnvFilter;

fn load(codec: &TiffCodec, path: &Path) -> anyhow::Result<BitImage> {
    codec
        .load(path)
        .with_context(|| format!("failed to load plate {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let [cyan, magenta, yellow, black, output] = args.as_slice() else {
        anyhow::bail!(
            "usage: plate-preview <cyan.tif> <magenta.tif> <yellow.tif> <black.tif> <out.png>"
        );
    };

    let codec = TiffCodec::default();
    let plates = CmykPlates {
        cyan: load(&codec, cyan)?,
        magenta: load(&codec, magenta)?,
        yellow: load(&codec, yellow)?,
        black: load(&codec, black)?,
    };

    let (width, height) = plates.black.dimensions();
    if [&plates.cyan, &plates.magenta, &plates.yellow]
        .iter()
        .any(|p| p.dimensions() != (width, height))
    {
        tracing::warn!(width, height, "Plates differ in size, sampling outside a plate reads as blank");
    }

    let preview = plates.render_preview(width, height);
    preview
        .save(output)
        .with_context(|| format!("failed to write preview {}", output.display()))?;

    tracing::info!(
        width = preview.width(),
        height = preview.height(),
        output = %output.display(),
        "Preview written"
    );
    Ok(())
}
