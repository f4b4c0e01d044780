use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::render::Bitmap;

/// Encode the flattened render as a PNG in the temp directory and open it with
/// the platform's default viewer, ready for the user to print from there.
pub fn export_flattened(bitmap: &Bitmap) -> Result<PathBuf> {
    let path = std::env::temp_dir().join("case_gui_print.png");
    write_png(&path, bitmap).with_context(|| format!("Failed to write {}", path.display()))?;
    open_with_os(&path)?;
    Ok(path)
}

pub fn write_png(path: &Path, bitmap: &Bitmap) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);

    let mut encoder = png::Encoder::new(file, bitmap.width, bitmap.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&bitmap.pixels)?;

    Ok(())
}

#[cfg(target_os = "macos")]
fn open_with_os(path: &Path) -> Result<()> {
    std::process::Command::new("open")
        .arg(path)
        .spawn()
        .context("Failed to open print preview")?;
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn open_with_os(path: &Path) -> Result<()> {
    std::process::Command::new("xdg-open")
        .arg(path)
        .spawn()
        .context("Failed to open print preview")?;
    Ok(())
}
