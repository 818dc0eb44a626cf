use anyhow::{Context, Result};
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};
use thermal_color::{cli::FrameInput, OutputFrame, ThermalImageConverter};

pub fn colorize_to_png(
    input: FrameInput,
    conv: &ThermalImageConverter,
    output: &Path,
) -> Result<PathBuf> {
    let source = input.source.clone();
    let outpath = input.output_path(output);
    let frame = input
        .convert(conv)
        .with_context(|| format!("converting {}", source))?;
    write_png(&frame, &outpath).with_context(|| format!("writing {}", outpath.display()))?;
    Ok(outpath)
}

fn write_png(frame: &OutputFrame, path: &Path) -> Result<()> {
    let image_writer = BufWriter::new(File::create(path)?);
    let mut png_writer = {
        let mut encoder = png::Encoder::new(
            image_writer,
            frame.image.width() as u32,
            frame.image.height() as u32,
        );
        encoder.set_color(png::ColorType::RGB);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.write_header()?
    };
    png_writer.write_image_data(&frame.image.to_rgb_bytes())?;
    Ok(())
}
