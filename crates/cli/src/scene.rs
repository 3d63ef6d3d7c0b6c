//! `thinner scene` commands

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use thinner_config::{SceneFormat, ToolConfig};
use thinner_core::Endian;
use thinner_scene::SceneFile;

#[derive(Debug, Subcommand)]
pub enum SceneCommand {
    /// Convert between binary, XML and JSON (chosen by file extension or content)
    Convert(ConvertArgs),

    /// Print a scene file's version and counts
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Source file (.xml, .json, anything else is sniffed from its content)
    pub input: PathBuf,
    /// Destination file (.xml, .json, anything else is binary)
    pub output: PathBuf,
    /// Write the Scene Designer export instead (output must be .xml)
    #[arg(long)]
    pub designer: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Scene file in any of the three forms
    pub input: PathBuf,
}

pub fn execute(cmd: SceneCommand, config: &ToolConfig) -> Result<()> {
    match cmd {
        SceneCommand::Convert(args) => convert(&args, config),
        SceneCommand::Info(args) => info(&args, config),
    }
}

/// Text form named by a path's extension; `None` means binary
pub fn text_format(path: &Path) -> Option<SceneFormat> {
    let ext = path.extension()?.to_str()?;
    ext.parse().ok()
}

pub fn parse_text(text: &str, format: SceneFormat) -> Result<SceneFile> {
    Ok(match format {
        SceneFormat::Xml => SceneFile::from_xml(text)?,
        SceneFormat::Json => SceneFile::from_json(text)?,
    })
}

pub fn render_text(file: &SceneFile, format: SceneFormat, pretty: bool) -> Result<String> {
    Ok(match format {
        SceneFormat::Xml => file.to_xml(pretty)?,
        SceneFormat::Json => file.to_json(pretty)?,
    })
}

pub fn load(path: &Path, endian: Endian) -> Result<SceneFile> {
    let file = match text_format(path) {
        Some(format) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_text(&text, format)
        }
        None => {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            SceneFile::from_bytes_auto(&bytes, endian).map_err(anyhow::Error::from)
        }
    };
    file.with_context(|| format!("Failed to load scene {}", path.display()))
}

pub fn save(file: &SceneFile, path: &Path, config: &ToolConfig) -> Result<()> {
    let bytes = match text_format(path) {
        Some(format) => render_text(file, format, config.pretty)?.into_bytes(),
        None => file.encode(config.endian)?,
    };
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn convert(args: &ConvertArgs, config: &ToolConfig) -> Result<()> {
    let file = load(&args.input, config.endian)?;
    if args.designer {
        if text_format(&args.output) != Some(SceneFormat::Xml) {
            bail!("the Scene Designer export is XML; {} needs a .xml extension", args.output.display());
        }
        let text = file.to_scene_designer_xml(config.pretty)?;
        fs::write(&args.output, text)
            .with_context(|| format!("Failed to write {}", args.output.display()))?;
    } else {
        save(&file, &args.output, config)?;
    }
    tracing::info!(
        "converted {} scene {} -> {}",
        file.version,
        args.input.display(),
        args.output.display()
    );
    Ok(())
}

fn info(args: &InfoArgs, config: &ToolConfig) -> Result<()> {
    let file = load(&args.input, config.endian)?;
    let layout = file.version.layout();

    println!("Scene: {}", args.input.display());
    println!("  Version:     {} ({})", file.version, file.version.number());
    if layout.has_guid {
        println!("  GUID:        {}", file.guid.to_hex_groups(16));
    }
    if layout.has_extra_strings {
        println!("  Extra strings: {}", file.em2_extra_strings.len());
    }
    println!("  Entities:    {}", file.objects.entities.len());
    println!("  Components:  {}", file.component_count());
    println!("  Properties:  {}", file.property_count());
    println!("  Scene refs:  {}", file.scene.referenced_entities.len());

    let assets = file.asset_references();
    if !assets.is_empty() {
        println!("  Assets:");
        for asset in assets {
            println!("    {}", asset);
        }
    }
    Ok(())
}
