//! `thinner pak` commands

use crate::scene::{parse_text, render_text};
use crate::{is_scene_path, manifest_file, payload_path, sidecar_path};
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use thinner_config::{SceneFormat, ToolConfig};
use thinner_packfile::{
    sniff_endian, ManifestEntry, ManifestFormat, PackManifest, Packfile, VirtualFile,
};
use thinner_scene::SceneFile;
use walkdir::WalkDir;

#[derive(Debug, Subcommand)]
pub enum PakCommand {
    /// List the files of a packfile in load order
    List(ListArgs),

    /// Write every payload plus a manifest into a directory
    Extract(ExtractArgs),

    /// Rebuild a packfile from a manifest and an extracted directory
    Build(BuildArgs),

    /// Pack every file under a directory
    Create(CreateArgs),

    /// Convert between a packfile and a document with inline payloads
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    pub pak: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    pub pak: PathBuf,
    /// Output directory, created if missing
    pub dir: PathBuf,
    /// Manifest form: json (default) or xml
    #[arg(long)]
    pub manifest_format: Option<ManifestFormat>,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Manifest written by `pak extract`
    pub manifest: PathBuf,
    /// Directory holding the payloads
    pub dir: PathBuf,
    pub out: PathBuf,
    /// Manifest form; defaults to the manifest's extension, then json
    #[arg(long)]
    pub manifest_format: Option<ManifestFormat>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub dir: PathBuf,
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Source (.xml, .json, anything else is a binary packfile)
    pub input: PathBuf,
    /// Destination (.xml, .json, anything else is a binary packfile)
    pub output: PathBuf,
}

pub fn execute(cmd: PakCommand, config: &ToolConfig) -> Result<()> {
    match cmd {
        PakCommand::List(args) => list(&args),
        PakCommand::Extract(args) => extract(&args, config),
        PakCommand::Build(args) => build(&args, config),
        PakCommand::Create(args) => create(&args, config),
        PakCommand::Convert(args) => convert(&args, config),
    }
}

/// Document form named by a path's extension; `None` means binary
fn document_format(path: &Path) -> Option<ManifestFormat> {
    let name = path.file_name()?.to_str()?;
    ManifestFormat::from_file_name(name)
}

fn read_pak(path: &Path) -> Result<(Vec<u8>, Packfile)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let pak = Packfile::decode(&bytes)
        .with_context(|| format!("Failed to decode packfile {}", path.display()))?;
    Ok((bytes, pak))
}

fn write_pak(pak: &Packfile, path: &Path, config: &ToolConfig) -> Result<()> {
    let image = pak.encode(config.endian)?;
    fs::write(path, &image).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(
        "wrote {} ({} files, {} bytes, {} endian)",
        path.display(),
        pak.len(),
        image.len(),
        config.endian
    );
    Ok(())
}

fn list(args: &ListArgs) -> Result<()> {
    let (bytes, pak) = read_pak(&args.pak)?;
    let endian = sniff_endian(&bytes)?;
    let layout = pak.plan()?;

    println!(
        "{} (version {}, {} endian, {} files)",
        args.pak.display(),
        pak.version,
        endian,
        pak.len()
    );
    println!("{:>5}  {:<4}  {:>10}  {:>10}  path", "index", "tag", "size", "stored");
    for (index, (file, entry)) in pak.files.iter().zip(&layout.entries).enumerate() {
        println!(
            "{:>5}  {:<4}  {:>10}  {:>10}  {}",
            index,
            file.type_tag.as_str(),
            entry.real_size,
            entry.compressed_size,
            file.path
        );
    }
    Ok(())
}

fn extract(args: &ExtractArgs, config: &ToolConfig) -> Result<()> {
    let (bytes, pak) = read_pak(&args.pak)?;
    let endian = sniff_endian(&bytes)?;

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("Failed to create {}", args.dir.display()))?;

    let mut scenes = 0;
    for file in &pak.files {
        let target = payload_path(&args.dir, &file.path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.data)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        if config.convert_scenes && is_scene_path(&file.path) {
            match SceneFile::decode(&file.data, endian) {
                Ok(scene) => {
                    let text = render_text(&scene, config.scene_format, config.pretty)?;
                    fs::write(sidecar_path(&target, config.scene_format), text)?;
                    scenes += 1;
                }
                Err(e) => tracing::debug!("{} is not a scene file: {}", file.path, e),
            }
        }
    }

    let format = args.manifest_format.unwrap_or_default();
    let manifest = pak.manifest().to_text(format, true)?;
    fs::write(args.dir.join(manifest_file(format)), manifest)?;

    tracing::info!(
        "extracted {} files ({} scenes converted) to {}",
        pak.len(),
        scenes,
        args.dir.display()
    );
    Ok(())
}

/// Payload for one manifest entry; a scene sidecar wins over the raw `.bin`
fn load_payload(dir: &Path, entry: &ManifestEntry, config: &ToolConfig) -> Result<Vec<u8>> {
    let raw = payload_path(dir, &entry.path)?;

    if config.convert_scenes && is_scene_path(&entry.path) {
        let preferred = config.scene_format;
        let other = match preferred {
            SceneFormat::Xml => SceneFormat::Json,
            SceneFormat::Json => SceneFormat::Xml,
        };
        for format in [preferred, other] {
            let sidecar = sidecar_path(&raw, format);
            if sidecar.is_file() {
                let text = fs::read_to_string(&sidecar)?;
                let scene = parse_text(&text, format)
                    .with_context(|| format!("Failed to parse {}", sidecar.display()))?;
                tracing::debug!("{}: using {}", entry.path, sidecar.display());
                return Ok(scene.encode(config.endian)?);
            }
        }
    }

    fs::read(&raw).with_context(|| format!("Failed to read {}", raw.display()))
}

fn build(args: &BuildArgs, config: &ToolConfig) -> Result<()> {
    let text = fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read {}", args.manifest.display()))?;
    let format = args
        .manifest_format
        .or_else(|| document_format(&args.manifest))
        .unwrap_or_default();
    let manifest = PackManifest::from_text(&text, format)
        .with_context(|| format!("Failed to parse {} manifest {}", format, args.manifest.display()))?;

    let payloads = manifest
        .files
        .iter()
        .map(|entry| load_payload(&args.dir, entry, config))
        .collect::<Result<Vec<_>>>()?;
    let mut payloads = payloads.into_iter();
    let pak = Packfile::from_manifest(&manifest, |_| Ok(payloads.next().unwrap_or_default()))?;

    write_pak(&pak, &args.out, config)
}

fn create(args: &CreateArgs, config: &ToolConfig) -> Result<()> {
    if !args.dir.is_dir() {
        bail!("{} is not a directory", args.dir.display());
    }

    let mut pak = Packfile::new();
    for entry in WalkDir::new(&args.dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(&args.dir)?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let data = fs::read(entry.path())?;
        let mut file = VirtualFile::from_path_and_data(path, data);
        if file.compress {
            file.compression_level = config.compression_level;
        }
        tracing::trace!("adding {} ({} bytes)", file.path, file.real_size());
        pak.add_file(file);
    }

    write_pak(&pak, &args.out, config)
}

fn convert(args: &ConvertArgs, config: &ToolConfig) -> Result<()> {
    let pak = match document_format(&args.input) {
        Some(format) => {
            let text = fs::read_to_string(&args.input)
                .with_context(|| format!("Failed to read {}", args.input.display()))?;
            Packfile::from_text(&text, format)
                .with_context(|| format!("Failed to parse {}", args.input.display()))?
        }
        None => read_pak(&args.input)?.1,
    };

    match document_format(&args.output) {
        Some(format) => {
            let text = pak.to_text(format, config.pretty)?;
            fs::write(&args.output, text)
                .with_context(|| format!("Failed to write {}", args.output.display()))?;
            tracing::info!(
                "wrote {} ({} files, {} document)",
                args.output.display(),
                pak.len(),
                format
            );
            Ok(())
        }
        None => write_pak(&pak, &args.output, config),
    }
}
