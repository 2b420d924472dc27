use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use hwpba_animation_core::{Config, Engine, LoopMode};
use hwpba_export::{
    convert_gltf_to_manifest, create_files, write_manifest, ConvertOptions, ExportSettings,
};
use hwpba_manifest::{parse_manifest_json, AssetOrigin, TextAssetLocator};

#[derive(Parser, Debug)]
#[command(name = "hwpba", version, about = "Parts-based animation export and playback tools")]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a glTF rig into an upload-ready HWPBA_Output folder
    Build {
        gltf: PathBuf,
        /// Base output folder (HWPBA_Output is created inside it)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Character name (defaults to the glTF file stem)
        #[arg(long)]
        name: Option<String>,
        /// Node whose subtree holds the parts
        #[arg(long)]
        source: Option<String>,
        /// Settings JSON; flags override its values
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Convert a glTF file into a manifest JSON
    Convert {
        gltf: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long)]
        source: Option<String>,
    },
    /// Summarise a manifest
    Inspect { manifest: PathBuf },
    /// Print every part pose of a clip at a given time
    Sample {
        manifest: PathBuf,
        #[arg(long)]
        clip: String,
        #[arg(long)]
        time: f32,
        #[arg(long, default_value = "once")]
        mode: LoopMode,
    },
    /// Resolve a named text asset from a library folder or script folder
    Locate {
        name: String,
        /// Folder whose files are published under their file stem
        #[arg(long)]
        library: Option<PathBuf>,
        #[arg(long)]
        scripts: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn read_manifest(path: &Path) -> Result<hwpba_manifest::Manifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    parse_manifest_json(&raw).with_context(|| format!("invalid manifest {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("{:?}", cli.cmd);

    match cli.cmd {
        Command::Build {
            gltf,
            output,
            name,
            source,
            settings,
        } => {
            let mut s = match settings {
                Some(path) => ExportSettings::load(&path)?,
                None => ExportSettings::default(),
            };
            if let Some(output) = output {
                s.output_root = output;
            }
            if let Some(name) = name {
                s.character_name = name;
            }
            if source.is_some() {
                s.source_node = source;
            }
            let report = create_files(&s, &gltf)
                .with_context(|| format!("export of {} failed", gltf.display()))?;
            for w in &report.warnings {
                println!("warning: {w}");
            }
            println!("{}", report.message);
            println!("  parts:        {} ({})", report.part_count, report.source_label);
            println!("  manifest:     {}", report.manifest_path.display());
            println!("  instructions: {}", report.instructions_path.display());
            for t in &report.textures {
                println!("  texture:      {}", t.display());
            }
        }
        Command::Convert {
            gltf,
            out,
            prefix,
            source,
        } => {
            let opts = ConvertOptions {
                name_prefix: prefix,
                source_node: source,
            };
            let manifest = convert_gltf_to_manifest(&gltf, &opts)
                .with_context(|| format!("conversion of {} failed", gltf.display()))?;
            println!("{}", write_manifest(&manifest, &out)?);
        }
        Command::Inspect { manifest } => {
            let m = read_manifest(&manifest)?;
            let summary = m.summary();
            println!("Manifest: {}", manifest.display());
            println!("  source:    {}", summary.source);
            println!("  generated: {}", summary.generated);
            println!("  prefix:    {:?}", summary.name_prefix);
            println!("  parts ({}): {}", summary.parts.len(), summary.parts.join(", "));
            for c in &summary.clips {
                println!(
                    "  clip {:?}: {} key(s), {:.3}s, {} rotated, {} positioned",
                    c.name, c.frames, c.duration, c.rotated_parts, c.positioned_parts
                );
            }
        }
        Command::Sample {
            manifest,
            clip,
            time,
            mode,
        } => {
            let m = read_manifest(&manifest)?;
            let mut engine = Engine::new(Config::default());
            let character = engine.load_character(&m)?;
            let pose = engine.pose_at(character, &clip, time, mode)?;
            let rows: Vec<_> = pose
                .into_iter()
                .map(|(part, p)| {
                    serde_json::json!({
                        "part": part,
                        "position": p.position,
                        "rotation": p.rotation,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Locate {
            name,
            library,
            scripts,
        } => {
            let mut locator = TextAssetLocator::new();
            if let Some(dir) = library {
                locator
                    .publish_dir(&dir)
                    .with_context(|| format!("failed to read library {}", dir.display()))?;
            }
            if let Some(dir) = scripts {
                locator = locator.with_script_dir(dir);
            }
            let asset = locator.locate(&name)?;
            match &asset.origin {
                AssetOrigin::Library => println!("{}: public library", asset.name),
                AssetOrigin::Local(path) => println!("{}: local copy {}", asset.name, path.display()),
            }
            println!("  {} byte(s)", asset.contents.len());
        }
    }
    Ok(())
}
