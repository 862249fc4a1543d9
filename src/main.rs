use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use log::info;

use icon_baker::{
    IconPipeline, IconSettings, Manifest, PngDirectorySink, PresetStore, SoftwareRenderer, Target,
};

const USAGE: &str = "Usage: icon-baker <manifest.xml | model.obj>... [--out DIR] [--size N] \
[--padding F] [--rotation X,Y,Z] [--shadow] [--target NAME] [--preset NAME] \
[--presets-dir DIR] [--save-preset NAME]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let mut store = if options.preset.is_some() || options.save_preset.is_some() {
        Some(PresetStore::open(&options.presets_dir).with_context(|| {
            format!("failed to open presets in {}", options.presets_dir.display())
        })?)
    } else {
        None
    };

    let mut settings = match (&options.preset, &store) {
        (Some(name), Some(store)) => store
            .load(name)
            .with_context(|| format!("failed to load preset {name}"))?,
        _ => IconSettings::default(),
    };
    options.apply(&mut settings);
    settings.validate().context("invalid icon settings")?;

    if let (Some(name), Some(store)) = (&options.save_preset, store.as_mut()) {
        settings.name = name.clone();
        store
            .save(settings.clone())
            .with_context(|| format!("failed to save preset {name}"))?;
        println!("Saved preset {name}");
    }

    let targets = load_targets(&options)?;
    println!("Loaded {} target(s)", targets.len());
    for target in &targets {
        println!(" - {} ({} mesh(es))", target.name, target.meshes.len());
    }

    let directory = options
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.directory));
    let sink = PngDirectorySink::new(directory.clone());
    let mut pipeline = IconPipeline::new(settings, SoftwareRenderer::new(), sink);
    let report = pipeline.generate(&targets, |progress| {
        info!(
            "[{}/{}] {}",
            progress.index + 1,
            progress.total,
            progress.name
        );
    });

    println!(
        "Generated {} icon(s), {} placeholder(s), {} failure(s)",
        report.generated, report.placeholders, report.failed
    );
    println!("Output directory: {}", directory.display());
    Ok(())
}

fn load_targets(options: &CliOptions) -> Result<Vec<Target>> {
    let mut manifest = Manifest::default();
    for input in &options.inputs {
        let path = Path::new(input);
        let is_obj = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
        if is_obj {
            manifest.targets.push(Target::from_obj_file(path)?);
        } else {
            let loaded = Manifest::open(path)
                .with_context(|| format!("failed to load manifest {input}"))?;
            manifest.targets.extend(loaded.targets);
        }
    }

    if options.only.is_empty() {
        return Ok(manifest.targets);
    }
    options
        .only
        .iter()
        .map(|name| manifest.find(name).cloned().map_err(Into::into))
        .collect()
}

struct CliOptions {
    inputs: Vec<String>,
    out: Option<PathBuf>,
    size: Option<u32>,
    padding: Option<f32>,
    rotation: Option<Vec3>,
    shadow: bool,
    only: Vec<String>,
    preset: Option<String>,
    presets_dir: PathBuf,
    save_preset: Option<String>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut options = Self {
            inputs: Vec::new(),
            out: None,
            size: None,
            padding: None,
            rotation: None,
            shadow: false,
            only: Vec::new(),
            preset: None,
            presets_dir: PathBuf::from("presets"),
            save_preset: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => options.out = Some(PathBuf::from(next_value(&mut args, &arg)?)),
                "--size" => {
                    let value = next_value(&mut args, &arg)?;
                    options.size = Some(
                        value
                            .parse::<u32>()
                            .with_context(|| format!("invalid --size {value:?}"))?,
                    );
                }
                "--padding" => {
                    let value = next_value(&mut args, &arg)?;
                    options.padding = Some(
                        value
                            .parse::<f32>()
                            .with_context(|| format!("invalid --padding {value:?}"))?,
                    );
                }
                "--rotation" => {
                    options.rotation = Some(parse_rotation(&next_value(&mut args, &arg)?)?)
                }
                "--shadow" => options.shadow = true,
                "--target" => options.only.push(next_value(&mut args, &arg)?),
                "--preset" => options.preset = Some(next_value(&mut args, &arg)?),
                "--presets-dir" => {
                    options.presets_dir = PathBuf::from(next_value(&mut args, &arg)?)
                }
                "--save-preset" => options.save_preset = Some(next_value(&mut args, &arg)?),
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
                _ => options.inputs.push(arg.clone()),
            }
        }

        if options.inputs.is_empty() {
            bail!(USAGE);
        }
        Ok(options)
    }

    fn apply(&self, settings: &mut IconSettings) {
        if let Some(size) = self.size {
            settings.texture.size = size;
        }
        if let Some(padding) = self.padding {
            settings.camera.padding = padding;
        }
        if let Some(rotation) = self.rotation {
            settings.camera.rotation = rotation;
        }
        if self.shadow {
            settings.shadow.enabled = true;
        }
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}

fn parse_rotation(value: &str) -> Result<Vec3> {
    let components = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .with_context(|| format!("invalid rotation component {part:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("--rotation expects X,Y,Z, got {value:?}")),
    }
}
