use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use seascape_assets::ModelAsset;
use seascape_input::Action;
use seascape_kernel::{SeascapeConfig, SeascapeContext};
use seascape_render::{DebugTextRenderer, Projection, RenderView, Renderer, SkyPreviewRenderer};
use seascape_tools::{ModelReport, SceneInspector, dump_hierarchy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seascape-cli", about = "Headless tools for the seascape")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Move the sun and report the resulting lighting
    Sun {
        /// Degrees above the horizon, 0-90
        #[arg(short, long, default_value = "2")]
        elevation: f32,
        /// Compass heading in degrees, -180-180
        #[arg(short, long, default_value = "180")]
        azimuth: f32,
    },
    /// Render the sky and water on the CPU to a PNG
    Preview {
        /// Output image path
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value = "640")]
        width: u32,
        #[arg(long, default_value = "360")]
        height: u32,
        /// Equirectangular panorama instead of the camera view
        #[arg(long)]
        panorama: bool,
        /// Override the configured sun elevation
        #[arg(long)]
        elevation: Option<f32>,
        /// Override the configured sun azimuth
        #[arg(long)]
        azimuth: Option<f32>,
    },
    /// Print statistics and the node tree of a glTF/GLB model
    InspectModel {
        path: PathBuf,
    },
    /// Build the startup scene, load the island and describe it
    Scene,
}

impl Commands {
    /// Subcommand name as typed on the command line.
    fn name(&self) -> &'static str {
        match self {
            Commands::Info => "info",
            Commands::Sun { .. } => "sun",
            Commands::Preview { .. } => "preview",
            Commands::InspectModel { .. } => "inspect-model",
            Commands::Scene => "scene",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = SeascapeConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    tracing::debug!(config = ?cli.config, "configuration ready");
    tracing::info!(command = cli.command.name(), "command started");

    match cli.command {
        Commands::Info => {
            println!("seascape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("environment: {}", seascape_environment::crate_info());
            println!("assets: {}", seascape_assets::crate_info());
            println!("kernel: {}", seascape_kernel::crate_info());
            println!("input: {}", seascape_input::crate_info());
            println!("render: {}", seascape_render::crate_info());
            println!("tools: {}", seascape_tools::crate_info());
            println!();
            let ctx = context(config)?;
            println!("{}", SceneInspector::summary(ctx.scene()));
            println!("{}", SceneInspector::status_with_stats(&ctx));
        }
        Commands::Sun { elevation, azimuth } => {
            tracing::info!(elevation, azimuth, "moving the sun");
            let mut ctx = context(config)?;
            ctx.apply(Action::SetElevation(elevation))?;
            ctx.apply(Action::SetAzimuth(azimuth))?;

            println!("{}", SceneInspector::status_with_stats(&ctx));
            if let Some(map) = ctx.scene().environment() {
                let up = map.sample_irradiance(Vec3::Y);
                let down = map.sample_irradiance(Vec3::NEG_Y);
                println!(
                    "irradiance: up=({:.4}, {:.4}, {:.4}) down=({:.4}, {:.4}, {:.4})",
                    up.x, up.y, up.z, down.x, down.y, down.z
                );
            }
        }
        Commands::Preview {
            out,
            width,
            height,
            panorama,
            elevation,
            azimuth,
        } => {
            anyhow::ensure!(width > 0 && height > 0, "preview size must be non-zero");
            tracing::info!(width, height, panorama, out = %out.display(), "rendering preview");
            let view = RenderView::from_config(&config);
            let mut ctx = context(config)?;
            if let Some(e) = elevation {
                ctx.apply(Action::SetElevation(e))?;
            }
            if let Some(a) = azimuth {
                ctx.apply(Action::SetAzimuth(a))?;
            }

            let projection = if panorama {
                Projection::Panorama
            } else {
                Projection::Perspective
            };
            let image = SkyPreviewRenderer::new(width, height)
                .with_projection(projection)
                .render(ctx.scene(), &view);
            image
                .save(&out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            let (e, a) = ctx.sun_angles();
            tracing::debug!(out = %out.display(), "preview written");
            println!(
                "wrote {} ({width}x{height}, elevation={e:.1} azimuth={a:.1})",
                out.display()
            );
        }
        Commands::InspectModel { path } => {
            tracing::info!(path = %path.display(), "inspecting model");
            let model = ModelAsset::load(&path)
                .with_context(|| format!("failed to load model {}", path.display()))?;
            println!("{}", ModelReport::new(&model));
            println!();
            print!("{}", dump_hierarchy(&model));
        }
        Commands::Scene => {
            let view = RenderView::from_config(&config);
            let mut ctx = context(config)?;
            ctx.load_configured_assets();
            ctx.finish_loading();
            tracing::info!(island = ctx.island().label(), "scene assembled");
            print!("{}", DebugTextRenderer::new().render(ctx.scene(), &view));
            println!("{}", SceneInspector::summary(ctx.scene()));
            println!("island: {}", ctx.island().label());
        }
    }

    Ok(())
}

fn context(config: SeascapeConfig) -> anyhow::Result<SeascapeContext> {
    SeascapeContext::from_config(config).context("initial environment update failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_match_the_parser() {
        for args in [
            &["seascape-cli", "info"][..],
            &["seascape-cli", "sun", "-e", "30"],
            &["seascape-cli", "preview", "--out", "sky.png"],
            &["seascape-cli", "inspect-model", "island.glb"],
            &["seascape-cli", "scene"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.command.name(), args[1]);
        }
    }
}
