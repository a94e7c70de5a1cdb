use clap::Parser;
use screenmatch::io::{from_internal, load_image, Layout};
use screenmatch::overlay::{
    draw_border, fill_area, save_overlay, DEFAULT_BORDER_THICKNESS, DEFAULT_FILL_ALPHA,
};
use screenmatch::{
    CorrelationMethod, FeatureAlgorithm, Finder, FinderConfig, MatchResult, NativeBackend,
    NativeConfig, OwnedImage, Rect, ScreenMatchError, SelectionPolicy,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "ScreenMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModeConfig {
    #[default]
    Single,
    Best,
    Keypoints,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayoutConfig {
    #[default]
    Gray,
    Rgb,
}

impl From<LayoutConfig> for Layout {
    fn from(value: LayoutConfig) -> Self {
        match value {
            LayoutConfig::Gray => Layout::Gray,
            LayoutConfig::Rgb => Layout::Rgb,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
enum MethodConfig {
    #[serde(rename = "sqdiff")]
    SqDiff,
    #[default]
    #[serde(rename = "sqdiff_normed")]
    SqDiffNormed,
    #[serde(rename = "ccorr")]
    CCorr,
    #[serde(rename = "ccorr_normed")]
    CCorrNormed,
    #[serde(rename = "ccoeff")]
    CCoeff,
    #[serde(rename = "ccoeff_normed")]
    CCoeffNormed,
}

impl From<MethodConfig> for CorrelationMethod {
    fn from(value: MethodConfig) -> Self {
        match value {
            MethodConfig::SqDiff => CorrelationMethod::SqDiff,
            MethodConfig::SqDiffNormed => CorrelationMethod::SqDiffNormed,
            MethodConfig::CCorr => CorrelationMethod::CCorr,
            MethodConfig::CCorrNormed => CorrelationMethod::CCorrNormed,
            MethodConfig::CCoeff => CorrelationMethod::CCoeff,
            MethodConfig::CCoeffNormed => CorrelationMethod::CCoeffNormed,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AlgorithmConfig {
    #[default]
    Sift,
    Orb,
}

impl From<AlgorithmConfig> for FeatureAlgorithm {
    fn from(value: AlgorithmConfig) -> Self {
        match value {
            AlgorithmConfig::Sift => FeatureAlgorithm::Sift,
            AlgorithmConfig::Orb => FeatureAlgorithm::Orb,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SelectionConfig {
    #[default]
    FirstQualifying,
    GlobalBest,
}

impl From<SelectionConfig> for SelectionPolicy {
    fn from(value: SelectionConfig) -> Self {
        match value {
            SelectionConfig::FirstQualifying => SelectionPolicy::FirstQualifying,
            SelectionConfig::GlobalBest => SelectionPolicy::GlobalBest,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
struct RectJson {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl From<RectJson> for Rect {
    fn from(value: RectJson) -> Self {
        Rect::new(value.x, value.y, value.width, value.height)
    }
}

impl From<Rect> for RectJson {
    fn from(value: Rect) -> Self {
        Self {
            x: value.x,
            y: value.y,
            width: value.width,
            height: value.height,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OverlayStyle {
    #[default]
    Border,
    Fill,
}

#[derive(Debug, Deserialize)]
struct OverlayConfig {
    path: String,
    #[serde(default)]
    style: OverlayStyle,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    mode: ModeConfig,
    source_path: String,
    template_paths: Vec<String>,
    region: Option<RectJson>,
    layout: LayoutConfig,
    method: MethodConfig,
    algorithm: AlgorithmConfig,
    ratio: Option<f32>,
    threshold: f32,
    selection: SelectionConfig,
    parallel: bool,
    overlay: Option<OverlayConfig>,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ModeConfig::default(),
            source_path: String::new(),
            template_paths: Vec::new(),
            region: None,
            layout: LayoutConfig::default(),
            method: MethodConfig::default(),
            algorithm: AlgorithmConfig::default(),
            ratio: None,
            threshold: FinderConfig::default().match_threshold,
            selection: SelectionConfig::default(),
            parallel: false,
            overlay: None,
            output_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    found: bool,
    rect: Option<RectJson>,
    confidence: Option<f32>,
    error: Option<String>,
}

impl Report {
    /// Search outcomes become reports; unusable inputs stay errors.
    fn from_outcome(
        outcome: Result<MatchResult, ScreenMatchError>,
    ) -> Result<Self, ScreenMatchError> {
        match outcome {
            Ok(found) => Ok(Self {
                found: true,
                rect: Some(found.rect().into()),
                confidence: Some(found.confidence()),
                error: None,
            }),
            Err(err) if err.is_invalid_input() => Err(err),
            Err(err) => {
                let best = err.not_found();
                Ok(Self {
                    found: false,
                    rect: best.and_then(|nf| nf.best_rect).map(RectJson::from),
                    confidence: best.map(|nf| nf.best_confidence),
                    error: Some(err.to_string()),
                })
            }
        }
    }
}

fn write_overlay(config: &Config, rect: Rect) -> Result<(), Box<dyn std::error::Error>> {
    let Some(overlay) = &config.overlay else {
        return Ok(());
    };
    let source = load_image(&config.source_path, Layout::Rgb)?;
    let rgb = from_internal(&source)?.to_rgb8();
    let highlighted = match overlay.style {
        OverlayStyle::Border => draw_border(&rgb, rect, DEFAULT_BORDER_THICKNESS),
        OverlayStyle::Fill => fill_area(&rgb, rect, DEFAULT_FILL_ALPHA),
    };
    save_overlay(&highlighted, &overlay.path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("screenmatch=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.source_path.is_empty() || config.template_paths.is_empty() {
        return Err("source_path and template_paths must be set in the config".into());
    }

    let finder_config = FinderConfig::default()
        .with_match_threshold(config.threshold)
        .with_selection(config.selection.into());
    finder_config.validate()?;
    let backend = NativeBackend::new(NativeConfig {
        parallel: config.parallel,
        ..NativeConfig::default()
    });
    let finder = Finder::with_backend(backend).with_config(finder_config);

    let layout = Layout::from(config.layout);
    let source = load_image(&config.source_path, layout)?;
    let templates = config
        .template_paths
        .iter()
        .map(|path| load_image(path, layout))
        .collect::<Result<Vec<OwnedImage>, _>>()?;
    let first = templates[0].view();
    let region = config.region.map(Rect::from);
    let method = CorrelationMethod::from(config.method);

    let outcome = match config.mode {
        ModeConfig::Single => {
            finder.match_one_in(source.view(), first, method, config.threshold, region)
        }
        ModeConfig::Best => {
            let views: Vec<_> = templates.iter().map(OwnedImage::view).collect();
            finder.match_best(source.view(), &views, method, config.threshold, region)
        }
        ModeConfig::Keypoints => finder.match_by_keypoints(
            source.view(),
            first,
            config.algorithm.into(),
            config.ratio,
        ),
    };

    if let Ok(found) = &outcome {
        write_overlay(&config, found.rect())?;
    }
    let report = Report::from_outcome(outcome)?;
    let json = serde_json::to_string_pretty(&report)?;

    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
