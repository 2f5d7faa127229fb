use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "memeforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a meme from a template to a PNG.
    Render(RenderArgs),
    /// List templates in the catalog.
    Templates(TemplatesArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Catalog JSON path; omit to use the built-in starter catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Template id to render.
    #[arg(long)]
    template: String,

    /// Layer texts, in default-layer order. Repeat for multiple layers;
    /// omit to keep the template's default texts.
    #[arg(long = "text")]
    texts: Vec<String>,

    /// Font registration, `FAMILY=path.ttf`. Repeat for multiple families.
    /// The first one becomes the fallback for unknown families.
    #[arg(long = "font", value_parser = parse_font_arg)]
    fonts: Vec<(String, PathBuf)>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct TemplatesArgs {
    /// Catalog JSON path; omit to use the built-in starter catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Only list templates in this category.
    #[arg(long)]
    category: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Templates(args) => cmd_templates(args),
    }
}

fn parse_font_arg(s: &str) -> Result<(String, PathBuf), String> {
    let (family, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FAMILY=path.ttf, got '{s}'"))?;
    if family.is_empty() {
        return Err(format!("empty font family in '{s}'"));
    }
    Ok((family.to_string(), PathBuf::from(path)))
}

fn read_catalog(path: Option<&Path>) -> anyhow::Result<memeforge::Catalog> {
    match path {
        Some(path) => {
            let f =
                File::open(path).with_context(|| format!("open catalog '{}'", path.display()))?;
            Ok(memeforge::Catalog::from_json_reader(BufReader::new(f))?)
        }
        None => Ok(memeforge::Catalog::sample()),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let catalog = read_catalog(args.catalog.as_deref())?;
    let template = catalog
        .template(&args.template)
        .with_context(|| format!("template '{}' not found in catalog", args.template))?
        .clone();

    let mut session = memeforge::EditorSession::new();
    for (family, path) in &args.fonts {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        session
            .register_font(family, bytes)
            .with_context(|| format!("register font family '{family}'"))?;
    }

    let request = session.activate_template(template)?;
    session
        .load_background_from_path(&request)
        .with_context(|| format!("load template image '{}'", request.source))?;

    // Positional text overrides for the default layers.
    let ids: Vec<String> = session.layers().iter().map(|l| l.id.clone()).collect();
    for (id, text) in ids.iter().zip(&args.texts) {
        session.update_layer(
            id,
            memeforge::LayerPatch {
                text: Some(text.clone()),
                ..memeforge::LayerPatch::default()
            },
        );
    }
    for text in args.texts.iter().skip(ids.len()) {
        let id = session.add_layer();
        session.update_layer(
            &id,
            memeforge::LayerPatch {
                text: Some(text.clone()),
                ..memeforge::LayerPatch::default()
            },
        );
    }

    match session.render_now()? {
        memeforge::RenderOutcome::Rendered => {}
        memeforge::RenderOutcome::NotReady => {
            anyhow::bail!("background image did not become ready")
        }
    }

    let png = session.export_png()?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_templates(args: TemplatesArgs) -> anyhow::Result<()> {
    let catalog = read_catalog(args.catalog.as_deref())?;

    let print_template = |t: &memeforge::Template| {
        println!(
            "{:<16} {:<24} {}x{} [{}] ({} default texts)",
            t.id,
            t.name,
            t.width,
            t.height,
            t.category,
            t.default_texts.len()
        );
    };

    match &args.category {
        Some(category) => {
            for t in catalog.filter_by_category(category) {
                print_template(t);
            }
        }
        None => {
            for t in catalog.templates() {
                print_template(t);
            }
        }
    }
    Ok(())
}
