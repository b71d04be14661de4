use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::{env, process};
use vellum_config::Config;
use vellum_engine::{
    ConversionRules, DocumentTree, MarkupOptions, Schema, to_markup, to_render_tree, to_text,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Markup,
    Text,
    RenderJson,
}

struct Options {
    format: Option<Format>,
    input: Option<PathBuf>,
    config_path: Option<PathBuf>,
    replace_spaces: bool,
    expand_markers: bool,
    no_schema: bool,
    no_conversion: bool,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [options] [file]");
    eprintln!();
    eprintln!("Reads canonical markup from a file (or stdin) and re-emits it.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --markup          emit canonical markup (default)");
    eprintln!("  --text            emit plain text");
    eprintln!("  --render-json     emit the render tree as JSON");
    eprintln!("  --replace-spaces  alternate non-breaking spaces in space runs");
    eprintln!("  --expand-markers  emit selection markers as reserved tags");
    eprintln!("  --no-schema       skip schema filtering");
    eprintln!("  --no-conversion   skip conversion rules");
    eprintln!("  --config <path>   read config from <path> instead of the default");
    process::exit(1);
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();
    let mut options = Options {
        format: None,
        input: None,
        config_path: None,
        replace_spaces: false,
        expand_markers: false,
        no_schema: false,
        no_conversion: false,
    };

    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--markup" => options.format = Some(Format::Markup),
            "--text" => options.format = Some(Format::Text),
            "--render-json" => options.format = Some(Format::RenderJson),
            "--replace-spaces" => options.replace_spaces = true,
            "--expand-markers" => options.expand_markers = true,
            "--no-schema" => options.no_schema = true,
            "--no-conversion" => options.no_conversion = true,
            "--config" => match iter.next() {
                Some(path) => options.config_path = Some(PathBuf::from(path)),
                None => {
                    eprintln!("Error: --config needs a path");
                    usage(&program);
                }
            },
            "--help" | "-h" => usage(&program),
            other if other.starts_with('-') => {
                eprintln!("Error: unknown option {other}");
                usage(&program);
            }
            other => {
                if options.input.is_some() {
                    eprintln!("Error: more than one input file");
                    usage(&program);
                }
                options.input = Some(PathBuf::from(other));
            }
        }
    }
    options
}

fn load_config(options: &Options) -> Result<Config> {
    let loaded = match &options.config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading default config")?,
    };
    match loaded {
        Some(config) => {
            log::debug!("config loaded");
            Ok(config)
        }
        None => {
            log::debug!("no config file, using defaults");
            Ok(Config::default())
        }
    }
}

fn read_input(options: &Options) -> Result<String> {
    match &options.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            Ok(buffer)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();

    let options = parse_args();
    let config = load_config(&options)?;

    let format = options.format.unwrap_or_else(|| {
        match config.output.format.as_str() {
            "text" => Format::Text,
            "render-json" => Format::RenderJson,
            _ => Format::Markup,
        }
    });

    let source = read_input(&options)?;
    let tree = DocumentTree::from_markup(&source).context("parsing input markup")?;
    log::debug!("parsed {} bytes of markup", source.len());

    let schema: Option<Schema> = if options.no_schema {
        None
    } else {
        Some(config.schema())
    };
    let rules: Option<ConversionRules> = if options.no_conversion {
        None
    } else {
        Some(ConversionRules::standard())
    };

    match format {
        Format::Markup => {
            let markup_options = MarkupOptions {
                replace_spaces: options.replace_spaces || config.output.replace_spaces,
                expand_markers: options.expand_markers || config.output.expand_markers,
            };
            let markup = to_markup(
                &tree,
                tree.root(),
                schema.as_ref(),
                rules.as_ref(),
                markup_options,
            );
            println!("{markup}");
        }
        Format::Text => {
            let text = to_text(&tree, tree.root(), rules.as_ref(), false);
            println!("{text}");
        }
        Format::RenderJson => {
            let render = to_render_tree(&tree, tree.root(), schema.as_ref(), rules.as_ref());
            let json = serde_json::to_string_pretty(&render).context("encoding render tree")?;
            println!("{json}");
        }
    }

    Ok(())
}
