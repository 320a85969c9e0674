use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, info};

use erd::demos::DemoKind;
use erd::{ErdError, IdGenerator, LayoutOptions, RenderOptions, er_renderer};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Demo {
    Property,
    Dependent,
    Vertabelo,
}

impl From<Demo> for DemoKind {
    fn from(demo: Demo) -> Self {
        match demo {
            Demo::Property => DemoKind::Property,
            Demo::Dependent => DemoKind::Dependent,
            Demo::Vertabelo => DemoKind::Vertabelo,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "erd",
    version,
    about = "Render Entity-Relationship diagrams in Chen's notation with Graphviz"
)]
struct Cli {
    /// Example diagram to render
    #[arg(value_enum)]
    demo: Demo,

    /// Path of the graph description; the diagram is written to `<OUTPUT>.<FORMAT>`
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Graphviz output format (pdf, png, svg, ...)
    #[arg(long, short = 'f', default_value = "pdf")]
    format: String,

    /// Place nodes with neato instead of sfdp
    #[arg(long)]
    neato: bool,

    /// sfdp spring constant
    #[arg(long)]
    k: Option<f64>,

    /// sfdp repulsive force
    #[arg(long, allow_negative_numbers = true)]
    repulsive_force: Option<f64>,

    /// sfdp overlap scaling
    #[arg(long, allow_negative_numbers = true)]
    overlap_scaling: Option<f64>,

    /// Open the rendered diagram
    #[arg(long, conflicts_with = "source_only")]
    view: bool,

    /// Only write the graph description, without running Graphviz
    #[arg(long)]
    source_only: bool,

    /// Print the model instead of rendering it
    #[arg(long)]
    describe: bool,

    /// Log level (off, error, warn, info, debug, trace); defaults to RUST_LOG or warn
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn layout(&self, mut layout: LayoutOptions) -> LayoutOptions {
        layout.use_neato |= self.neato;
        if let Some(k) = self.k {
            layout.k = k;
        }
        if let Some(force) = self.repulsive_force {
            layout.repulsive_force = force;
        }
        if let Some(scaling) = self.overlap_scaling {
            layout.overlap_scaling = scaling;
        }
        layout
    }
}

fn run(cli: &Cli) -> Result<(), ErdError> {
    let kind = DemoKind::from(cli.demo);
    let demo = kind.build()?;

    if cli.describe {
        print!("{}", demo.describe());
        return Ok(());
    }

    let layout = cli.layout(demo.layout);
    let destination = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{kind}.gv")));
    info!(demo = kind.name(), destination:? = destination; "rendering");

    if cli.source_only || cli.view {
        let ids = IdGenerator::new();
        let graph = er_renderer::build(&demo.entities, &demo.relations, &layout, &ids)?;
        if cli.source_only {
            graph.save(&destination)?;
            println!("{}", destination.display());
        } else {
            let artifact = graph.view(&destination, &cli.format)?;
            println!("{}", artifact.display());
        }
        return Ok(());
    }

    let options = RenderOptions {
        format: cli.format.clone(),
        layout,
    };
    let artifact = er_renderer::render(&demo.entities, &demo.relations, &destination, &options)?;
    println!("{}", artifact.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = &cli.log_level {
        let level = LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level: {level}. Using 'warn' instead.");
            LevelFilter::Warn
        });
        logger.filter_level(level);
    }
    logger.init();
    debug!(cli:? = cli; "parsed arguments");

    if let Err(e) = run(&cli) {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }
}
