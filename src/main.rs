use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ingest_mapping::{
    check_mapping, compile_mapping, load_config, load_mapping, CompileOptions, CompilerConfig,
    ConfigOverrides,
};

#[derive(Parser)]
#[command(name = "ingest-mapping")]
#[command(author, version, about = "Compile ingestion mapping workbooks into metadata and source documents")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Flow namespace (case-insensitive)
    #[arg(short, long)]
    flow: String,

    /// Path to the .xlsx workbook (defaults to <ingestion_path>/<flow>.xlsx)
    #[arg(short, long)]
    workbook: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config/ingest.yml")]
    config: PathBuf,

    #[arg(long)]
    source_schema: Option<String>,

    #[arg(long)]
    target_schema: Option<String>,

    #[arg(long)]
    batch_profile: Option<String>,

    #[arg(long)]
    datalake_profile: Option<String>,

    #[arg(long)]
    batch_location: Option<String>,

    #[arg(long)]
    datalake_location: Option<String>,
}

impl InputArgs {
    fn load_config(&self) -> Result<CompilerConfig> {
        let overrides = ConfigOverrides {
            source_schema: self.source_schema.clone(),
            target_schema: self.target_schema.clone(),
            batch_profile: self.batch_profile.clone(),
            datalake_profile: self.datalake_profile.clone(),
            batch_location: self.batch_location.clone(),
            datalake_location: self.datalake_location.clone(),
        };
        Ok(load_config(&self.config)?.with_overrides(&overrides))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a workbook and write the metadata and source documents
    Compile {
        #[command(flatten)]
        input: InputArgs,

        /// Root directory of the generated documents
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Compile a workbook without writing anything
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// List the tables of a compiled flow
    Tables {
        /// Flow namespace (case-insensitive)
        #[arg(short, long)]
        flow: String,

        /// Root directory of the generated documents
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Only these tables
        #[arg(short, long = "table")]
        tables: Vec<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { input, output_dir } => {
            let config = input.load_config()?;
            let output = compile_mapping(CompileOptions {
                workbook_path: input.workbook,
                flow: input.flow,
                output_dir,
                config,
            })?;
            println!(
                "Compiled {} tables: {} source documents, metadata {}",
                output.mapping.len(),
                output.source_files.len(),
                output.metadata_path.display()
            );
        }
        Commands::Check { input } => {
            let config = input.load_config()?;
            let workbook = input
                .workbook
                .clone()
                .unwrap_or_else(|| config.workbook_path(&input.flow));
            let mapping = check_mapping(&workbook, &input.flow, &config)?;
            for table in &mapping {
                println!(
                    "{} ({}): {} columns",
                    table.target_table,
                    table.worksheet,
                    table.columns.len()
                );
            }
        }
        Commands::Tables {
            flow,
            output_dir,
            tables,
        } => {
            let mapping = load_mapping(&output_dir, &flow, &tables)?;
            for table in &mapping {
                println!(
                    "{}\t{}\t{}",
                    table.target_table, table.source_location, table.target_location
                );
            }
        }
    }

    Ok(())
}
