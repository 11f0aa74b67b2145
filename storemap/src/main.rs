//! Point d'entrée CLI pour storemap

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use storemap::cli::{self, Commands};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Exporter les comparaisons de prix par magasin vers GeoJSON
#[derive(Parser)]
#[command(name = "storemap")]
#[command(author, version)]
#[command(about = "Exporter les comparaisons de prix par magasin (CSV ou PostgreSQL) vers GeoJSON")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::FromCsv { input, output } => {
            info!(input = %input.display(), "Export CSV vers GeoJSON");
            cli::cmd_from_csv(&input, &output)?;
        }
        Commands::FromPostgres {
            query,
            query_file,
            batch_size,
            output,
            db,
        } => {
            info!(output = %output.output.display(), "Export PostgreSQL vers GeoJSON");
            cli::cmd_from_postgres(query, query_file.as_deref(), batch_size, &output, &db).await?;
        }
        Commands::Diagnose { db } => cli::cmd_diagnose(&db).await?,
        Commands::QuickCheck { db } => cli::cmd_quick_check(&db).await?,
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
