// Canasta entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; stdout carries the table)
// 2. Load config (defaults when canasta.toml is absent)
// 3. Restore the persisted filter/sort state
// 4. Read the input file(s) and run the pipeline
// 5. Print the filtered, sorted table and the view average
// 6. Write the CSV re-export if configured
// 7. Persist the filter/sort state

use anyhow::Context;
use tracing::{info, warn};

use canasta::aggregate::SchemaVariant;
use canasta::config;
use canasta::pipeline::{LoadReport, Session};
use canasta::query;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("canasta starting up");

    // 2. Load config
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = config::load_or_default(&cwd).context("failed to load configuration")?;

    let mut session = Session::new(config.clone());

    // 3. Restore persisted filter state (invalid or missing → defaults)
    if let Ok(blob) = tokio::fs::read_to_string(&config.data_paths.state).await {
        session.restore_filter_blob(&blob);
        info!("restored filter state from {}", config.data_paths.state);
    }

    // 4. Read input files and run the pipeline. Command line overrides the
    //    configured paths: one argument is a combined file, two are the
    //    roster + scores pair.
    let args: Vec<String> = std::env::args().skip(1).collect();
    let loaded = match args.as_slice() {
        [combined_path] => load_combined(&mut session, combined_path).await?,
        [roster_path, scores_path] => {
            load_split(&mut session, roster_path, scores_path).await?
        }
        [] => match (
            config.data_paths.combined.as_deref(),
            config.data_paths.roster.as_deref(),
            config.data_paths.scores.as_deref(),
        ) {
            (Some(combined_path), _, _) => load_combined(&mut session, combined_path).await?,
            (None, Some(roster_path), Some(scores_path)) => {
                load_split(&mut session, roster_path, scores_path).await?
            }
            _ => {
                eprintln!(
                    "uso: canasta <puntos_diarios.csv> | canasta <jugadores.csv> <puntuaciones.csv>"
                );
                eprintln!("(o configura [data] en canasta.toml)");
                return Ok(());
            }
        },
        _ => {
            eprintln!(
                "uso: canasta <puntos_diarios.csv> | canasta <jugadores.csv> <puntuaciones.csv>"
            );
            return Ok(());
        }
    };

    if !loaded {
        println!("El archivo CSV no contiene datos de jugadores válidos.");
        return Ok(());
    }

    // 5. Print the table
    print_table(&session);

    // 6. CSV re-export
    if let Some(export_path) = &config.data_paths.export {
        if let Some(csv_text) = session.export().context("failed to render CSV export")? {
            tokio::fs::write(export_path, csv_text)
                .await
                .with_context(|| format!("failed to write export to {export_path}"))?;
            info!("wrote export to {}", export_path);
        }
    }

    // 7. Persist filter state
    tokio::fs::write(&config.data_paths.state, session.filter_blob())
        .await
        .with_context(|| format!("failed to persist state to {}", config.data_paths.state))?;

    Ok(())
}

async fn load_combined(session: &mut Session, path: &str) -> anyhow::Result<bool> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let report = session.load_combined(&text);
    log_report(path, &report);
    Ok(report.dataset_ready)
}

async fn load_split(
    session: &mut Session,
    roster_path: &str,
    scores_path: &str,
) -> anyhow::Result<bool> {
    let roster_text = tokio::fs::read_to_string(roster_path)
        .await
        .with_context(|| format!("failed to read {roster_path}"))?;
    let report = session.load_roster(&roster_text);
    log_report(roster_path, &report);

    let scores_text = tokio::fs::read_to_string(scores_path)
        .await
        .with_context(|| format!("failed to read {scores_path}"))?;
    let report = session.load_scores(&scores_text);
    log_report(scores_path, &report);
    Ok(report.dataset_ready)
}

fn log_report(path: &str, report: &LoadReport) {
    if report.skipped.is_empty() {
        info!(path, accepted = report.accepted, "file loaded");
    } else {
        warn!(
            path,
            accepted = report.accepted,
            skipped = report.skipped.len(),
            "file loaded with dropped rows"
        );
        for skip in &report.skipped {
            warn!(path, line = skip.line, "dropped: {}", skip.reason);
        }
    }
}

fn print_table(session: &Session) {
    let view = session.view();
    let is_split = session
        .dataset()
        .map(|d| d.variant == SchemaVariant::Split)
        .unwrap_or(false);

    println!(
        "{:<18} {:<24} {:<10} {:>8} {:>8} {:>8} {:>16} {:>6}{}",
        "Equipo Fantasy",
        "Nombre",
        "Posición",
        "Partidos",
        "Totales",
        "Promedio",
        "Margen de error",
        "Tend.",
        if is_split { "  Valoración" } else { "" }
    );

    for record in &view {
        let rating = match record.rating() {
            Some(r) if is_split => format!("  {r:>10}"),
            _ => String::new(),
        };
        println!(
            "{:<18} {:<24} {:<10} {:>8} {:>8.2} {:>8.2} {:>16} {:>6}{}",
            record.identity.fantasy_team,
            record.identity.name,
            record.identity.position,
            record.games_played,
            record.total_points,
            record.average_points,
            format!(
                "± {:.2} ({:.1}%)",
                record.margin_of_error_abs, record.margin_of_error_pct
            ),
            record.trend.arrow(),
            rating
        );
    }

    println!();
    println!(
        "PROMEDIO DEL FILTRO: {:.2} pts ({} jugadores)",
        query::view_average(&view),
        view.len()
    );
}

/// Initialize tracing to stderr so stdout stays clean for the table.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canasta=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
