// Pool tracker entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, filtered by RUST_LOG)
// 2. Load config (copying defaults on first run)
// 3. Open the local pick store
// 4. Build the remote sync adapter from credentials
// 5. Load the season schedule and participant roster
// 6. Dispatch the requested command

use confidence_pool::app::PoolApp;
use confidence_pool::config;
use confidence_pool::data;
use confidence_pool::picks::store::PickStore;
use confidence_pool::scoring::season::CumulativeScore;
use confidence_pool::scoring::week::ScoreResult;
use confidence_pool::sync::RemoteSync;

use anyhow::{bail, Context};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: pool={}, year {}, {} weeks",
        config.pool.name, config.pool.year, config.pool.weeks
    );

    let store = PickStore::open(&config.db_path).context("failed to open pick store")?;
    info!("Pick store opened at {}", config.db_path);

    let remote = RemoteSync::from_config(&config);
    if remote.is_configured() {
        info!("Remote sync enabled (GitHub credentials configured)");
    } else {
        info!("Remote sync disabled; running local-only");
    }

    let schedule = data::load_schedule(&config.data_paths.schedule)
        .context("failed to load season schedule")?;
    let participants = data::load_participants(&config.data_paths.participants);
    info!(
        "Loaded {} scheduled weeks, {} participants",
        schedule.weeks.len(),
        participants.len()
    );

    let app = PoolApp::new(config, store, remote, schedule);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["leaderboard"] => {
            let through = app.schedule().last_week();
            print_leaderboard(&app.leaderboard(&participants, through).await, through);
        }
        ["leaderboard", week] => {
            let week = parse_week(week)?;
            print_scoreboard(&app.scoreboard(&participants, week).await, week);
        }
        ["score", user, week] => {
            let week = parse_week(week)?;
            print_score(&app.score_week(user, week).await);
        }
        ["picks", user, week] => {
            let week = parse_week(week)?;
            let picks = app.load_picks(user, week).await;
            print_picks(user, week, &picks);
            for warning in app.validate_week(&picks, week) {
                println!("warning: {warning}");
            }
        }
        ["save-winners", week, file] => {
            let week = parse_week(week)?;
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read winners file {file}"))?;
            let winners = data::parse_winners(&text);
            if winners.is_empty() {
                bail!("winners file {file} contained no winners");
            }
            let outcome = app.save_winners(week, &winners).await;
            println!(
                "Winners for week {week} ({} games): {}",
                winners.len(),
                outcome.describe()
            );
        }
        _ => {
            print_usage();
        }
    }

    Ok(())
}

fn parse_week(raw: &str) -> anyhow::Result<u32> {
    let week: u32 = raw
        .parse()
        .with_context(|| format!("invalid week number: {raw}"))?;
    if week == 0 {
        bail!("week numbers start at 1");
    }
    Ok(week)
}

fn print_usage() {
    println!("Usage: poolbowl <command>");
    println!();
    println!("Commands:");
    println!("  leaderboard            season standings through the latest week");
    println!("  leaderboard <week>     one week's scoreboard");
    println!("  score <user> <week>    a user's graded picks for a week");
    println!("  picks <user> <week>    a user's current picks for a week");
    println!("  save-winners <week> <file>   publish official winners from a JSON file");
}

fn print_leaderboard(standings: &[CumulativeScore], through_week: u32) {
    println!("Standings through week {through_week}");
    println!("{:>4}  {:<20} {:>6} {:>9} {:>9}", "#", "Name", "Score", "Correct", "Accuracy");
    for (i, entry) in standings.iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:>6} {:>4}/{:<4} {:>8.2}%",
            i + 1,
            entry.user_name,
            entry.total_score,
            entry.total_correct,
            entry.total_picks,
            entry.overall_accuracy
        );
    }
}

fn print_scoreboard(rows: &[confidence_pool::app::ScoreboardRow], week: u32) {
    println!("Week {week} scoreboard");
    println!("{:<20} {:>6} {:>7}", "Name", "Week", "Season");
    for row in rows {
        println!(
            "{:<20} {:>6} {:>7}",
            row.user_name, row.week_score, row.total_score
        );
    }
}

fn print_score(result: &ScoreResult) {
    println!(
        "{} — week {} ({}): {}",
        result.user_name, result.week, result.year, result.message
    );
    for detail in &result.details {
        let mark = if detail.correct { "+" } else { " " };
        println!(
            " {mark} {:<24} picked {:<16} ({:>2}) -> {} pts  [{}]",
            detail.matchup,
            detail.picked_team,
            detail.confidence,
            detail.points,
            detail.official_winner.as_deref().unwrap_or("TBD")
        );
    }
    if result.total_picks > 0 {
        println!(
            "   {}/{} correct, {:.2}% accuracy",
            result.correct_picks, result.total_picks, result.accuracy
        );
    }
}

fn print_picks(user: &str, week: u32, picks: &confidence_pool::picks::record::PickSet) {
    if picks.is_empty() {
        println!("No picks saved for {user} in week {week}");
        return;
    }
    println!("{user}'s picks for week {week}:");
    let mut entries: Vec<_> = picks.iter().collect();
    entries.sort_by(|a, b| b.1.confidence.cmp(&a.1.confidence));
    for (game_id, pick) in entries {
        println!("  {:<8} {:<16} confidence {}", game_id, pick.team, pick.confidence);
    }
}

/// Initialize tracing to stderr so command output on stdout stays clean.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("confidence_pool=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
