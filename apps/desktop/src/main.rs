use std::{
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    Composer, HttpBackend, RequestEnd, WikiResultsView, DEFAULT_GENERATION_TIMEOUT,
    DEFAULT_SEARCH_TIMEOUT, DEFAULT_SERVER_URL,
};
use shared::domain::{EduType, Mode, Style, Volume};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Generate study texts from the command line")]
struct Cli {
    #[arg(long, env = "AUTOCONSPECT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    #[arg(long, default_value_t = DEFAULT_GENERATION_TIMEOUT.as_secs())]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available modes.
    Modes,
    /// Show whether the server has a Gemini key configured.
    Status,
    /// Search Wikipedia articles.
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "ru")]
        lang: String,
    },
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value = "referat")]
    mode: Mode,
    #[arg(long)]
    topic: String,
    #[arg(long, default_value = "medium")]
    volume: Volume,
    #[arg(long, default_value = "scientific")]
    style: Style,
    /// Use Wikipedia articles as source material.
    #[arg(long)]
    wiki: bool,
    /// Article to use; repeat up to five times. Implies --wiki.
    #[arg(long = "wiki-title")]
    wiki_titles: Vec<String>,
    #[arg(long, default_value = "ru")]
    lang: String,
    #[arg(long)]
    author_name: Option<String>,
    /// Author is a school pupil rather than a student.
    #[arg(long)]
    pupil: bool,
    #[arg(long, default_value = "1")]
    grade: String,
    #[arg(long)]
    institution: Option<String>,
    #[arg(long)]
    group: Option<String>,
    #[arg(long)]
    teacher: Option<String>,
    #[arg(long)]
    include_title: bool,
    /// Directory to save the result into.
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Modes => {
            for mode in Mode::ALL {
                let descriptor = mode.descriptor();
                println!(
                    "{:<9} {}  ({})",
                    mode.key(),
                    descriptor.menu_label,
                    descriptor.subtitle
                );
            }
        }
        Command::Status => {
            let backend = HttpBackend::new(&cli.server_url)?;
            let status = backend.status().await?;
            println!(
                "api_ready={} model={} key_exists={} key_length={}",
                status.api_ready, status.model, status.key_exists, status.key_length
            );
        }
        Command::Search { query, lang } => {
            let mut composer = composer(&cli.server_url, cli.timeout_secs)?;
            composer.state_mut().wiki_query = query;
            composer.state_mut().wiki_lang = lang;
            if composer.search_until(interrupted()).await? == RequestEnd::Cancelled {
                bail!("search cancelled");
            }
            println!("{}", composer.state().wiki_status().text());
            match composer.state().wiki_results() {
                WikiResultsView::Cards(cards) => {
                    for card in cards {
                        match card.wordcount {
                            Some(words) => println!("- {} ({words} слов): {}", card.title, card.description),
                            None => println!("- {}: {}", card.title, card.description),
                        }
                    }
                }
                WikiResultsView::NoResults(hint) => println!("{hint}"),
                WikiResultsView::Error(message) => bail!(message),
                WikiResultsView::Empty | WikiResultsView::Loading(_) => {}
            }
        }
        Command::Generate(args) => {
            let mut composer = composer(&cli.server_url, cli.timeout_secs)?;
            apply_generate_args(&mut composer, &args);
            run_generation(&mut composer, args.save_dir.as_deref()).await?;
        }
    }

    Ok(())
}

fn composer(server_url: &str, timeout_secs: u64) -> Result<Composer<HttpBackend>> {
    let backend = HttpBackend::new(server_url)?;
    Ok(Composer::new(backend)
        .with_timeouts(DEFAULT_SEARCH_TIMEOUT, Duration::from_secs(timeout_secs)))
}

fn apply_generate_args(composer: &mut Composer<HttpBackend>, args: &GenerateArgs) {
    let state = composer.state_mut();
    state.select_mode(args.mode);
    state.topic = args.topic.clone();
    state.volume = args.volume;
    state.style = args.style;

    let author = &mut state.author;
    author.name = args.author_name.clone().unwrap_or_default();
    author.edu_type = if args.pupil {
        EduType::Pupil
    } else {
        EduType::Student
    };
    author.grade = args.grade.clone();
    author.institution = args.institution.clone().unwrap_or_default();
    author.group = args.group.clone().unwrap_or_default();
    author.teacher = args.teacher.clone().unwrap_or_default();
    author.include_title = args.include_title;

    state.set_use_wikipedia(args.wiki || !args.wiki_titles.is_empty());
    state.wiki_lang = args.lang.clone();
    for title in &args.wiki_titles {
        if !state.toggle_selection(title.trim()) {
            warn!(%title, "selection is full, title skipped");
        }
    }
}

async fn run_generation(
    composer: &mut Composer<HttpBackend>,
    save_dir: Option<&std::path::Path>,
) -> Result<()> {
    let mut captions = composer.subscribe_captions();
    let progress = tokio::spawn(async move {
        while captions.changed().await.is_ok() {
            if let Some(caption) = captions.borrow_and_update().clone() {
                info!(%caption, "waiting for server");
            }
        }
    });

    let end = composer.generate_until(interrupted()).await?;
    progress.abort();
    if end == RequestEnd::Cancelled {
        bail!("generation cancelled");
    }

    let state = composer.state();
    println!("{}", state.result_text());
    if !state.stats_text().is_empty() {
        println!();
        println!("{}", state.stats_text());
    }

    if let Some(dir) = save_dir {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let file = state.download(millis)?;
        let path = file.write_into(dir)?;
        println!("saved to {}", path.display());
    }
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves when the signal cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_args_fill_the_form() {
        let cli = Cli::parse_from([
            "desktop",
            "generate",
            "--mode",
            "essay",
            "--topic",
            "Дружба",
            "--style",
            "simple",
            "--wiki-title",
            "Дружба",
            "--pupil",
            "--include-title",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let mut composer = composer(DEFAULT_SERVER_URL, 30).expect("composer");
        apply_generate_args(&mut composer, &args);

        let state = composer.state();
        assert_eq!(state.mode(), Mode::Essay);
        assert_eq!(state.style, Style::Simple);
        assert_eq!(state.volume, Volume::Medium);
        assert!(state.use_wikipedia());
        assert_eq!(state.selected_titles(), ["Дружба".to_string()]);
        assert_eq!(state.author.edu_type, EduType::Pupil);
        assert!(state.author.include_title);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let parsed = Cli::try_parse_from(["desktop", "generate", "--mode", "poem", "--topic", "x"]);
        assert!(parsed.is_err());
    }
}
