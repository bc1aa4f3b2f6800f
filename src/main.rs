//! # chatvault CLI
//!
//! Command-line interface for the chatvault library.

use std::path::Path;
use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;

use chatvault::ChatvaultError;
use chatvault::chat::ChatId;
use chatvault::cli::{Args, Command};
use chatvault::config::ImportConfig;
use chatvault::core::library::ChatLibrary;
use chatvault::import::{ImportStatus, TranscriptOutcome, import_file};

fn main() {
    let args = <Args as ClapParser>::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but did not succeed.
fn run(args: &Args) -> Result<bool, ChatvaultError> {
    let mut library = ChatLibrary::load(&args.library)?;

    match &args.command {
        Command::Import {
            archive, media_dir, ..
        } => {
            let config = args.import_config().unwrap_or_default();
            return import(&library, archive, media_dir.as_deref(), &config, &args.library);
        }
        Command::List => list(&library, args.participants),
        Command::Show { .. } => {
            if let Some(query) = args.command.message_query() {
                let (id, query) = query?;
                let page = library.messages_page(&id, &query)?;
                for msg in &page.items {
                    println!("[{}] {}: {}", msg.timestamp, msg.author, msg.content);
                    if let Some(media) = &msg.media {
                        let location = media.url.as_deref().unwrap_or("missing");
                        println!("    📎 {} {} ({})", media.kind, media.name, location);
                    }
                }
                println!();
                println!(
                    "Page {}/{} · {} matching message(s)",
                    page.page,
                    page.total_pages().max(1),
                    page.total
                );
            }
        }
        Command::Delete { ids } => {
            let ids: Vec<ChatId> = ids.iter().map(|id| ChatId::from(id.as_str())).collect();
            let removed = library.remove_many(&ids);
            library.save(&args.library)?;
            println!("🗑️  Deleted {} of {} chat(s)", removed, ids.len());
        }
        Command::Clear => {
            let removed = library.clear();
            library.save(&args.library)?;
            println!("🗑️  Cleared {} chat(s)", removed);
        }
    }

    Ok(true)
}

fn import(
    library: &ChatLibrary,
    archive: &Path,
    media_dir: Option<&Path>,
    config: &ImportConfig,
    library_path: &Path,
) -> Result<bool, ChatvaultError> {
    let start = Instant::now();

    println!("📦 chatvault v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Archive: {}", archive.display());
    println!("📚 Library: {}", library_path.display());
    if let Some(user) = &config.current_user {
        println!("👤 User:    {}", user);
    }
    println!();

    let result = import_file(archive, library, config)?;
    let stats = &result.stats;

    for report in &stats.transcripts {
        match &report.outcome {
            TranscriptOutcome::Added { chat_id, name } => {
                let participants = result
                    .library
                    .get(chat_id)
                    .map(|c| c.display_participants_limited(config.participant_display_limit).join(", "))
                    .unwrap_or_default();
                println!("➕ {} ({} messages) · {}", name, report.messages, participants);
            }
            TranscriptOutcome::Updated { name, added, .. } => {
                println!("🔄 {} (+{} messages)", name, added);
            }
            TranscriptOutcome::Skipped { name, .. } => {
                println!("⏭️  {} (no new messages)", name);
            }
            TranscriptOutcome::Empty => {
                println!("⚪ {} (no messages)", report.entry);
            }
        }
        for warning in &report.warnings {
            println!("   ⚠️  {}", warning);
        }
    }
    for failure in &stats.failures {
        println!("❌ {}: {}", failure.entry, failure.error);
    }

    let mut next = result.library;
    if let Some(dir) = media_dir.filter(|_| !result.media.is_empty()) {
        let links = result.media.persist(dir)?;
        let linked = next.relink_media(&links);
        println!("🖼️  Saved {} attachment(s) to {} ({} linked)", links.len(), dir.display(), linked);
    }

    let status = stats.status();
    if stats.has_changes() {
        next.save(library_path)?;
    }

    println!();
    println!("📊 Summary:");
    println!("   Added:    {} chat(s)", stats.added);
    println!("   Updated:  {} chat(s)", stats.updated);
    println!("   Messages: {} new, {} already stored", stats.messages_added, stats.skipped);
    if !stats.failures.is_empty() {
        println!("   Failed:   {} transcript(s)", stats.failures.len());
    }
    println!("   Time:     {:.2}s", start.elapsed().as_secs_f64());

    Ok(status != ImportStatus::Failed)
}

fn list(library: &ChatLibrary, participant_limit: usize) {
    if library.is_empty() {
        println!("No chats yet. Import an export with `chatvault import <ZIP>`.");
        return;
    }
    for summary in library.summaries_limited(participant_limit) {
        println!(
            "{}  {}  ({} messages) · {}",
            summary.id,
            summary.name,
            summary.message_count,
            summary.participants.join(", ")
        );
    }
}
