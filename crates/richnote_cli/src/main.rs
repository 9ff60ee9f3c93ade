//! Command-line probe over the note store.
//!
//! # Responsibility
//! - Open the store named by `RICHNOTE_*` environment settings, falling back
//!   to an in-memory store when the file is unusable.
//! - Print the note outline, optionally after adding or deleting a note.
//!
//! Usage: `richnote_cli [outline | add <title> [text] | delete <note-id>]`

use log::warn;
use richnote_core::{
    init_from_config, open_note_store, AttributedText, CoreConfig, NoteId, NoteService,
    SqliteNoteRepository, StoreOrigin,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("richnote: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env();
    if let Err(err) = init_from_config(&config) {
        eprintln!("richnote: file logging disabled: {err}");
    }

    let (conn, origin) = open_note_store(&config.db_path)?;
    if origin == StoreOrigin::InMemoryFallback {
        eprintln!(
            "richnote: {} is unreadable; changes in this run will not be saved",
            config.db_path.display()
        );
    }
    let repo = SqliteNoteRepository::try_new(&conn)?;
    let mut service = NoteService::load(repo, config.editor.clone());
    if service.bootstrap_if_empty()? {
        println!("seeded example notes");
    }

    match args.first().map(String::as_str) {
        None | Some("outline") => {}
        Some("add") => {
            let title = args.get(1).ok_or("add requires a title")?;
            let text = args.get(2).map_or("", String::as_str);
            let content = AttributedText::from_plain_text(text, config.editor.default_style);
            let id = service.add_note(title.as_str(), content, None)?;
            println!("added {id}");
        }
        Some("delete") => {
            let id: NoteId = args.get(1).ok_or("delete requires a note id")?.parse()?;
            let removed = service.delete_note(id)?;
            println!("deleted {removed} note(s)");
        }
        Some(other) => {
            warn!("event=cli_command module=cli status=rejected command={other}");
            return Err(format!("unknown command `{other}`").into());
        }
    }

    for summary in service.outline() {
        println!(
            "{}{} [{}] {}",
            "  ".repeat(summary.depth),
            summary.title,
            summary.id,
            summary.preview
        );
    }
    Ok(())
}
