// Command-line front end: one organizer operation per invocation.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use bookmark_organizer_lib::modules::document_store::DocumentStore;
use bookmark_organizer_lib::modules::drag::TabDrop;
use bookmark_organizer_lib::modules::hierarchy::BookmarkPosition;
use bookmark_organizer_lib::modules::icons::DirectoryIcons;
use bookmark_organizer_lib::modules::links::normalize_url;
use bookmark_organizer_lib::modules::save_queue::SaveQueue;
use bookmark_organizer_lib::modules::sort_order::{Pin, Zone};
use bookmark_organizer_lib::modules::storage::{FileStorage, Storage};
use bookmark_organizer_lib::settings::Settings;
use bookmark_organizer_lib::state::{BookmarkDraft, Tab, TabContent};
use bookmark_organizer_lib::{init_logging, Organizer, OrganizerError, Result};

#[derive(Parser)]
#[command(name = "bookmark-organizer", version, about = "Organize bookmarks into tabs and groups")]
struct Cli {
    /// Settings file
    #[arg(long, default_value = "settings.json")]
    config: PathBuf,

    /// Overrides the data directory from the settings file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tabs in display order
    Tabs {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show the groups and bookmarks of a tab
    Show { tab: String },
    AddTab { name: String },
    RenameTab { tab: String, new_name: String },
    DeleteTab { tab: String },
    /// Pin a tab ("top-1", "bottom-2") or unpin it ("none")
    Pin { tab: String, token: String },
    /// Drop a tab into a zone at an index, as a drag would
    MoveTab { tab: String, zone: Zone, index: usize },
    AddGroup { tab: String, name: String },
    RenameGroup { tab: String, group: usize, name: String },
    DeleteGroup { tab: String, group: usize },
    AddBookmark {
        tab: String,
        group: usize,
        name: String,
        url: String,
        #[arg(long)]
        icon: Option<String>,
    },
    EditBookmark {
        tab: String,
        group: usize,
        index: usize,
        name: String,
        url: String,
        #[arg(long)]
        icon: Option<String>,
    },
    DeleteBookmark { tab: String, group: usize, index: usize },
    MoveBookmark {
        tab: String,
        from_group: usize,
        from_index: usize,
        to_group: usize,
        to_index: usize,
    },
    /// List available icons
    Icons,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.config);
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    init_logging(&settings.log_level);

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(settings.data_path()));
    let mut store = DocumentStore::load(storage.clone());
    if settings.queued_saves {
        let (queue, _writer) = SaveQueue::spawn(storage);
        store = store.with_queue(queue);
    }
    let mut organizer = Organizer::new(
        store,
        Box::new(DirectoryIcons::new(&settings.icons_dir)),
        settings.default_icon.clone(),
    );

    let result = run(&mut organizer, cli.command);
    organizer.flush().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(organizer: &mut Organizer, command: Command) -> Result<()> {
    match command {
        Command::Tabs { filter } => {
            let tabs = match filter {
                Some(query) => organizer.filter_tabs(&query),
                None => organizer.ordered_tabs(),
            };
            for tab in tabs {
                let pin = organizer.pin(&tab.name).map(|p| p.to_string()).unwrap_or_default();
                println!("{:<10} {} ({} bookmarks)", pin, tab.name, tab.bookmark_count());
            }
        }
        Command::Show { tab } => print_tab(organizer.select_tab(&tab)?),
        Command::AddTab { name } => print_names(organizer.add_tab(&name)?),
        Command::RenameTab { tab, new_name } => print_names(organizer.rename_tab(&tab, &new_name)?),
        Command::DeleteTab { tab } => print_names(organizer.delete_tab(&tab)?),
        Command::Pin { tab, token } => {
            let pin = match token.as_str() {
                "none" | "" => None,
                other => Some(
                    other
                        .parse::<Pin>()
                        .map_err(|e| OrganizerError::unsupported(e.to_string()))?,
                ),
            };
            print_names(organizer.pin_tab(&tab, pin)?);
        }
        Command::MoveTab { tab, zone, index } => {
            organizer.begin_tab_drag(&tab)?;
            organizer.drop_tab(TabDrop::new(zone, index))?;
            print_names(organizer.ordered_tabs());
        }
        Command::AddGroup { tab, name } => print_tab(organizer.add_group(&tab, &name)?),
        Command::RenameGroup { tab, group, name } => print_tab(organizer.rename_group(&tab, group, &name)?),
        Command::DeleteGroup { tab, group } => print_tab(organizer.delete_group(&tab, group)?),
        Command::AddBookmark { tab, group, name, url, icon } => {
            let draft = draft(name, &url, icon)?;
            print_tab(organizer.add_bookmark(&tab, group, draft)?);
        }
        Command::EditBookmark { tab, group, index, name, url, icon } => {
            let draft = draft(name, &url, icon)?;
            print_tab(organizer.edit_bookmark(&tab, BookmarkPosition::new(group, index), draft)?);
        }
        Command::DeleteBookmark { tab, group, index } => {
            print_tab(organizer.delete_bookmark(&tab, BookmarkPosition::new(group, index))?);
        }
        Command::MoveBookmark { tab, from_group, from_index, to_group, to_index } => {
            let from = BookmarkPosition::new(from_group, from_index);
            let to = BookmarkPosition::new(to_group, to_index);
            print_tab(organizer.move_bookmark(&tab, from, to)?);
        }
        Command::Icons => {
            for icon in organizer.icons() {
                println!("{:<30} {}", icon.display_name, icon.reference);
            }
        }
    }
    Ok(())
}

fn draft(name: String, url: &str, icon: Option<String>) -> Result<BookmarkDraft> {
    let url = normalize_url(url)
        .ok_or_else(|| OrganizerError::unsupported(format!("'{}' is not a usable URL", url)))?;
    let draft = BookmarkDraft::new(name, url);
    Ok(match icon {
        Some(icon) => draft.with_icon(icon),
        None => draft,
    })
}

fn print_names(tabs: Vec<&Tab>) {
    for tab in tabs {
        println!("{}", tab.name);
    }
}

fn print_tab(tab: &Tab) {
    println!("{}", tab.name);
    match &tab.content {
        TabContent::Grouped(groups) => {
            for (g, group) in groups.iter().enumerate() {
                println!("  [{}] {}", g, group.name);
                for (i, bookmark) in group.bookmarks.iter().enumerate() {
                    println!("      {}. {} <{}>", i, bookmark.name, bookmark.url);
                }
            }
        }
        TabContent::Flat(bookmarks) => {
            for (i, bookmark) in bookmarks.iter().enumerate() {
                println!("  {}. {} <{}>", i, bookmark.name, bookmark.url);
            }
        }
    }
}
