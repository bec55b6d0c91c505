use std::cmp;
use std::error::Error;

use atty::Stream;
use clap::{Parser, Subcommand};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tokima_site::dict::{
    DEFAULT_LANGUAGE, DEFAULT_WORDS_URL, DictStore, HttpSource, ResolvedWordList, WordDef,
};

#[derive(Parser, Debug)]
#[command(name = "tokima-site", about = "Explore the toki ma dictionary", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Dictionary dataset URL.
    #[arg(long, global = true, default_value = DEFAULT_WORDS_URL)]
    url: String,

    /// Definition language; falls back to English when unavailable.
    #[arg(long, global = true, default_value = DEFAULT_LANGUAGE)]
    lang: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Operations related to dictionary words.
    #[command(subcommand)]
    Word(WordCommand),
    /// List the languages the dataset carries definitions for.
    Languages,
    /// Run the documentation and dictionary web server.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind the HTTP listener to.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL used in canonical links.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base_url: String,
    },
}

#[derive(Subcommand, Debug)]
enum WordCommand {
    /// Look up the short gloss for exact word matches.
    Get {
        /// One or more toki ma words to look up.
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Search words and definitions in both directions.
    Search {
        /// toki ma word or definition text to search for.
        query: String,
        /// Match whole words instead of substrings.
        #[arg(long)]
        exact: bool,
        /// Maximum number of matches to return.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the full entry for a word.
    Show {
        /// Word to display.
        word: String,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let Cli {
        json,
        url,
        lang,
        command,
    } = cli;
    match command {
        #[cfg(feature = "web")]
        Command::Serve { addr, base_url } => {
            use tracing_subscriber::EnvFilter;
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("tokima_site=info,tower_http=info")),
                )
                .init();
            let config = tokima_site::web::WebConfig {
                addr,
                words_url: url,
                base_url,
            };
            tokima_site::web::serve(config).await.map_err(Into::into)
        }
        command => {
            let store = DictStore::new(HttpSource::new(url));
            match command {
                Command::Word(WordCommand::Get { words }) => {
                    handle_get(&store, &lang, words, json).await
                }
                Command::Word(WordCommand::Search {
                    query,
                    exact,
                    limit,
                }) => handle_search(&store, &lang, query, exact, limit, json).await,
                Command::Word(WordCommand::Show { word }) => {
                    handle_show(&store, &lang, word, json).await
                }
                Command::Languages => handle_languages(&store, json).await,
                #[cfg(feature = "web")]
                Command::Serve { .. } => unreachable!("handled above"),
            }
        }
    }
}

async fn handle_get(
    store: &DictStore<HttpSource>,
    lang: &str,
    words: Vec<String>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let resolved = store.word_list(lang).await?;
    let results: Vec<(String, Option<WordDef>)> = words
        .into_iter()
        .map(|word| {
            let def = resolved.list.lookup(&word).cloned();
            (word, def)
        })
        .collect();

    if as_json {
        let payload: Vec<_> = results
            .iter()
            .map(|(word, def)| json!({ "word": word, "entry": def }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_fallback_notice(&resolved);
        print_lookup_table(&results);
    }
    Ok(())
}

async fn handle_search(
    store: &DictStore<HttpSource>,
    lang: &str,
    query: String,
    exact: bool,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if query.trim().is_empty() {
        return Err("Search query cannot be empty".into());
    }
    let limit = cmp::max(1, limit);
    let resolved = store.word_list(lang).await?;
    let matches: Vec<&WordDef> = resolved
        .list
        .search(query.trim(), exact)
        .into_iter()
        .take(limit)
        .collect();

    if as_json {
        let payload = json!({
            "query": query,
            "exact": exact,
            "limit": limit,
            "requested": resolved.requested,
            "resolved": resolved.resolved,
            "results": matches,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_fallback_notice(&resolved);
        print_search_table(&query, &matches);
    }
    Ok(())
}

async fn handle_show(
    store: &DictStore<HttpSource>,
    lang: &str,
    word: String,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let resolved = store.word_list(lang).await?;
    let def = resolved
        .list
        .lookup(&word)
        .ok_or_else(|| format!("No entry found for word {word:?}"))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(def)?);
    } else {
        print_fallback_notice(&resolved);
        print_entry(&resolved, def);
    }
    Ok(())
}

async fn handle_languages(
    store: &DictStore<HttpSource>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let languages = store.languages().await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&languages)?);
    } else {
        for language in languages {
            println!("{language}");
        }
    }
    Ok(())
}

fn print_fallback_notice(resolved: &ResolvedWordList) {
    if resolved.fell_back() {
        eprintln!(
            "note: no word list for {:?}; showing {} definitions",
            resolved.requested, resolved.resolved
        );
    }
}

fn print_lookup_table(rows: &[(String, Option<WordDef>)]) {
    if rows.is_empty() {
        println!("No words provided.");
        return;
    }
    let width = rows
        .iter()
        .map(|(word, _)| word.len())
        .max()
        .unwrap_or(4)
        .max("WORD".len());
    println!("{:<width$}  {}", "WORD", "GLOSS", width = width);
    println!("{:-<width$}  {}", "", "-----", width = width);
    for (word, def) in rows {
        let gloss = def
            .as_ref()
            .map(|d| d.short.clone())
            .unwrap_or_else(|| "<missing>".to_string());
        println!("{:<width$}  {}", word, gloss, width = width);
    }
}

fn print_search_table(query: &str, rows: &[&WordDef]) {
    if rows.is_empty() {
        println!("No entries matched \"{query}\".");
        return;
    }
    let width = rows
        .iter()
        .map(|def| def.word.len())
        .max()
        .unwrap_or(query.len())
        .max("WORD".len());
    println!("Matches for \"{query}\":");
    println!("{:<width$}  {}", "WORD", "GLOSS", width = width);
    println!("{:-<width$}  {}", "", "-----", width = width);
    for def in rows {
        println!("{:<width$}  {}", def.word, def.short, width = width);
    }
}

fn print_entry(resolved: &ResolvedWordList, def: &WordDef) {
    println!("Word: {} {}", def.emoji, def.word);
    println!("Base: {}", def.base);
    if !def.etymology.is_empty() {
        println!("Etymology: {}", def.etymology);
    }
    println!("Gloss: {}", def.short);

    let mut body = String::new();
    for (pos, text) in def.definitions() {
        body.push_str(&format!("- **{}**: {}\n", resolved.list.label_for(pos), text));
    }
    render_markdown_block("Definitions", &body);
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn markdown_skin() -> MadSkin {
    MadSkin::default()
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = markdown_skin();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
