use std::cmp;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use study_search::{
    DEFAULT_THRESHOLD, Ranked, ResourceType, SearchConfig, expand_query, extract_keywords,
    find_matches, rank, rank_suggestions, sanitize_text, search, similarity, suggestion_score,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "study-search",
    about = "Fuzzy matching, ranking and title suggestions for study resources",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalized edit-distance similarity of two strings.
    Similarity { a: String, b: String },
    /// Filter candidate strings down to those that fuzzy-match a query.
    Match {
        query: String,
        /// Candidate strings, kept in the order given.
        #[arg(required = true)]
        items: Vec<String>,
        /// Minimum similarity for a non-substring match.
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },
    /// Show the keywords extracted from a piece of text.
    Keywords { text: String },
    /// Expand subject abbreviations in a query.
    Expand { query: String },
    /// Score and sort resource records (a JSON array) against a query.
    Rank {
        query: String,
        #[command(flatten)]
        records: RecordArgs,
    },
    /// Filter resource records to plausible hits, then rank them.
    Search {
        query: String,
        #[command(flatten)]
        records: RecordArgs,
    },
    /// Suggest titles for a new upload.
    Suggest {
        input: String,
        /// Resource type for the canned titles.
        #[arg(short = 't', long = "type")]
        resource_type: Option<ResourceType>,
    },
    /// Score how well a suggestion fits the typed input (0-100).
    SuggestionScore { suggestion: String, input: String },
    /// Check user-entered text for blocked language.
    Moderate { text: String },
    /// Serve the JSON API over HTTP.
    #[cfg(all(feature = "cli", feature = "web"))]
    Serve {
        /// Socket address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
    },
}

#[derive(clap::Args, Debug)]
struct RecordArgs {
    /// JSON file holding an array of records; reads stdin when omitted.
    #[arg(short, long)]
    records: Option<PathBuf>,
    /// Maximum number of records to print.
    #[arg(short, long, default_value_t = SearchConfig::default().limit)]
    limit: usize,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Similarity { a, b } => handle_similarity(a, b, cli.json),
        Command::Match {
            query,
            items,
            threshold,
        } => handle_match(query, items, threshold, cli.json),
        Command::Keywords { text } => handle_keywords(text, cli.json),
        Command::Expand { query } => handle_expand(query, cli.json),
        Command::Rank { query, records } => handle_records(query, records, false, cli.json),
        Command::Search { query, records } => handle_records(query, records, true, cli.json),
        Command::Suggest {
            input,
            resource_type,
        } => handle_suggest(input, resource_type, cli.json),
        Command::SuggestionScore { suggestion, input } => {
            handle_suggestion_score(suggestion, input, cli.json)
        }
        Command::Moderate { text } => handle_moderate(text, cli.json),
        #[cfg(all(feature = "cli", feature = "web"))]
        Command::Serve { addr } => handle_serve(addr),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_similarity(a: String, b: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    let value = similarity(&a, &b);
    if as_json {
        let payload = json!({ "a": a, "b": b, "similarity": value });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{value:.4}");
    }
    Ok(())
}

fn handle_match(
    query: String,
    items: Vec<String>,
    threshold: f64,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let config = SearchConfig {
        threshold,
        ..SearchConfig::default()
    }
    .normalized();
    let matches = find_matches(&query, &items, config.threshold);

    if as_json {
        let payload = json!({
            "query": query,
            "threshold": config.threshold,
            "matches": matches,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if matches.is_empty() {
        println!("No items matched \"{query}\".");
    } else {
        println!("Matches for \"{query}\":");
        for item in matches {
            println!("  {item}");
        }
    }
    Ok(())
}

fn handle_keywords(text: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    let keywords = extract_keywords(&text);
    if as_json {
        let payload = json!({ "text": text, "keywords": keywords });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if keywords.is_empty() {
        println!("No keywords in \"{text}\".");
    } else {
        println!("{}", keywords.join(", "));
    }
    Ok(())
}

fn handle_expand(query: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    let expanded = expand_query(&query);
    if as_json {
        let payload = json!({ "query": query, "expanded": expanded });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{expanded}");
    }
    Ok(())
}

fn handle_records(
    query: String,
    args: RecordArgs,
    filter: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let records = read_records(args.records.as_ref())?;
    let limit = cmp::max(1, args.limit);
    let mut hits = if filter {
        search(&query, &records)
    } else {
        rank(&query, &records)
    };
    debug!(total = hits.len(), limit, "ranked records");
    hits.truncate(limit);

    if as_json {
        let payload = json!({
            "query": query,
            "mode": if filter { "search" } else { "rank" },
            "limit": limit,
            "results": hits,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_ranked_table(&query, &hits);
    }
    Ok(())
}

fn read_records(path: Option<&PathBuf>) -> Result<Vec<Value>, Box<dyn Error>> {
    let records: Value = match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| format!("Failed to open {}: {err}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))?
        }
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            serde_json::from_str(&buffer)?
        }
    };
    match records {
        Value::Array(rows) => Ok(rows),
        other => Err(format!("Expected a JSON array of records, found {}", kind_of(&other)).into()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn handle_suggest(
    input: String,
    resource_type: Option<ResourceType>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let ranked = rank_suggestions(&input, resource_type);

    if as_json {
        let payload = json!({
            "input": input,
            "type": resource_type,
            "suggestions": ranked.iter().map(|(suggestion, score)| {
                json!({ "suggestion": suggestion, "score": score })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_suggestion_table(&input, &ranked);
    }
    Ok(())
}

fn handle_suggestion_score(
    suggestion: String,
    input: String,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let score = suggestion_score(&suggestion, &input);
    if as_json {
        let payload = json!({ "suggestion": suggestion, "input": input, "score": score });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{score:.1}");
    }
    Ok(())
}

fn handle_moderate(text: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    let sanitized = sanitize_text(&text)?;
    if as_json {
        let payload = json!({ "text": text, "sanitized": sanitized, "ok": true });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("ok: {sanitized}");
    }
    Ok(())
}

#[cfg(all(feature = "cli", feature = "web"))]
fn handle_serve(addr: std::net::SocketAddr) -> Result<(), Box<dyn Error>> {
    let config = study_search::web::WebConfig {
        addr,
        ..Default::default()
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(study_search::web::serve(config))?;
    Ok(())
}

fn record_title(record: &Value) -> &str {
    record
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("<untitled>")
}

/// Width in chars of a left-aligned column; `{:<width$}` pads by chars too.
fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(|cell| cell.chars().count())
        .fold(header.chars().count(), cmp::max)
}

fn print_ranked_table(query: &str, rows: &[Ranked<'_, Value>]) {
    if rows.is_empty() {
        println!("No records matched \"{query}\".");
        return;
    }
    let width = column_width("TITLE", rows.iter().map(|row| record_title(row.record)));
    println!("Results for \"{query}\":");
    println!("{:<width$}  {:>5}  {}", "TITLE", "INDEX", "SCORE", width = width);
    println!("{:-<width$}  {:->5}  {}", "", "", "-------", width = width);
    for row in rows {
        println!(
            "{:<width$}  {:>5}  {:.3}",
            record_title(row.record),
            row.index,
            row.score,
            width = width
        );
    }
}

fn print_suggestion_table(input: &str, rows: &[(String, f64)]) {
    if rows.is_empty() {
        println!("No suggestions for \"{input}\".");
        return;
    }
    let width = column_width("SUGGESTION", rows.iter().map(|(suggestion, _)| suggestion.as_str()));
    println!("Suggestions for \"{input}\":");
    println!("{:<width$}  {}", "SUGGESTION", "SCORE", width = width);
    println!("{:-<width$}  {}", "", "-----", width = width);
    for (suggestion, score) in rows {
        println!("{:<width$}  {:.1}", suggestion, score, width = width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_width_counts_chars() {
        assert_eq!(column_width("TITLE", ["Über Notes"].into_iter()), 10);
        assert_eq!(column_width("TITLE", ["Économie – Révision"].into_iter()), 19);
        assert_eq!(column_width("SUGGESTION", std::iter::empty()), 10);
        assert_eq!(column_width("TITLE", ["Cell"].into_iter()), 5);
    }
}
