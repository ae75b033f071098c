use std::error;

use bibparse::{Bibliography, Parser, ParserConfig, TYPE_FIELD};

use clap::Parser as CLIParser;
use tracing_subscriber::EnvFilter;

#[cfg(not(feature = "serde_json"))]
#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Filepath to file to parse
    #[clap(short, long)]
    input: String,

    /// Return only entries with this ID
    #[clap(short, long)]
    query_id: Option<String>,

    /// Store field names upper-cased
    #[clap(short, long)]
    upper_keys: bool,
}

#[cfg(feature = "serde_json")]
#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Filepath to file to parse
    #[clap(short, long)]
    input: String,

    /// Return only entries with this ID
    #[clap(short, long)]
    query_id: Option<String>,

    /// Store field names upper-cased
    #[clap(short, long)]
    upper_keys: bool,

    #[clap(long)]
    json: bool,
}

fn read(s: &Settings) -> Result<Bibliography, Box<dyn error::Error>> {
    let config = ParserConfig {
        upper_keys: s.upper_keys,
    };
    let mut bib = Parser::from_file(&s.input)?.with_config(config).parse()?;
    if let Some(query) = &s.query_id {
        bib.entries.retain(|id, _| id == query);
    }
    tracing::info!(
        entries = bib.entries.len(),
        strings = bib.strings.len(),
        input = %s.input,
        "read bib file"
    );
    Ok(bib)
}

fn print_human_readable(bib: &Bibliography) {
    for (id, entry) in bib.entries.iter() {
        println!("type = {}", entry.kind().unwrap_or_default());
        println!("id = {}", id);
        for (name, data) in entry.fields.iter() {
            if name != TYPE_FIELD {
                println!("\t{}\t= {}", name, data);
            }
        }
    }
}

#[cfg(feature = "serde_json")]
fn print_json(bib: &Bibliography) -> Result<(), Box<dyn error::Error>> {
    println!("{}", serde_json::to_string(&bib.entries)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::parse();
    let bib = read(&settings)?;

    #[cfg(feature = "serde_json")]
    {
        if settings.json {
            return print_json(&bib);
        }
    }
    print_human_readable(&bib);

    Ok(())
}
