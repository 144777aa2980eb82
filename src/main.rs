use std::rc::{Rc, Weak};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use iterkit::{
    aggregate, Aggregate, ArrayIterator, Identity, IterableConfig, Iterables, Key, Mapping,
    Source, Structure,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "iterkit", about = "Inspect how heterogeneous iterables are resolved, counted and mapped")]
struct Cli {
    /// Log resolution and counting decisions.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count entries, reporting the strategy used.
    Count {
        /// Entries as `key=value` or bare values (positional keys).
        entries: Vec<String>,
        /// Wrap the source in this many aggregates.
        #[arg(long, default_value_t = 0)]
        nest: usize,
        /// Present the entries as a non-countable iterator.
        #[arg(long)]
        lazy: bool,
    },
    /// Map a window of entries to `key-value`.
    Map {
        /// Entries as `key=value` or bare values (positional keys).
        entries: Vec<String>,
        /// First position inside the window.
        #[arg(long, default_value = "0")]
        start: String,
        /// Window size; 0 maps to the end.
        #[arg(long, default_value = "0")]
        count: String,
        /// Wrap the source in this many aggregates.
        #[arg(long, default_value_t = 0)]
        nest: usize,
        /// Present the entries as a non-countable iterator.
        #[arg(long)]
        lazy: bool,
    },
    /// Resolve a chain of aggregates down to an iterator.
    Resolve {
        /// Number of aggregates around the iterator.
        #[arg(long, default_value_t = 3)]
        nest: usize,
        /// Depth limit for the resolution.
        #[arg(long, default_value = "100")]
        limit: String,
        /// Use an aggregate that yields itself.
        #[arg(long)]
        cyclic: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let kit = Iterables::new(IterableConfig::default());

    match cli.command {
        Commands::Count { entries, nest, lazy } => run_count(&kit, &entries, nest, lazy)?,
        Commands::Map {
            entries,
            start,
            count,
            nest,
            lazy,
        } => run_map(&kit, &entries, &start, &count, nest, lazy)?,
        Commands::Resolve {
            nest,
            limit,
            cyclic,
        } => run_resolve(&kit, nest, &limit, cyclic)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_count(kit: &Iterables, entries: &[String], nest: usize, lazy: bool) -> Result<()> {
    let structure = parse_entries(entries)?;
    let mut source = build_source(structure, nest, lazy);
    let tally = kit
        .counter()
        .tally(&mut source)
        .context("counting failed")?;
    println!("count={}\tstrategy={:?}", tally.count, tally.strategy);
    Ok(())
}

fn run_map(
    kit: &Iterables,
    entries: &[String],
    start: &str,
    count: &str,
    nest: usize,
    lazy: bool,
) -> Result<()> {
    let structure = parse_entries(entries)?;
    let source = build_source(structure, nest, lazy);
    let mut out = Mapping::new();
    kit.map_iterable(
        source,
        |value: String, key, _| Ok(format!("{key}-{value}")),
        start,
        count,
        &mut out,
    )
    .with_context(|| format!("mapping window start={start} count={count} failed"))?;

    if out.is_empty() {
        println!("No entries inside the window.");
    }
    for (key, value) in out.iter() {
        println!("{key}\t{value}");
    }
    Ok(())
}

fn run_resolve(kit: &Iterables, nest: usize, limit: &str, cyclic: bool) -> Result<()> {
    let source = if cyclic {
        Source::Aggregate(SelfAggregate::new())
    } else {
        build_source(Structure::from_values(["leaf".to_string()]), nest, true)
    };
    let outer = source.subject();
    let resolved = kit
        .resolve(source, iterkit::IsIterator, limit)
        .with_context(|| format!("resolving {outer} with limit {limit} failed"))?;
    println!("resolved {outer} to {}", resolved.subject());
    Ok(())
}

/// Parse `key=value` or bare values; bare values take the next free index.
fn parse_entries(raw: &[String]) -> Result<Structure<String>> {
    let mut structure = Structure::new();
    for (position, entry) in raw.iter().enumerate() {
        match entry.split_once('=') {
            Some(("", _)) => bail!("empty key in entry {} ({entry:?})", position + 1),
            Some((key, value)) => {
                let key = match key.parse::<i64>() {
                    Ok(index) => Key::Index(index),
                    Err(_) => Key::from(key),
                };
                structure.insert(key, value.to_string());
            }
            None => {
                structure.push(entry.clone())?;
            }
        }
    }
    Ok(structure)
}

fn build_source(structure: Structure<String>, nest: usize, lazy: bool) -> Source<String> {
    let leaf = move || {
        let entries = structure.clone().into_entries();
        if lazy {
            Source::lazy(entries.into_iter())
        } else {
            Source::iterator(ArrayIterator::new(entries))
        }
    };
    if nest == 0 {
        return leaf();
    }
    nested(Rc::new(leaf), nest)
}

fn nested(leaf: Rc<dyn Fn() -> Source<String>>, depth: usize) -> Source<String> {
    if depth == 0 {
        return leaf();
    }
    aggregate(move || nested(Rc::clone(&leaf), depth - 1))
}

/// Aggregate whose inner source is itself.
struct SelfAggregate {
    identity: Identity,
    me: Weak<SelfAggregate>,
}

impl SelfAggregate {
    fn new() -> Rc<Self> {
        Rc::new_cyclic(|me| SelfAggregate {
            identity: Identity::fresh(),
            me: me.clone(),
        })
    }
}

impl Aggregate<String> for SelfAggregate {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn inner(&self) -> Source<String> {
        match self.me.upgrade() {
            Some(me) => Source::Aggregate(me),
            None => Source::from(Structure::new()),
        }
    }
}
