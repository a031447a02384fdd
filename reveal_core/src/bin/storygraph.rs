//! storygraph - inspect what a reader knows at any point of a work

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use book_model::{NodeRef, WorkDataset};
use reveal_core::{GraphModelBuilder, Hierarchy, RevealConfig, VisibilityFilter};

#[derive(Parser)]
#[command(name = "storygraph")]
#[command(version, about = "Progressive-disclosure character graph", long_about = None)]
#[command(after_help = "EXAMPLES:
    storygraph lotr.json tree                  Show the hierarchy
    storygraph lotr.json visible --at 12       Who is known at global index 12
    storygraph lotr.json graph --at chapter:3  Graph description after chapter 3")]
struct Cli {
    /// Dataset file (.json or .toml)
    #[arg(value_name = "DATASET")]
    dataset: PathBuf,

    /// Settings file
    #[arg(short, long, env = "STORYGRAPH_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for initial node placement
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the hierarchy with global indices and any issues
    Tree,
    /// List characters, factions and relationships visible at a position
    Visible {
        /// Global index, `chapter:N` or node id
        #[arg(long, value_parser = parse_ref)]
        at: NodeRef,
    },
    /// Print the graph description at a position as JSON
    Graph {
        /// Global index, `chapter:N` or node id
        #[arg(long, value_parser = parse_ref)]
        at: NodeRef,
    },
}

fn parse_ref(s: &str) -> Result<NodeRef, String> {
    if let Ok(index) = s.parse::<u32>() {
        return Ok(NodeRef::index(index));
    }
    match s.strip_prefix("chapter:") {
        Some(n) => n
            .parse::<u32>()
            .map(NodeRef::chapter)
            .map_err(|e| format!("invalid chapter number {n:?}: {e}")),
        None if s.is_empty() => Err("empty node reference".to_string()),
        None => Ok(NodeRef::id(s)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storygraph=info,reveal_core=info,book_model=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RevealConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => RevealConfig::default(),
    };
    let dataset = WorkDataset::load(&cli.dataset)
        .with_context(|| format!("loading dataset {}", cli.dataset.display()))?;
    let hierarchy = Hierarchy::from_dataset(&dataset);
    tracing::info!(
        work = %dataset.id(),
        nodes = hierarchy.len(),
        characters = dataset.characters().len(),
        "loaded work"
    );

    match cli.command {
        Command::Tree => print_tree(&dataset, &hierarchy),
        Command::Visible { at } => {
            let visible = VisibilityFilter::new(config.visibility).filter(&dataset, &hierarchy, &at);
            let Some(position) = visible.position else {
                println!("{} has no structural nodes", dataset.book().title);
                return Ok(());
            };
            println!(
                "At {} (#{}):",
                hierarchy.display_path(position.node),
                position.global_index
            );
            println!("Characters: {}", visible.characters.len());
            for character in &visible.characters {
                let factions: Vec<&str> = visible
                    .active_factions(&character.id)
                    .iter()
                    .map(|f| f.as_str())
                    .collect();
                if factions.is_empty() {
                    println!("  {} ({})", character.name, character.id);
                } else {
                    println!("  {} ({}) [{}]", character.name, character.id, factions.join(", "));
                }
            }
            println!("Factions: {}", visible.factions.len());
            for faction in &visible.factions {
                println!("  {} ({})", faction.title, faction.color);
            }
            if !visible.locations.is_empty() {
                let names: Vec<&str> = visible.locations.iter().map(|l| l.name()).collect();
                println!("Locations: {}", names.join(", "));
            }
            println!("Relationships: {}", visible.relationships.len());
            for relationship in &visible.relationships {
                let (a, b) = relationship.relationship.pair();
                match relationship.headline() {
                    Some(text) => println!("  {a} - {b}: {text}"),
                    None => println!("  {a} - {b}"),
                }
            }
        }
        Command::Graph { at } => {
            let visible = VisibilityFilter::new(config.visibility).filter(&dataset, &hierarchy, &at);
            let graph = GraphModelBuilder::new(config.graph).build_seeded(&visible, None, cli.seed);
            let locations: Vec<_> = visible.locations.iter().map(|l| l.to_location()).collect();
            let output = json!({
                "position": visible.position,
                "locations": locations,
                "graph": graph,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_tree(dataset: &WorkDataset, hierarchy: &Hierarchy) {
    println!("{} ({} nodes)", dataset.book().title, hierarchy.len());
    for (idx, node) in hierarchy.iter() {
        let depth = hierarchy.ancestors(idx).len();
        println!(
            "{:>4}  {}{} [{}]",
            node.global_index,
            "  ".repeat(depth),
            node.title,
            node.kind
        );
    }
    if !hierarchy.issues().is_empty() {
        println!("Issues:");
        for issue in hierarchy.issues() {
            println!("  {issue:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ref() {
        assert_eq!(parse_ref("12").unwrap(), NodeRef::index(12));
        assert_eq!(parse_ref("chapter:3").unwrap(), NodeRef::chapter(3));
        assert_eq!(parse_ref("chapter-3").unwrap(), NodeRef::id("chapter-3"));
        assert!(parse_ref("chapter:x").is_err());
        assert!(parse_ref("").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["storygraph", "lotr.json", "--seed", "4", "graph", "--at", "chapter:2"]).unwrap();
        assert_eq!(cli.seed, 4);
        assert!(matches!(cli.command, Command::Graph { at: NodeRef::Chapter { chapter: 2 } }));
    }
}
