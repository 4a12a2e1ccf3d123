//! Edge commands

use clap::{Args, Subcommand};

use crate::output::{print_json, print_table, OutputFormat};
use crate::{AppContext, Cli};
use circuity_core::limits::{parse_label, validate_weight};
use circuity_core::{Direction, Edge, NodeStore};
use circuity_storage::GraphBackend;

#[derive(Args)]
pub struct EdgeArgs {
    #[command(subcommand)]
    pub command: EdgeCommands,
}

#[derive(Subcommand)]
pub enum EdgeCommands {
    /// Add an edge between two nodes
    Add {
        /// Source node address
        from: String,
        /// Destination node address
        to: String,
        /// Edge direction: up, down, forward, backward
        #[arg(short = 'D', long)]
        direction: Direction,
        /// Single-character label
        #[arg(short, long)]
        label: String,
        /// Selection weight
        #[arg(short, long, default_value = "1")]
        weight: f64,
        /// Observation count
        #[arg(long)]
        count: Option<u64>,
    },
    /// List the decoded edges of a node
    List {
        /// Node address
        address: String,
        /// Only edges in this direction
        #[arg(short = 'D', long)]
        direction: Option<Direction>,
        /// Only edges with this label
        #[arg(short, long)]
        label: Option<String>,
    },
}

pub async fn run(args: &EdgeArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &args.command {
        EdgeCommands::Add {
            from,
            to,
            direction,
            label,
            weight,
            count,
        } => {
            let label = parse_label(label)?;
            validate_weight(*weight)?;
            if ctx.store.node_metadata(to).await?.is_none() {
                tracing::warn!("Destination {} does not exist yet", to);
            }

            let mut edge = Edge::new(*direction, label, *weight, to.as_str());
            if let Some(count) = count {
                edge = edge.with_count(*count);
            }
            ctx.store.add_edge(from, &edge).await?;

            tracing::info!("Added edge {} on {}", edge.key(), from);
            println!("{} -[{}]-> {}", from, edge.key(), to);
        }
        EdgeCommands::List {
            address,
            direction,
            label,
        } => {
            let label = label.as_deref().map(parse_label).transpose()?;
            let edges = ctx.store.get_edge_set(address).await?;
            let edges: Vec<&Edge> = edges
                .iter()
                .filter(|e| direction.map_or(true, |d| e.direction == d))
                .filter(|e| label.map_or(true, |l| e.label == l))
                .collect();

            match cli.format {
                OutputFormat::Json => print_json(&edges)?,
                OutputFormat::Table if edges.is_empty() => {
                    println!("No edges on {}", address)
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = edges
                        .iter()
                        .map(|e| {
                            vec![
                                e.direction.to_string(),
                                e.label.to_string(),
                                e.weight.to_string(),
                                e.count.map(|c| c.to_string()).unwrap_or_default(),
                                e.destination.clone(),
                            ]
                        })
                        .collect();
                    print_table(&["DIRECTION", "LABEL", "WEIGHT", "COUNT", "DESTINATION"], &rows);
                }
            }
        }
    }

    Ok(())
}
