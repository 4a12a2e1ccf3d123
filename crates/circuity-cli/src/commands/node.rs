//! Node commands

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{print_json, print_table, OutputFormat};
use crate::{AppContext, Cli};
use circuity_core::limits::validate_address;
use circuity_core::Metadata;
use circuity_storage::GraphBackend;

#[derive(Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommands,
}

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Add an empty node
    Add {
        /// Node address (a fresh ULID when omitted)
        address: Option<String>,
    },
    /// Show a node's raw metadata
    Show {
        /// Node address
        address: String,
    },
    /// List node addresses
    List {
        /// Limit results
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
}

#[derive(Serialize)]
struct NodeView<'a> {
    address: &'a str,
    metadata: &'a Metadata,
}

pub async fn run(args: &NodeArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &args.command {
        NodeCommands::Add { address } => {
            let address = match address {
                Some(address) => {
                    validate_address(address)?;
                    if ctx.store.node_metadata(address).await?.is_some() {
                        anyhow::bail!("Node '{}' already exists", address);
                    }
                    ctx.store.put_node(address, &Metadata::new()).await?;
                    address.clone()
                }
                None => ctx.store.create_node().await?,
            };
            tracing::info!("Created node: {}", address);
            println!("{}", address);
        }
        NodeCommands::Show { address } => {
            let Some(metadata) = ctx.store.node_metadata(address).await? else {
                anyhow::bail!("Node '{}' not found", address);
            };
            match cli.format {
                OutputFormat::Json => print_json(&NodeView {
                    address,
                    metadata: &metadata,
                })?,
                OutputFormat::Table => {
                    println!("Node: {} ({} entries)", address, metadata.len());
                    let rows: Vec<Vec<String>> = metadata
                        .iter()
                        .map(|(k, v)| vec![k.clone(), v.clone()])
                        .collect();
                    if !rows.is_empty() {
                        print_table(&["KEY", "VALUE"], &rows);
                    }
                }
            }
        }
        NodeCommands::List { limit } => {
            let nodes: Vec<String> = ctx.store.list_nodes().await?.into_iter().take(*limit).collect();
            match cli.format {
                OutputFormat::Json => print_json(&nodes)?,
                OutputFormat::Table if nodes.is_empty() => println!("No nodes found"),
                OutputFormat::Table => {
                    for address in &nodes {
                        println!("{}", address);
                    }
                }
            }
        }
    }

    Ok(())
}
