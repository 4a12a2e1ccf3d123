//! Label registry commands

use clap::{Args, Subcommand};

use crate::output::{print_json, print_table, OutputFormat};
use crate::{AppContext, Cli};
use circuity_core::limits::parse_label;
use circuity_core::NodeStore;
use circuity_storage::GraphBackend;

#[derive(Args)]
pub struct LabelArgs {
    #[command(subcommand)]
    pub command: LabelCommands,
}

#[derive(Subcommand)]
pub enum LabelCommands {
    /// Register a node for a label (returns the existing one if present)
    Create {
        /// Single-character label
        label: String,
    },
    /// Show the node registered for a label
    Get {
        /// Single-character label
        label: String,
    },
    /// List registered labels
    List,
}

pub async fn run(args: &LabelArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &args.command {
        LabelCommands::Create { label } => {
            let label = parse_label(label)?;
            let address = ctx.store.create_label_node(label).await?;
            println!("{}", address);
        }
        LabelCommands::Get { label } => {
            let label = parse_label(label)?;
            match ctx.store.lookup_label(label).await? {
                Some(address) => println!("{}", address),
                None => anyhow::bail!("No node registered for label '{}'", label),
            }
        }
        LabelCommands::List => {
            let labels = ctx.store.list_labels().await?;
            match cli.format {
                OutputFormat::Json => print_json(&labels)?,
                OutputFormat::Table if labels.is_empty() => println!("No labels registered"),
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = labels
                        .iter()
                        .map(|e| {
                            vec![
                                e.label.to_string(),
                                e.address.clone(),
                                e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                            ]
                        })
                        .collect();
                    print_table(&["LABEL", "ADDRESS", "CREATED"], &rows);
                }
            }
        }
    }

    Ok(())
}
