//! Locate command

use clap::Args;

use crate::{AppContext, Cli};
use circuity_core::limits::parse_label;
use circuity_core::{CancelToken, LabelLocator};

#[derive(Args)]
pub struct LocateArgs {
    /// Start node address
    pub origin: String,

    /// Single-character label
    #[arg(short, long)]
    pub label: String,
}

pub async fn run(args: &LocateArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let label = parse_label(&args.label)?;
    let cancel = CancelToken::new();

    let address = LabelLocator::new(&ctx.store, &cancel)
        .locate(&args.origin, label)
        .await?;
    println!("{}", address);
    Ok(())
}
