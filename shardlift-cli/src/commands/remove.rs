use super::Context;
use crate::output::{self, OutputFormat};
use crate::RemoveArgs;
use anyhow::{Context as _, Result};
use shardlift_core::workflow::RemoveRequest;
use shardlift_core::{ClusterClient, NodeLifecycle};
use std::io::IsTerminal;

pub async fn handle_remove_command(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let endpoint = ctx.endpoint(args.cluster_url)?;
    let group = ctx.group(args.group)?;

    let request = RemoveRequest::new(group, args.node_name).with_poll(ctx.config.remove_poll());
    request.validate()?;

    if !args.yes && std::io::stdin().is_terminal() {
        use dialoguer::Confirm;

        let confirm = Confirm::new()
            .with_prompt(format!(
                "Remove node {} from {}? It will be shut down and detached",
                request.node_name, request.group
            ))
            .default(false)
            .interact()?;

        if !confirm {
            output::print_info("Removal aborted");
            return Ok(());
        }
    }

    let cluster = ctx.connect(endpoint).await?;
    let cloud = ctx.cloud().await;

    if ctx.format == OutputFormat::Table {
        output::print_info(&format!(
            "Removing {} from {} (cluster API {})",
            request.node_name,
            request.group,
            cluster.dialect()
        ));
    }

    let observer = ctx.observer();
    let report = NodeLifecycle::new(&cluster, &cloud)
        .with_observer(observer.clone())
        .remove_node(&request)
        .await
        .with_context(|| format!("failed to remove node {}", request.node_name))?;
    observer.finish();

    output::print_success(&format!(
        "Node {} ({}) removed from {}",
        request.node_name, report.instance_id, request.group
    ));
    output::print_single(&report, ctx.format)?;

    Ok(())
}
