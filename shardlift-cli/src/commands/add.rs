use super::Context;
use crate::output::{self, OutputFormat};
use crate::AddArgs;
use anyhow::{Context as _, Result};
use shardlift_core::workflow::AddRequest;
use shardlift_core::{ClusterClient, NodeLifecycle};

pub async fn handle_add_command(args: AddArgs, ctx: &Context) -> Result<()> {
    let endpoint = ctx.endpoint(args.cluster_url)?;
    let group = ctx.group(args.group)?;

    let request = AddRequest::new(group, args.number).with_poll(ctx.config.add_poll());
    request.validate()?;

    let cluster = ctx.connect(endpoint).await?;
    let cloud = ctx.cloud().await;

    if ctx.format == OutputFormat::Table {
        output::print_info(&format!(
            "Adding {} node(s) to {} (cluster API {}, waiting up to {})",
            request.delta,
            request.group,
            cluster.dialect(),
            output::format_duration(request.poll.ceiling().as_secs())
        ));
    }

    let observer = ctx.observer();
    let report = NodeLifecycle::new(&cluster, &cloud)
        .with_observer(observer.clone())
        .add_nodes(&request)
        .await
        .with_context(|| format!("failed to add nodes to {}", request.group))?;
    observer.finish();

    output::print_success(&format!(
        "{} now runs {} node(s) (was {})",
        request.group, report.desired_capacity, report.previous_capacity
    ));
    output::print_single(&report, ctx.format)?;

    Ok(())
}
