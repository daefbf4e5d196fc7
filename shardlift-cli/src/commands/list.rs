use super::Context;
use crate::output::{self, OutputFormat};
use crate::ListArgs;
use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use shardlift_common::{ApiDialect, TargetGroupMember, TargetHealthState};
use shardlift_core::ClusterClient;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct NodeRow {
    #[tabled(rename = "NODE")]
    name: String,
}

#[derive(Tabled, Serialize)]
struct TargetRow {
    #[tabled(rename = "INSTANCE")]
    instance_id: String,
    #[tabled(rename = "STATE")]
    state: String,
}

impl From<&TargetGroupMember> for TargetRow {
    fn from(member: &TargetGroupMember) -> Self {
        let state = match member.state {
            TargetHealthState::Healthy => member.state.to_string().green().to_string(),
            TargetHealthState::Unhealthy | TargetHealthState::Unavailable => {
                member.state.to_string().red().to_string()
            }
            _ => member.state.to_string().yellow().to_string(),
        };

        Self {
            instance_id: member.instance_id.clone(),
            state,
        }
    }
}

#[derive(Serialize)]
struct TargetGroupListing {
    arn: String,
    members: Vec<TargetGroupMember>,
}

#[derive(Serialize)]
struct Listing {
    cluster: String,
    dialect: ApiDialect,
    nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_group: Option<TargetGroupListing>,
}

pub async fn handle_list_command(args: ListArgs, ctx: &Context) -> Result<()> {
    let endpoint = ctx.endpoint(args.cluster_url)?;
    let group = args.group.or_else(|| ctx.config.group.clone());

    let cluster = ctx.connect(endpoint).await?;
    let nodes = cluster.list_nodes().await.context("failed to list cluster nodes")?;

    let target_group = match group {
        Some(group) => {
            let cloud = ctx.cloud().await;
            let arn = cloud.resolve_target_group(&group).await?;
            let members = cloud
                .load_balancer
                .describe_target_health(&arn)
                .await
                .with_context(|| format!("failed to list targets of {}", arn))?;
            Some(TargetGroupListing { arn, members })
        }
        None => None,
    };

    let listing = Listing {
        cluster: cluster.endpoint().to_string(),
        dialect: cluster.dialect(),
        nodes,
        target_group,
    };

    match ctx.format {
        OutputFormat::Table => print_tables(listing),
        OutputFormat::Json => output::print_json(&listing)?,
        OutputFormat::Yaml => output::print_yaml(&listing)?,
    }

    Ok(())
}

fn print_tables(listing: Listing) {
    println!(
        "{} {} (API {}, {} nodes)",
        "Cluster".bold(),
        listing.cluster,
        listing.dialect,
        listing.nodes.len()
    );
    output::print_table(listing.nodes.into_iter().map(|name| NodeRow { name }).collect());

    if let Some(target_group) = listing.target_group {
        println!();
        println!("{} {}", "Target group".bold(), target_group.arn);
        output::print_table(target_group.members.iter().map(TargetRow::from).collect());
    }
}
