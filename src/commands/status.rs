//! `compliance status`: show where a compliance run is at.

use std::io::Write;

use anyhow::{Context, Result};

use crate::client::ComplianceClient;
use crate::report::Table;

pub async fn run<C, W>(client: &C, namespace: &str, out: &mut W) -> Result<()>
where
    C: ComplianceClient + ?Sized,
    W: Write,
{
    let status = client
        .status(namespace)
        .await
        .context("failed to retrieve the compliance status")?;

    writeln!(out, "Status: {}", status.status)?;

    if !status.plugins.is_empty() {
        let mut table = Table::new(["PLUGIN", "NODE", "STATUS"]);
        for plugin in &status.plugins {
            table.add_row([
                plugin.plugin.as_str(),
                plugin.node.as_str(),
                plugin.status.as_str(),
            ]);
        }
        writeln!(out)?;
        table.render(out)?;
    }
    Ok(())
}
