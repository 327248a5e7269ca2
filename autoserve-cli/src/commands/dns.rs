//! `autoserve dns ...`

use std::fmt::Write as _;

use autoserve_core::types::{CreateRecordRequest, DnsRecord, ManagedRecord};
use serde::Serialize;

use crate::cli::{CreateArgs, DeleteArgs, DnsCommand, ListArgs, OutputArgs};

pub async fn run(command: DnsCommand) -> anyhow::Result<()> {
    let service = super::dns_service()?;

    match command {
        DnsCommand::Create(args) => {
            let output = args.output;
            let request = create_request(args);
            let outcome = service.create_record(request).await?;
            if output.json {
                print_json(&outcome)?;
            } else {
                let record = &outcome.managed.record;
                println!("Created DNS record {}", record.name);
                println!("{}", describe(record));
                if outcome.conflicts > 0 {
                    println!("  (after {} name conflicts)", outcome.conflicts);
                }
            }
        }
        DnsCommand::List(ListArgs { show_all, output }) => {
            let records = service.list_records(show_all).await?;
            if output.json {
                print_json(&records)?;
            } else if records.is_empty() {
                println!("No records for {}", service.base_domain());
            } else {
                print!("{}", render_table(&records));
            }
        }
        DnsCommand::Delete(DeleteArgs { record_id, output }) => {
            let outcome = service.delete_record(&record_id).await?;
            if output.json {
                print_json(&outcome)?;
            } else {
                println!("Deleted DNS record {} ({})", outcome.record.name, outcome.record.id);
                if !outcome.owned_by_tool {
                    println!("  note: this record was not created by autoserve");
                }
            }
        }
        DnsCommand::Cleanup(OutputArgs { json }) => {
            let report = service.purge_owned().await?;
            if json {
                print_json(&report)?;
            } else {
                for record in &report.deleted {
                    println!("Deleted {} ({})", record.name, record.id);
                }
                for failure in &report.failures {
                    println!(
                        "Failed  {} ({}): [{}] {}",
                        failure.name, failure.record_id, failure.kind, failure.reason
                    );
                }
                println!(
                    "{} deleted, {} failed",
                    report.deleted.len(),
                    report.failures.len()
                );
            }
            if !report.is_clean() {
                anyhow::bail!("{} record(s) could not be deleted", report.failures.len());
            }
        }
    }
    Ok(())
}

fn create_request(args: CreateArgs) -> CreateRecordRequest {
    let proxied = args.is_proxied();
    CreateRecordRequest {
        subdomain: args.subdomain,
        ip: args.ip,
        length: usize::from(args.length),
        proxied,
        ttl: args.ttl,
        prefer_public: !args.local_ip,
        comment: args.comment,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ttl_label(ttl: u32) -> String {
    if ttl == 1 {
        "Auto".to_string()
    } else {
        ttl.to_string()
    }
}

fn describe(record: &DnsRecord) -> String {
    format!(
        "  Type: {}\n  Content: {}\n  Proxied: {}\n  TTL: {}\n  Record ID: {}",
        record.record_type,
        record.content,
        if record.proxied { "yes" } else { "no" },
        ttl_label(record.ttl),
        record.id
    )
}

fn render_table(records: &[ManagedRecord]) -> String {
    let headers = ["ID", "NAME", "TYPE", "CONTENT", "PROXIED", "TTL", "OWNED", "COMMENT"];
    let rows: Vec<[String; 8]> = records
        .iter()
        .map(|m| {
            let r = &m.record;
            [
                r.id.clone(),
                r.name.clone(),
                r.record_type.to_string(),
                r.content.clone(),
                if r.proxied { "yes" } else { "no" }.to_string(),
                ttl_label(r.ttl),
                if m.owned_by_tool { "yes" } else { "no" }.to_string(),
                r.comment.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: &[&str]| {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", line.trim_end());
    };
    push_row(&headers);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&cells);
    }
    out
}
