//! CLI commands for inspecting the link store.

use {
    anyhow::Result,
    clap::Subcommand,
    courier_store::{ConfigStore, Document, LinkRecord},
};

#[derive(Subcommand)]
pub enum LinksAction {
    /// List the oversight group and every link.
    List {
        /// Output the raw document as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the link keyed by a request chat id.
    Show { chat_id: i64 },
    /// Delete the link keyed by a request chat id. Other links are untouched.
    Delete { chat_id: i64 },
}

pub async fn handle_links(store: &ConfigStore, action: &LinksAction) -> Result<()> {
    match action {
        LinksAction::List { json } => {
            let doc = store.snapshot().await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                print!("{}", render_list(&doc));
            }
        },
        LinksAction::Show { chat_id } => {
            let doc = store.snapshot().await?;
            let Some(record) = doc.link(*chat_id) else {
                anyhow::bail!("no link configured for chat {chat_id}");
            };
            println!("{}", serde_json::to_string_pretty(record)?);
        },
        LinksAction::Delete { chat_id } => match delete_link(store, *chat_id).await? {
            Some(record) => println!("Removed {}", describe(&record)),
            None => anyhow::bail!("no link configured for chat {chat_id}"),
        },
    }
    Ok(())
}

/// Remove one link, writing the store only when something was removed.
async fn delete_link(store: &ConfigStore, chat_id: i64) -> Result<Option<LinkRecord>> {
    let mut tx = store.transaction().await?;
    let removed = tx.doc_mut().remove(chat_id);
    if removed.is_some() {
        tx.commit().await?;
    }
    Ok(removed)
}

fn describe(record: &LinkRecord) -> String {
    match (&record.collect_id, &record.collect_title) {
        (Some(id), title) => format!(
            "{} ({}) → {} ({id})",
            record.request_title,
            record.request_id,
            title.as_deref().unwrap_or("?")
        ),
        (None, _) => format!(
            "{} ({}) → not paired",
            record.request_title, record.request_id
        ),
    }
}

fn render_list(doc: &Document) -> String {
    let mut out = String::new();
    match &doc.qg {
        Some(qg) => out.push_str(&format!("Oversight group: {} ({})\n", qg.title, qg.id)),
        None => out.push_str("Oversight group: not set\n"),
    }
    if doc.links.is_empty() {
        out.push_str("No links.\n");
        return out;
    }
    for record in doc.links.values() {
        let status = if record.is_complete() {
            "✓"
        } else {
            "…"
        };
        out.push_str(&format!("  {status} {}\n", describe(record)));
    }
    out
}
