//! wiredesk - terminal front end
//!
//! Signs in (from `WIREDESK_EMAIL` / `WIREDESK_PASSWORD` when no session is
//! stored), then prints the wire list and reprints it whenever a realtime
//! update invalidates it. `wiredesk export` prints the first page as CSV.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use wiredesk_client::storage::FileStorage;
use wiredesk_client::views::{status_color, WireListView};
use wiredesk_client::{logging, AppContext, ClientConfig, Route};
use wiredesk_shared::{ApiError, WireListResponse, WireStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let storage = FileStorage::in_config_dir().context("no place to store the session")?;
    let app = AppContext::new(config, Arc::new(storage))?;

    let auth = app.auth();
    if !auth.is_authenticated() {
        let (Ok(email), Ok(password)) = (
            std::env::var("WIREDESK_EMAIL"),
            std::env::var("WIREDESK_PASSWORD"),
        ) else {
            bail!("not signed in; set WIREDESK_EMAIL and WIREDESK_PASSWORD");
        };
        auth.login(&email, &password)
            .await
            .map_err(|e| anyhow!(e.user_message()))?;
    }
    if let Some(user) = auth.current_user().await.map_err(|e| anyhow!(e.user_message()))? {
        println!("Signed in as {}", user.email);
    }

    let list = app.wire_list();
    if let Ok(raw) = std::env::var("WIREDESK_STATUS") {
        let status: WireStatus = raw.parse().map_err(|e: String| anyhow!(e))?;
        list.set_status_filter(Some(status));
    }

    if std::env::args().nth(1).as_deref() == Some("export") {
        list.load().await.map_err(|e| anyhow!(e.user_message()))?;
        print!("{}", list.export_csv()?);
        return Ok(());
    }

    list.mount();
    let mut revisions = app.cache.subscribe();
    let mut routes = app.navigator.subscribe();
    revisions.borrow_and_update();
    render(&list, list.load().await);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = list.next_update(&mut revisions) => match update {
                Some(result) => render(&list, result),
                None => break,
            },
            changed = routes.changed() => {
                if changed.is_err() {
                    break;
                }
                if *routes.borrow_and_update() == Route::Login {
                    eprintln!("Session expired; sign in again.");
                    break;
                }
                // A reload may have been cut short by this branch.
                render(&list, list.load().await);
            }
        }
    }

    list.unmount();
    Ok(())
}

fn render(list: &WireListView, loaded: Result<Option<WireListResponse>, ApiError>) {
    let response = match loaded {
        Ok(Some(response)) => response,
        Ok(None) => return,
        Err(e) => {
            eprintln!("Failed to load wires: {}", e.user_message());
            return;
        }
    };

    println!();
    println!(
        "{:<18} {:<20} {:<20} {:>14} {:<4} {:<11} {}",
        "Reference", "Sender", "Recipient", "Amount", "Cur", "Status", "Created"
    );
    for wire in &response.wires {
        println!(
            "{:<18} {:<20} {:<20} {:>14} {:<4} {:<11} {}",
            wire.reference_number.as_deref().unwrap_or("-"),
            wire.sender_name,
            wire.recipient_name,
            format!("{:.2}", wire.amount),
            wire.currency,
            format!("{} ({})", wire.status, status_color(wire.status)),
            wire.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    println!(
        "page {}/{} - {} wires, {} per page",
        response.page,
        list.page_count().max(1),
        response.total,
        response.page_size
    );
}
