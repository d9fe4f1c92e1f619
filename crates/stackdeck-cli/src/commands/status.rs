use anyhow::Result;
use console::{style, Term};
use stackdeck_remote::StatusFeed;
use stackdeck_ui::render;
use std::sync::Arc;
use std::time::Duration;

/// Print the container table once, or keep redrawing it every `interval`.
pub async fn run(feed: Arc<dyn StatusFeed>, watch: bool, interval: Duration) -> Result<()> {
    if !watch {
        let pb = stackdeck_ui::spinner("Fetching container status...");
        let containers = feed.containers().await;
        pb.finish_and_clear();
        render::print_containers(&containers?, feed.mode());
        return Ok(());
    }

    let term = Term::stdout();
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let result = feed.containers().await;
        let _ = term.clear_screen();
        match result {
            Ok(containers) => render::print_containers(&containers, feed.mode()),
            Err(e) => println!("{} {e}", style("Failed to fetch container status:").red()),
        }
        println!(
            "\n  Refreshing every {}s. Press Ctrl+C to stop.",
            interval.as_secs()
        );
    }
}
