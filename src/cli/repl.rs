use crate::cli::ChatArgs;
use crate::conversation::transport::HttpProxyTransport;
use crate::conversation::{ ConversationController, ConversationView, Direction, Turn };
use log::info;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::sync::watch;

/// Line-oriented chat: every line read from stdin is one submit.
pub async fn run(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Chatting with proxy at {}", args.endpoint);

    let transport = Arc::new(HttpProxyTransport::new(args.endpoint.clone()));
    let mut controller = ConversationController::new(transport);
    if let Some(timeout) = args.reply_timeout() {
        controller = controller.with_reply_timeout(timeout);
    }

    let renderer = tokio::spawn(render(controller.subscribe()));
    println!("Ask me anything. Press Ctrl-D to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        controller.set_draft(&line);
        controller.submit_draft().await;
    }

    // Dropping the controller closes the channel and lets the renderer drain.
    drop(controller);
    renderer.await?;
    Ok(())
}

async fn render(mut updates: watch::Receiver<ConversationView>) {
    let mut shown = 0;
    let mut was_pending = false;

    while updates.changed().await.is_ok() {
        let view = updates.borrow_and_update().clone();
        for turn in view.transcript.iter().skip(shown) {
            println!("{}", format_turn(turn));
        }
        shown = view.transcript.len();

        if view.pending && !was_pending {
            println!("  ... thinking");
        }
        was_pending = view.pending;
    }
}

fn format_turn(turn: &Turn) -> String {
    match turn.direction() {
        Direction::Outgoing => format!("you > {}", turn.text()),
        Direction::Incoming => format!("bot < {}", turn.text()),
    }
}
