pub mod cli;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod models;
pub mod proxy;
pub mod server;

use cli::{ Args, Command, ServeArgs };
use config::persona::load_persona;
use llm::chat::new_client as new_chat_client;
use llm::LlmConfig;
use log::info;
use proxy::ProxyService;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve_args) => serve(serve_args).await,
        Command::Chat(chat_args) => cli::repl::run(chat_args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    let has_credential = args.api_key.as_deref().map_or(false, |k| !k.trim().is_empty());
    info!("Upstream Credential: {}", if has_credential { "set" } else { "MISSING" });
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or(llm::DEFAULT_CHAT_MODEL));
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or(llm::DEFAULT_BASE_URL));
    info!("Upstream Timeout: {:?}", args.upstream_timeout());
    info!("Persona Path: {}", args.persona_path.as_deref().unwrap_or("built-in"));
    info!("Max Body Bytes: {}", args.max_body_bytes);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let persona = load_persona(args.persona_path.as_deref())?;
    let chat_config = LlmConfig {
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        timeout: args.upstream_timeout(),
    };
    let chat_client = new_chat_client(&chat_config)?;
    info!(
        "Chat client configured: Model={}, BaseURL={}",
        chat_client.get_model(),
        chat_client.get_base_url().as_deref().unwrap_or("client default")
    );

    let service = ProxyService::new(args.api_key.clone(), chat_client, persona)
        .with_body_limit(args.max_body_bytes);

    let server = Server::new(Arc::new(service), args);
    server.run().await?;

    Ok(())
}
