//! Follows one conversation and prints chat events.
//!
//! Reads `REALTIME_API_BASE`, `REALTIME_TOKEN` and `REALTIME_CONVERSATION` from
//! the environment or a `.env` file.

use resilient_realtime::{
    ChannelSink, ConnectionConfig, DomainEvent, RealtimeEndpoint, SharedToken, SinkEvent,
    SubscriptionBinding,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_realtime=debug,info".into()),
        )
        .init();

    let api_base = std::env::var("REALTIME_API_BASE")?;
    let token = SharedToken::new(std::env::var("REALTIME_TOKEN").ok());
    let conversation = std::env::var("REALTIME_CONVERSATION")?;

    let endpoint = RealtimeEndpoint::from_api_base(&api_base)?;
    let (sink, mut events) = ChannelSink::new();
    let binding = SubscriptionBinding::new(
        ConnectionConfig::chat(&endpoint),
        Arc::new(token),
        Arc::new(sink),
    )?;

    println!("Joining conversation {}...", conversation);
    binding.update(true, Some(conversation)).await?;

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                SinkEvent::Connected => println!("Connected"),
                SinkEvent::Event(envelope) => match DomainEvent::from_envelope(envelope) {
                    Ok(DomainEvent::MessageCreated(message)) => println!("+ {}", message),
                    Ok(DomainEvent::MessageUpdated(message)) => println!("~ {}", message),
                    Ok(DomainEvent::MessageDeleted(message)) => println!("- {}", message),
                    Ok(other) => println!("? {:?}", other),
                    Err(e) => eprintln!("Bad event: {}", e),
                },
                SinkEvent::Error(e) if e.is_terminal() => eprintln!("{}", e.user_message()),
                SinkEvent::Error(e) => eprintln!("Error: {}", e),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("Leaving...");
    binding.teardown().await;
    Ok(())
}
