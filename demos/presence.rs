//! Watches the presence channel and keeps a local online set.
//!
//! Reads `REALTIME_API_BASE`, `REALTIME_TOKEN` and `REALTIME_USER` from the
//! environment or a `.env` file.

use resilient_realtime::{
    ChannelSink, ConnectionConfig, DomainEvent, RealtimeEndpoint, SharedToken, SinkEvent,
    SubscriptionBinding,
};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_realtime=info".into()),
        )
        .init();

    let api_base = std::env::var("REALTIME_API_BASE")?;
    let token = SharedToken::new(std::env::var("REALTIME_TOKEN").ok());
    let user = std::env::var("REALTIME_USER").unwrap_or_else(|_| "me".to_string());

    let endpoint = RealtimeEndpoint::from_api_base(&api_base)?;
    let (sink, mut events) = ChannelSink::new();
    let binding = SubscriptionBinding::new(
        ConnectionConfig::user_status(&endpoint),
        Arc::new(token),
        Arc::new(sink),
    )?;
    binding.update(true, Some(user)).await?;

    let mut status = binding.subscribe_status();
    let mut online = HashSet::new();

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                SinkEvent::Event(envelope) => {
                    if let Ok(DomainEvent::UserStatusChanged(change)) = DomainEvent::from_envelope(envelope) {
                        if change.is_online {
                            online.insert(change.user_id.to_string());
                        } else {
                            online.remove(&change.user_id.to_string());
                        }
                        println!("Online: {:?}", online);
                    }
                }
                SinkEvent::Error(e) => eprintln!("{}", e),
                SinkEvent::Connected => {}
            },
            Ok(()) = status.changed() => {
                println!("Status: {:?}", *status.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    binding.teardown().await;
    Ok(())
}
