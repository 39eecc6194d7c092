//! Entry point for the video moderation backend.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    moderation_backend::start_server().await
}
