use harmony::{models::stats::Stats, Config, Session};
use std::{env, error::Error, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let guild_id = env::args()
        .nth(1)
        .ok_or("Usage: harmony-bans <guild id>")?;
    let config = Config::from_env()?;
    let session = Session::with_http(config, Arc::new(Stats::new()?));

    let bans = session.guild(guild_id.as_str()).banned_users().await?;
    if bans.is_empty() {
        println!("No banned users");
    }
    for user in bans {
        println!("{}\t{}#{}", user.id, user.username, user.discriminator);
    }
    Ok(())
}
