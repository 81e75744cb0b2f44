use crate::server::load_config;
use agentpad_core::{create_backend, StorageBackend};

pub async fn run() -> anyhow::Result<()> {
    println!("Agentpad Doctor\n");

    print!("Loading configuration... ");
    let config = match load_config() {
        Ok(config) => {
            println!("ok");
            config
        }
        Err(e) => {
            println!("failed\n  {:#}", e);
            std::process::exit(1);
        }
    };

    print!("Validating store settings... ");
    if let Err(e) = config.store.validate() {
        println!("failed\n  {}", e);
        std::process::exit(1);
    }
    println!(
        "ok (backend: {}, ttl: {}h, sweep every {}s)",
        config.store.backend,
        config.store.ttl_hours,
        config.store.cleanup_interval().as_secs()
    );

    print!("Connecting to storage backend... ");
    let backend = match create_backend(&config.store).await {
        Ok(backend) => backend,
        Err(e) => {
            println!("failed\n  {}", e);
            std::process::exit(1);
        }
    };
    println!("ok");

    println!("Connected: {}", backend.is_connected().await);
    match backend.count().await {
        Ok(count) => println!("Live sessions: {}", count),
        Err(e) => println!("Live sessions: unavailable ({})", e),
    }

    backend.disconnect().await?;
    println!("\nAll checks passed.");
    Ok(())
}
