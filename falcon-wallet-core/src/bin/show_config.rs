use falcon_wallet_core::WalletCoreConfig;

fn main() -> anyhow::Result<()> {
    let config = WalletCoreConfig::load()?;

    println!("Falcon Wallet Core Configuration:\n");
    println!("  Network: {}", config.network.name());
    println!("  Ledger Host: {}", config.network.host());
    println!("  Fetch Root Key: {}", config.network.requires_root_key_fetch());
    println!("  Identity Provider: {}", config.network.identity_provider_url());
    println!("  Backend URL: {}", config.backend_url.as_deref().unwrap_or("(not set, offline)"));
    println!("  Request Timeout: {}s", config.request_timeout_secs);
    println!("  Price TTL: {}s", config.price_ttl_secs);
    println!(
        "  Poll Intervals: balances {}s, prices {}s, transactions {}s",
        config.balance_poll_secs, config.price_poll_secs, config.transaction_poll_secs
    );
    println!(
        "  Tron Address Polling: {} x {}ms",
        config.tron_poll_attempts, config.tron_poll_interval_ms
    );
    println!("  Identity Session: {} days", config.identity_session_days);
    println!("  Identity Login Timeout: {}s", config.identity_login_timeout_secs);
    println!("  Storage Namespace: {}", config.storage_namespace);
    println!("  Stablecoins: {}", config.stablecoin_keys.join(", "));
    println!("  Log Level: {}", config.log_level);
    Ok(())
}
