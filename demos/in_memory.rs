//! Runs the cleaner against an in-memory browser and prints what happened.
//!
//! `RUST_LOG=debug cargo run --example in_memory`

use domain_cleaner::{
    expand_keys, CategoryKey, CleanAction, Cleaner, CleanerConfig, CookieRecord, HostServices, InMemoryBrowser,
    TabId,
};
use std::sync::Arc;

fn cookie(name: &str, domain: &str) -> CookieRecord {
    CookieRecord {
        name: name.into(),
        value: "demo".into(),
        domain: domain.into(),
        path: "/".into(),
        secure: true,
        http_only: false,
        host_only: !domain.starts_with('.'),
        store_id: "0".into(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let browser = Arc::new(InMemoryBrowser::new());
    let tab = TabId(1);
    browser.open_tab(tab, "https://shop.example.co.uk/basket");
    browser.activate(tab);
    browser.set_session_entries(tab, vec![4]);
    browser.set_storage_usage(tab, Some(12 * 1024 * 1024));
    browser.add_cookie(cookie("session", ".example.co.uk"));
    browser.add_cookie(cookie("cart", "shop.example.co.uk"));
    browser.add_cookie(cookie("tracker", ".ads.test"));
    browser.add_history("https://shop.example.co.uk/basket");
    browser.add_history("https://notexample.co.uk/");

    let config = CleanerConfig::builder().history_max_results(1_000).build()?;
    let cleaner = Cleaner::new(config, HostServices::from_browser(browser.clone()));

    let (scope, _location) = cleaner.active_scope().await?;

    let preview = cleaner.preview(&scope).await;
    println!("before: {} cookies, {} MB", preview.cookie_count, preview.usage_megabytes());

    let result = cleaner
        .reset(&[CategoryKey::Cookies, CategoryKey::SiteStorage], false)
        .await?;
    println!("reset: {}", serde_json::to_string_pretty(&result)?);

    let outcome = cleaner.run_action(CleanAction::ClearDomainHistory).await?;
    println!("{}", serde_json::to_string(&outcome.notice)?);

    let outcome = cleaner.run_action(CleanAction::OpenInIncognito).await?;
    println!("{}", serde_json::to_string(&outcome.notice)?);

    let base_domain = cleaner.open_hsts_settings().await?;
    println!("HSTS page opened, delete entries for {}", base_domain);

    let keys = expand_keys([CategoryKey::Cache], true);
    let (generation, handle) = cleaner.spawn_clear(domain_cleaner::ClearRequest {
        selected_keys: keys,
        scope,
    });
    let result = handle.await??;
    println!(
        "clear #{} (current: {}): {} items",
        generation.0,
        cleaner.is_current(generation),
        result.total()
    );

    Ok(())
}
