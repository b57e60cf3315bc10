mod user;

use shared::config::Settings;
use stash::{CacheRegistry, CacheRepository};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use user::{ensure_found, User, UserCacheRepository};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let settings = Settings::from_env();
    info!(
        "Opening user repository in {} (namespace '{}', ttl {}ms, negative caching {})",
        settings.data_dir,
        settings.namespace,
        settings.ttl.as_millis(),
        settings.negative_caching
    );

    let registry = CacheRegistry::new();
    let users = UserCacheRepository::open(&settings, &registry)?;

    // ============================================
    // STEP 1: Create users
    // ============================================
    let john = User::new(1, "john_doe", "john@example.com", 30);
    for user in [
        john.clone(),
        User::new(2, "jane", "jane@example.com", 28),
        User::new(3, "li_wei", "li@example.com", 35),
    ] {
        let id = user.id;
        users.save(user)?;
        info!("Saved user {}", id);
    }

    // ============================================
    // STEP 2: Read by ID, the second read is a cache hit
    // ============================================
    let first = users.get_by_id(&john.id)?;
    info!("Fetched user: {:?}", first);
    let second = users.get_by_id(&john.id)?;
    info!("Fetched user again (cache): {:?}", second);

    // ============================================
    // STEP 3: Missing user, the second lookup is served by the negative cache
    // ============================================
    for attempt in 1..=2 {
        match ensure_found(users.get_by_id(&99999))? {
            Some(user) => warn!("Unexpected user 99999: {:?}", user),
            None => info!("User 99999 not found (attempt {})", attempt),
        }
    }

    // ============================================
    // STEP 4: Update
    // ============================================
    let mut updated = (*first).clone();
    updated.age += 1;
    users.save(updated)?;
    info!("Updated user {}", john.id);

    // ============================================
    // STEP 5: List all
    // ============================================
    let all = users.get_all()?;
    info!("Total users: {}", all.len());

    // ============================================
    // STEP 6: Delete
    // ============================================
    users.delete(&john.id)?;
    info!("Deleted user {}", john.id);

    // ============================================
    // STEP 7: Batch get
    // ============================================
    let found = users.batch_get(&[1, 2, 3, 4, 5])?;
    info!("Batch get resolved {} of 5 users", found.len());

    // ============================================
    // STEP 8: Clear one entry, then the whole namespace
    // ============================================
    users.clear_cache(&2)?;
    info!("Cleared cache entry for user 2");
    users.clear_all_cache()?;
    info!(
        "Cleared all cached users ({} entries left)",
        users.cache_info().entries_estimate
    );

    Ok(())
}
