use anyhow::bail;
use property_store::config::AppConfig;
use property_store::logic::ValueResolver;
use property_store::model::TargetRef;
use property_store::seed;
use property_store::store::PostgresStore;

const USAGE: &str = "usage: property-store resolve <target-type> <target-id>\n       property-store get <KEY> <target-type> <target-id>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command: Vec<&str> = args.iter().map(String::as_str).collect();
    if !matches!(command.as_slice(), ["resolve", _, _] | ["get", _, _, _]) {
        bail!(USAGE);
    }

    let config = AppConfig::load()?;
    let database_url = config.database_url()?;
    let store = PostgresStore::new(&database_url, config.max_connections()).await?;
    store.migrate().await?;

    // Load seed data for demonstration (optional)
    if config.properties.load_seed_data
        || std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true"
    {
        log::info!("Loading seed data...");
        seed::load_seed_data(&store).await?;
    }

    let resolver = ValueResolver::new(config.properties.presence_policy);

    let output = match command.as_slice() {
        ["resolve", category, id] => {
            let target = TargetRef::new(*category, *id);
            let resolved = resolver.resolve_all_for_target(&store, &target).await?;
            serde_json::to_string_pretty(&resolved)?
        }
        ["get", key, category, id] => {
            let target = TargetRef::new(*category, *id);
            let resolved = resolver.resolve_for_target(&store, key, &target).await?;
            serde_json::to_string_pretty(&resolved)?
        }
        _ => bail!(USAGE),
    };

    println!("{}", output);
    Ok(())
}
