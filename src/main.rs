use clap::Parser;

use medtour_i18n::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServerConfig::parse();
    medtour_i18n::init_tracing(config.log_json);
    medtour_i18n::serve(config).await
}
