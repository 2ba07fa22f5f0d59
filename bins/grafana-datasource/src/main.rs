mod plugin;

use plugin::ClickHousePlugin;

#[grafana_plugin_sdk::main(
    services(data, diagnostics),
    init_subscriber = true,
)]
async fn plugin() -> ClickHousePlugin {
    ClickHousePlugin::new()
}
