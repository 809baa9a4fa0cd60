use gamefowl_farm::commands::run_custom_commands;
use gamefowl_farm::configuration::get_configuration;
use gamefowl_farm::startup::Application;
use gamefowl_farm::telemetry::init_telemetry;

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    let configuration = get_configuration().expect("Failed to read configuration.");
    init_telemetry("gamefowl-farm", &configuration.log);

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        run_custom_commands(args).await?;
        return Ok(());
    }

    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
