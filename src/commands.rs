use anyhow::anyhow;

use crate::configuration::get_configuration;
use crate::database::migrate_database;
use crate::routes::admin_user::utils::grant_admin_role;
use crate::routes::auth::utils::PgProfileStore;

#[tracing::instrument(name = "Run custom command")]
pub async fn run_custom_commands(args: Vec<String>) -> Result<(), anyhow::Error> {
    if args.len() < 2 {
        eprintln!("Invalid command. Please provide a valid command.");
        return Ok(());
    }
    let command = args[1].as_str();
    let configuration = get_configuration()?;

    match command {
        "migrate" => {
            migrate_database(&configuration.database).await?;
            tracing::info!("Migrations applied");
        }
        "grant_admin" => {
            let phone_number = args
                .get(2)
                .ok_or_else(|| anyhow!("Usage: grant_admin <phone_number>"))?;
            let pool = migrate_database(&configuration.database).await?;
            let store = PgProfileStore::new(pool);
            let profile = grant_admin_role(&store, phone_number)
                .await
                .map_err(|e| anyhow!(e.to_string()))?;
            tracing::info!(profile_id = %profile.id, "{} is now an admin", profile.phone_number);
        }
        _ => {
            eprintln!("Unknown command: {}. Please use a valid command.", command);
        }
    }

    Ok(())
}
