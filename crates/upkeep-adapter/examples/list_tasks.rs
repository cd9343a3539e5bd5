/*
[INPUT]:  Operator credentials and an equipment id (env vars)
[OUTPUT]: Task listing printed to stdout
[POS]:    Examples - login and task listing demonstration
[UPDATE]: When auth flow or task endpoints change
*/

use upkeep_adapter::*;

/// Example: sign in and list the tasks of one equipment
///
/// UPKEEP_BASE_URL, UPKEEP_USERNAME, UPKEEP_PASSWORD and UPKEEP_EQUIPMENT
/// must be set.
#[tokio::main]
async fn main() {
    println!("=== Upkeep Task Listing Example ===\n");

    let base_url = std::env::var("UPKEEP_BASE_URL")
        .unwrap_or_else(|_| http::DEFAULT_BASE_URL.to_string());
    let username = std::env::var("UPKEEP_USERNAME").unwrap_or_default();
    let password = std::env::var("UPKEEP_PASSWORD").unwrap_or_default();
    let equipment_id = std::env::var("UPKEEP_EQUIPMENT").unwrap_or_default();

    let client = match UpkeepClient::with_config_and_base_url(ClientConfig::default(), &base_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    let auth_manager = AuthManager::new(client);

    if let Err(e) = auth_manager.login(&username, &password).await {
        eprintln!("Login failed: {}", e);
        return;
    }
    println!("✓ Signed in");

    let client = match auth_manager.authenticated_client() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("No usable token: {}", e);
            return;
        }
    };

    for kind in [TaskKind::CounterBased, TaskKind::DateBased] {
        match client.list_tasks(&equipment_id, kind).await {
            Ok(entries) => {
                println!("\n{} tasks:", kind.as_str());
                for entry in entries {
                    match entry {
                        TaskEntry::Valid(task) => println!("  {} | {} | {:?}", task.id, task.title, task.status),
                        TaskEntry::Malformed(bad) => println!("  ?? | {} | {}", bad.title.unwrap_or_default(), bad.reason),
                    }
                }
            }
            Err(e) => eprintln!("Failed to list {} tasks: {}", kind.as_str(), e),
        }
    }
}
