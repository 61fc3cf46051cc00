//! alarm-registry: command-line access to the alarm subscription registry
//!
//! Every subcommand prints its result as JSON on stdout; logs go to stderr.
//! Alarm names, regions, ARNs and states are percent-decoded first.
//!
//! ## Configuration
//! ```yaml
//! storage:
//!   type: dynamo
//!   dynamo:
//!     alarms_table: alarm-subscriptions
//!     events_table: pipeline-events
//! monitoring:
//!   type: cloudwatch
//! ```

use std::io::Read;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use alarm_registry::config::Config;
use alarm_registry::monitoring::init_monitoring;
use alarm_registry::params::{decode, decode_all};
use alarm_registry::storage::init_storage;
use alarm_registry::utils::bootstrap::init_tracing;
use alarm_registry::{AlarmRegistry, NotificationIngestor};

/// Subscribe resources to monitoring alarms and query their state.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe resources to an alarm.
    Subscribe {
        region: String,
        alarm_name: String,
        #[arg(required = true)]
        resource_arns: Vec<String>,
    },
    /// Remove resources' subscriptions to an alarm.
    Unsubscribe {
        region: String,
        alarm_name: String,
        #[arg(required = true)]
        resource_arns: Vec<String>,
    },
    /// List the resources subscribed to an alarm.
    Subscribers { region: String, alarm_name: String },
    /// List a resource's alarm subscriptions and their state.
    AlarmsFor { resource_arn: String },
    /// List every alarm with at least one subscriber.
    SubscribedAlarms,
    /// Count each resource's subscriptions in a state.
    ByState { state: String },
    /// List the alarms the monitoring service defines in a region.
    ListAlarms { region: String },
    /// List pipeline events with the given alarm state.
    Events { state: String },
    /// Ingest a notification batch read from stdin.
    Ingest,
}

#[derive(Serialize)]
struct Handled {
    handled: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let (subscriptions, events) = init_storage(&config.storage).await?;
    let alarms = init_monitoring(&config.monitoring).await?;
    let registry = AlarmRegistry::new(subscriptions, events, alarms);

    match cli.command {
        Command::Subscribe {
            region,
            alarm_name,
            resource_arns,
        } => {
            let resource_arns = decode_all(&resource_arns)?;
            registry
                .subscribe(&decode(&alarm_name)?, &decode(&region)?, &resource_arns)
                .await?;
            print_json(&resource_arns)?;
        }
        Command::Unsubscribe {
            region,
            alarm_name,
            resource_arns,
        } => {
            let resource_arns = decode_all(&resource_arns)?;
            registry
                .unsubscribe(&decode(&alarm_name)?, &decode(&region)?, &resource_arns)
                .await?;
            print_json(&resource_arns)?;
        }
        Command::Subscribers { region, alarm_name } => {
            let subscribers = registry
                .subscribers_of(&decode(&alarm_name)?, &decode(&region)?)
                .await?;
            print_json(&subscribers)?;
        }
        Command::AlarmsFor { resource_arn } => {
            print_json(&registry.alarms_for(&decode(&resource_arn)?).await?)?;
        }
        Command::SubscribedAlarms => {
            print_json(&registry.all_subscribed_alarms().await?)?;
        }
        Command::ByState { state } => {
            print_json(&registry.subscribers_by_state(&decode(&state)?).await?)?;
        }
        Command::ListAlarms { region } => {
            print_json(&registry.list_alarms(&decode(&region)?).await?)?;
        }
        Command::Events { state } => {
            print_json(&registry.events_in_state(&decode(&state)?).await?)?;
        }
        Command::Ingest => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let event: serde_json::Value = serde_json::from_str(&input)?;

            let handled = NotificationIngestor::new(registry).handle_event(event).await?;
            info!(handled, "Ingest finished");
            print_json(&Handled { handled })?;
        }
    }

    Ok(())
}
