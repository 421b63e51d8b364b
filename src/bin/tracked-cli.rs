use clap::{Parser, Subcommand};
use serde_json::json;
use uuid::Uuid;

use tracked_run::tracking::LocalTracker;

#[derive(Parser)]
#[command(name = "tracked-cli")]
#[command(about = "Inspect tasks recorded by the local tracking backend", long_about = None)]
struct Cli {
    /// Store directory used by `tracked-run --backend local`
    #[arg(short, long, default_value = "./tracking")]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recorded tasks
    Tasks {
        /// Only show tasks of this project
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Show one task with all of its events
    Show {
        /// Task ID as printed by `tasks`
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store = LocalTracker::new(&cli.store);

    match cli.command {
        Commands::Tasks { project } => {
            let tasks = store.list_tasks(project.as_deref()).await?;
            if tasks.is_empty() {
                eprintln!("No tasks found in {}", store.root().display());
                return Ok(());
            }
            for task in tasks {
                println!(
                    "{}  {:<9}  {}/{}  [{}]",
                    task.id,
                    format!("{:?}", task.status).to_lowercase(),
                    task.project,
                    task.name,
                    task.tags.join(", ")
                );
            }
        }
        Commands::Show { id } => {
            let (info, events) = store.read_task(id).await?;
            let document = json!({ "task": info, "events": events });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}
