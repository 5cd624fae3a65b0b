use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use storefront_core::admin::MoveDirection;
use storefront_runtime::{bootstrap_from_path, ActorId, MenuEngine};

/// Conversation id used for one-shot renders.
const OPERATOR_CONVERSATION: i64 = 0;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront menu CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the catalog and print the build report and a tree preview
    Inspect(InspectArgs),
    /// Print the render descriptor of a scope as JSON
    Render(RenderArgs),
    /// Apply one sort-mode edit through the configured overlay store
    Sort(SortArgs),
}

#[derive(Debug, Args, Clone)]
struct InspectArgs {
    #[arg(long, default_value = "configs/storefront.yaml")]
    config: PathBuf,
    #[arg(long, default_value_t = 20)]
    max_folders: usize,
    #[arg(long, default_value_t = 5)]
    max_items: usize,
}

#[derive(Debug, Args, Clone)]
struct RenderArgs {
    #[arg(long, default_value = "configs/storefront.yaml")]
    config: PathBuf,
    /// Folder id; root when omitted
    #[arg(long)]
    scope: Option<String>,
    #[arg(long, default_value_t = 0)]
    page: usize,
    #[arg(long)]
    admin: bool,
}

#[derive(Debug, Args, Clone)]
struct SortArgs {
    #[arg(long, default_value = "configs/storefront.yaml")]
    config: PathBuf,
    /// Folder whose children are edited; root when omitted
    #[arg(long)]
    scope: Option<String>,
    /// Acting admin; defaults to the first configured admin
    #[arg(long)]
    actor: Option<ActorId>,
    #[arg(value_enum)]
    action: SortAction,
    /// Child id to move or toggle
    id: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortAction {
    Up,
    Down,
    Toggle,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Inspect(args) => {
                let engine = bootstrap_from_path(&args.config).await?;
                println!("{}", serde_json::to_string_pretty(&engine.diagnostics())?);
                println!("{}", engine.preview(args.max_folders, args.max_items));
                Ok(())
            }
            Command::Render(args) => {
                let engine = bootstrap_from_path(&args.config).await?;
                let descriptor = engine
                    .render(OPERATOR_CONVERSATION, args.scope.as_deref(), args.page, args.admin)
                    .await;
                println!("{}", serde_json::to_string_pretty(&descriptor)?);
                Ok(())
            }
            Command::Sort(args) => {
                let engine = bootstrap_from_path(&args.config).await?;
                let actor = resolve_actor(&engine, args.actor)?;
                engine.sort_enter(actor).await?;
                if args.scope.is_some() {
                    engine.sort_open(actor, args.scope.as_deref()).await?;
                }
                let view = match args.action {
                    SortAction::Up => engine.sort_move(actor, &args.id, MoveDirection::Up).await?,
                    SortAction::Down => {
                        engine.sort_move(actor, &args.id, MoveDirection::Down).await?
                    }
                    SortAction::Toggle => engine.sort_toggle_hidden(actor, &args.id).await?,
                };
                engine.sort_exit(actor).await;
                println!("{}", serde_json::to_string_pretty(&view)?);
                Ok(())
            }
        }
    }
}

fn resolve_actor(engine: &MenuEngine, requested: Option<ActorId>) -> anyhow::Result<ActorId> {
    match requested {
        Some(actor) if engine.is_admin(actor) => Ok(actor),
        Some(actor) => anyhow::bail!("actor {actor} is not listed in admin.actor_ids"),
        None => engine
            .options()
            .admin_ids
            .iter()
            .next()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no admin.actor_ids configured")),
    }
}
