use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

use leitstand::{
    config, init_config, init_telemetry, Asset, AssetDirectory, CommentKind, EditRequest,
    LeitstandConfig, OrderCoordinator, OrderStatus, Role, SnapshotStore, User, UserDirectory,
    WorkOrder, WorkOrderDraft, WorkOrderFilter,
};

#[derive(Parser)]
#[command(name = "leitstand")]
#[command(about = "Maintenance work order tracking for physical assets")]
#[command(
    long_about = "Leitstand tracks maintenance work orders against physical assets: \
                  lifecycle transitions, task checklists, comment journals, and \
                  per-user notifications. State lives in a JSON snapshot; every \
                  command acts as one user via --user."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the snapshot with a default admin user and write leitstand.toml
    Init {
        /// Overwrite an existing snapshot
        #[arg(long, help = "Force initialization, overwriting existing state")]
        force: bool,
    },
    /// Display work order counts per status and open notification totals
    Status,
    /// List work orders visible to a user
    List {
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long, help = "Only orders on this asset id")]
        asset: Option<u64>,
        #[arg(long, help = "Only orders with this status (e.g. 'In Arbeit')")]
        status: Option<String>,
        #[arg(long, help = "Only orders of this discipline (e.g. Elektrisch)")]
        discipline: Option<String>,
    },
    /// Show one work order with its tasks and journal
    Show {
        id: u64,
    },
    /// Create a work order
    Create {
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, help = "Asset the order is logged against")]
        asset: u64,
        #[arg(long, default_value = "Sonstiges")]
        discipline: String,
        #[arg(long, default_value = "Normal")]
        priority: String,
        #[arg(long, help = "Assign immediately to this user id")]
        assign: Option<u64>,
    },
    /// Assign a work order to a user
    Assign {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long, help = "User id to assign to")]
        to: u64,
    },
    /// Move a work order to In Arbeit
    Start {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// Change a work order's priority
    Prioritize {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long, help = "New priority (Niedrig/Normal/Hoch/Kritisch)")]
        to: String,
    },
    /// Complete a work order (blocked while required tasks are open)
    Complete {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// Cancel a work order
    Cancel {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// Reopen a completed or cancelled work order
    Reopen {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// Delete a work order (supervisors and admins only)
    Delete {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// Manage the task checklist of a work order
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Comment on a work order
    Comment {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long)]
        text: String,
    },
    /// Show a user's notifications
    Inbox {
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long, help = "Only unread notifications")]
        unread: bool,
    },
    /// Mark notifications as read
    Read {
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long, help = "Notification id; omit together with --all")]
        id: Option<u64>,
        #[arg(long, help = "Mark everything for this user as read")]
        all: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task to a work order's checklist
    Add {
        id: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
        #[arg(long)]
        description: String,
    },
    /// Toggle a task's completion state
    Toggle {
        id: u64,
        task: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
    /// Remove an uncompleted task
    Remove {
        id: u64,
        task: u64,
        #[arg(long, help = "Acting user id")]
        user: u64,
    },
}

fn main() -> Result<()> {
    init_config()?;
    init_telemetry()?;

    let cli = Cli::parse();
    let store = SnapshotStore::new(config()?.snapshot.path.clone());

    match cli.command {
        Commands::Init { force } => cmd_init(&store, force),
        command => {
            let mut state = load_state(&store)?;
            let mutated = run_command(command, &mut state)?;
            if mutated {
                store.save(&state)?;
            }
            Ok(())
        }
    }
}

/// Dispatch one command against loaded state. Returns whether the state
/// changed and needs to be written back.
fn run_command(command: Commands, state: &mut OrderCoordinator) -> Result<bool> {
    match command {
        Commands::Init { .. } => unreachable!("handled before state load"),
        Commands::Status => {
            cmd_status(state);
            Ok(false)
        }
        Commands::List {
            user,
            asset,
            status,
            discipline,
        } => {
            let filter = WorkOrderFilter {
                asset,
                status: parse_opt(status.as_deref())?,
                discipline: parse_opt(discipline.as_deref())?,
            };
            for order in state.visible_orders(&filter, user)? {
                print_order_line(order);
            }
            Ok(false)
        }
        Commands::Show { id } => {
            cmd_show(state, id)?;
            Ok(false)
        }
        Commands::Create {
            user,
            title,
            description,
            asset,
            discipline,
            priority,
            assign,
        } => {
            let mut draft = WorkOrderDraft::new(title, description)
                .on_asset(asset)
                .discipline(parse(&discipline)?)
                .priority(parse(&priority)?);
            if let Some(assignee) = assign {
                draft = draft.assigned_to(assignee);
            }
            let order = state.create_order(draft, user)?;
            println!("📋 Work Order #{} angelegt ({})", order.id, order.status);
            Ok(true)
        }
        Commands::Assign { id, user, to } => {
            let current = current_order(state, id)?;
            let request = EditRequest {
                assignee: Some(to),
                ..EditRequest::keeping(&current)
            };
            let order = state.edit_order(id, request, user)?;
            println!(
                "👤 #{} zugewiesen an {}",
                order.id,
                order.assigned_to_name.as_deref().unwrap_or("-")
            );
            Ok(true)
        }
        Commands::Start { id, user } => {
            let current = current_order(state, id)?;
            let request = EditRequest {
                status: OrderStatus::InArbeit,
                ..EditRequest::keeping(&current)
            };
            let order = state.edit_order(id, request, user)?;
            println!("🔧 #{} ist jetzt {}", order.id, order.status);
            Ok(true)
        }
        Commands::Prioritize { id, user, to } => {
            let current = current_order(state, id)?;
            let request = EditRequest {
                priority: parse(&to)?,
                ..EditRequest::keeping(&current)
            };
            let order = state.edit_order(id, request, user)?;
            println!("⚠️  #{} Priorität: {}", order.id, order.priority);
            Ok(true)
        }
        Commands::Complete { id, user } => {
            let order = state.complete_order(id, user)?;
            println!("✅ #{} erledigt", order.id);
            Ok(true)
        }
        Commands::Cancel { id, user } => {
            let order = state.cancel_order(id, user)?;
            println!("🛑 #{} abgebrochen", order.id);
            Ok(true)
        }
        Commands::Reopen { id, user } => {
            let order = state.reopen_order(id, user)?;
            println!("🔄 #{} wieder geöffnet ({})", order.id, order.status);
            Ok(true)
        }
        Commands::Delete { id, user } => {
            let order = state.delete_order(id, user)?;
            println!("🗑️  #{} gelöscht ({})", order.id, order.title);
            Ok(true)
        }
        Commands::Task { command } => {
            match command {
                TaskCommands::Add {
                    id,
                    user,
                    description,
                } => {
                    state.add_task(id, &description, user)?;
                    println!("📌 Aufgabe zu #{id} hinzugefügt");
                }
                TaskCommands::Toggle { id, task, user } => {
                    let order = state.toggle_task(id, task, user)?;
                    let done = order.task(task).map(|t| t.completed).unwrap_or(false);
                    println!(
                        "{} Aufgabe {} auf #{}",
                        if done { "☑" } else { "☐" },
                        task,
                        id
                    );
                }
                TaskCommands::Remove { id, task, user } => {
                    state.remove_task(id, task, user)?;
                    println!("Aufgabe {task} von #{id} entfernt");
                }
            }
            Ok(true)
        }
        Commands::Comment { id, user, text } => {
            let comment = state.add_comment(id, &text, user)?;
            println!("💬 Kommentar {} auf #{}", comment.id, id);
            Ok(true)
        }
        Commands::Inbox { user, unread } => {
            cmd_inbox(state, user, unread);
            Ok(false)
        }
        Commands::Read { user, id, all } => {
            if all {
                let flipped = state.notifications.mark_all_read(user);
                println!("{} Benachrichtigungen als gelesen markiert", flipped);
            } else {
                let id = id.ok_or_else(|| anyhow!("pass --id or --all"))?;
                state.notifications.mark_read(id)?;
                println!("Benachrichtigung {id} gelesen");
            }
            Ok(true)
        }
    }
}

fn cmd_init(store: &SnapshotStore, force: bool) -> Result<()> {
    if store.exists() && !force {
        bail!(
            "snapshot already exists at {} (use --force to overwrite)",
            store.path().display()
        );
    }

    let users = UserDirectory::from_users([User::new(1, "Admin", Role::Admin)]);
    let assets = AssetDirectory::from_assets([Asset::new(1, "Anlage 1", "Halle 1")]);
    let state = OrderCoordinator::new(users, assets);
    store.save(&state)?;

    if !Path::new("leitstand.toml").exists() {
        LeitstandConfig::default().save_to_file("leitstand.toml")?;
    }

    println!("✅ Snapshot angelegt: {}", store.path().display());
    println!("   Standardbenutzer: Admin (id 1), Standardanlage: Anlage 1 (id 1)");
    Ok(())
}

fn cmd_status(state: &OrderCoordinator) {
    println!("📋 WORK ORDERS:");
    for status in [
        OrderStatus::Neu,
        OrderStatus::Zugewiesen,
        OrderStatus::InArbeit,
        OrderStatus::Erledigt,
        OrderStatus::Abgebrochen,
    ] {
        let filter = WorkOrderFilter {
            status: Some(status),
            ..Default::default()
        };
        let count = state.store.filtered(&filter).len();
        if count > 0 {
            println!("   {status}: {count}");
        }
    }
    println!("   gesamt: {}", state.store.len());

    let unread: usize = state
        .users
        .all()
        .map(|u| state.notifications.unread_count_for(u.id))
        .sum();
    println!("🔔 Ungelesene Benachrichtigungen: {unread}");
}

fn cmd_show(state: &OrderCoordinator, id: u64) -> Result<()> {
    let order = current_order(state, id)?;
    print_order_line(&order);
    println!("   Anlage: {} | Erstellt von: {}", order.asset_name, order.created_by_name);
    println!("   {}", order.description);

    if !order.tasks.is_empty() {
        println!("   Aufgaben:");
        for task in &order.tasks {
            let mark = if task.completed { "☑" } else { "☐" };
            match &task.completed_by_name {
                Some(name) => println!("     {mark} [{}] {} ({name})", task.id, task.description),
                None => println!("     {mark} [{}] {}", task.id, task.description),
            }
        }
    }

    let comments = state.comments_for(id);
    if !comments.is_empty() {
        println!("   Journal:");
        for comment in comments {
            match comment.kind {
                CommentKind::Comment => {
                    println!("     💬 {}: {}", comment.author_name, comment.text)
                }
                _ => println!(
                    "     ⚙ {}: {} → {}",
                    comment.author_name,
                    comment.old_value.as_deref().unwrap_or("-"),
                    comment.new_value.as_deref().unwrap_or("-")
                ),
            }
        }
    }
    Ok(())
}

fn cmd_inbox(state: &OrderCoordinator, user: u64, unread_only: bool) {
    let notifications = state.notifications.notifications_for(user);
    let unread = state.notifications.unread_count_for(user);
    println!("🔔 {} Benachrichtigungen ({} ungelesen)", notifications.len(), unread);
    for n in notifications {
        if unread_only && n.read {
            continue;
        }
        let mark = if n.read { " " } else { "•" };
        println!("   {mark} [{}] #{} {}: {}", n.id, n.work_order_id, n.work_order_title, n.message);
    }
}

fn load_state(store: &SnapshotStore) -> Result<OrderCoordinator> {
    match store.load()? {
        Some(snapshot) => Ok(snapshot.state),
        None => bail!(
            "no snapshot at {}, run 'leitstand init' first",
            store.path().display()
        ),
    }
}

fn current_order(state: &OrderCoordinator, id: u64) -> Result<WorkOrder> {
    state
        .order(id)
        .cloned()
        .ok_or_else(|| anyhow!("work order {id} not found"))
}

fn print_order_line(order: &WorkOrder) {
    let assignee = order.assigned_to_name.as_deref().unwrap_or("-");
    println!(
        "#{} [{}] {} ({}, {}, → {})",
        order.id, order.status, order.title, order.discipline, order.priority, assignee
    );
}

fn parse<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|e| anyhow!(e))
}

fn parse_opt<T: std::str::FromStr<Err = String>>(raw: Option<&str>) -> Result<Option<T>> {
    raw.map(parse).transpose()
}
