// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use church_admin::entities::{
    categories_for, ChurchEvent, EventStatus, EventType, FinanceRecord, FinanceType, Gender,
    Member, MemberPatch, MemberStatus, NewChurchEvent, NewFinanceRecord, NewMember,
};
use church_admin::views::{
    filter_events, filter_finance, format_rupiah, search_members, FinanceSummary,
};
use church_admin::{AppConfig, ChurchContext, Entity, Registry};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Church administration: members, events and finance
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "CHURCH_CONFIG")]
    config: Option<PathBuf>,

    /// Sign in before running the command
    #[arg(short, long, env = "CHURCH_USER")]
    user: Option<String>,

    #[arg(short, long, env = "CHURCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal dashboard (default)
    Ui,
    /// Sign in and remember the session
    Login {
        username: String,
        password: String,
    },
    /// Forget the current session
    Logout,
    /// Headline numbers, newest members and upcoming events
    Dashboard,
    /// List members, optionally matching name, email or phone
    Members {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List events, optionally of one type
    Events {
        #[arg(short = 't', long = "type")]
        event_type: Option<EventType>,
    },
    /// List finance records with totals
    Finance {
        #[arg(short = 't', long = "type")]
        kind: Option<FinanceType>,
    },
    AddMember {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        birth_date: String,
        /// Defaults to today
        #[arg(long)]
        join_date: Option<String>,
        #[arg(long)]
        status: Option<MemberStatus>,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long)]
        baptized: bool,
    },
    AddEvent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: Option<String>,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(short = 't', long = "type")]
        event_type: Option<EventType>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        status: Option<EventStatus>,
    },
    AddFinance {
        #[arg(short = 't', long = "type")]
        kind: FinanceType,
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: i64,
        /// Defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        recorded_by: Option<String>,
    },
    /// Change selected fields of a member
    UpdateMember {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        status: Option<MemberStatus>,
        #[arg(long)]
        baptized: Option<bool>,
    },
    Delete {
        kind: Collection,
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Collection {
    Members,
    Events,
    Finance,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    let ctx = ChurchContext::from_config(&config).context("opening church data")?;

    if let (Some(user), Some(password)) = (&args.user, &args.password) {
        ctx.auth.login(user, password).await?;
    }

    match args.command.unwrap_or(Command::Ui) {
        Command::Login { username, password } => {
            let user = ctx.auth.login(&username, &password).await?;
            println!("✓ Signed in as {} ({})", user.name, user.role);
            Ok(())
        }
        Command::Logout => {
            ctx.auth.logout().await?;
            println!("✓ Signed out");
            Ok(())
        }
        command => {
            if !ctx.auth.is_authenticated() {
                bail!("not signed in; run `church-admin login <username> <password>` first");
            }
            run_command(&ctx, command).await
        }
    }
}

async fn run_command(ctx: &ChurchContext, command: Command) -> Result<()> {
    let registry = &ctx.registry;

    match command {
        Command::Ui => run_ui_mode(ctx).await?,
        Command::Login { .. } | Command::Logout => {}
        Command::Dashboard => print_dashboard(ctx).await?,
        Command::Members { search } => {
            let members = registry.members.all().await?;
            let found = search_members(&members, search.as_deref().unwrap_or_default());
            print_members(&found);
        }
        Command::Events { event_type } => {
            let events = registry.events.all().await?;
            print_events(&filter_events(&events, event_type));
        }
        Command::Finance { kind } => {
            let records = registry.finance.all().await?;
            print_finance(&filter_finance(&records, kind));
            print_totals(&FinanceSummary::from_records(&records));
        }
        Command::AddMember {
            name,
            phone,
            email,
            address,
            birth_date,
            join_date,
            status,
            gender,
            baptized,
        } => {
            let defaults = NewMember::new(name, phone);
            let new = NewMember {
                email,
                address,
                birth_date,
                join_date: join_date.unwrap_or(defaults.join_date.clone()),
                status: status.unwrap_or_default(),
                gender: gender.unwrap_or_default(),
                baptized,
                ..defaults
            };
            let member = registry.members.create(new).await?;
            println!("✓ Added member {} ({})", member.name, member.id);
            report_size(&registry.members).await?;
        }
        Command::AddEvent {
            name,
            date,
            time,
            location,
            event_type,
            description,
            status,
        } => {
            let defaults = NewChurchEvent::new(name, date);
            let new = NewChurchEvent {
                time: time.unwrap_or(defaults.time.clone()),
                location,
                event_type: event_type.unwrap_or_default(),
                description,
                status: status.unwrap_or_default(),
                ..defaults
            };
            let event = registry.events.create(new).await?;
            println!("✓ Added event {} on {} ({})", event.name, event.date, event.id);
            report_size(&registry.events).await?;
        }
        Command::AddFinance {
            kind,
            category,
            amount,
            date,
            description,
            recorded_by,
        } => {
            if !categories_for(kind).contains(&category.as_str()) {
                eprintln!("⚠️  '{}' is not a standard {} category", category, kind);
            }

            let defaults = NewFinanceRecord::new(kind, category, amount);
            let recorded_by = recorded_by
                .or_else(|| ctx.auth.current_user().map(|u| u.name))
                .unwrap_or_default();
            let new = NewFinanceRecord {
                date: date.unwrap_or(defaults.date.clone()),
                description,
                recorded_by,
                ..defaults
            };
            let record = registry.finance.create(new).await?;
            println!(
                "✓ Recorded {} {} ({})",
                record.kind,
                format_rupiah(record.amount),
                record.id
            );
            report_size(&registry.finance).await?;
        }
        Command::UpdateMember {
            id,
            name,
            phone,
            email,
            address,
            status,
            baptized,
        } => {
            let patch = MemberPatch {
                name,
                phone,
                email,
                address,
                status,
                baptized,
                ..Default::default()
            };
            registry.members.update(&id, patch).await?;
            match registry.members.find(&id).await? {
                Some(member) => print_members(&[member]),
                None => println!("No member with id {}", id),
            }
        }
        Command::Delete { kind, id } => {
            match kind {
                Collection::Members => {
                    registry.members.delete(&id).await?;
                    report_size(&registry.members).await?;
                }
                Collection::Events => {
                    registry.events.delete(&id).await?;
                    report_size(&registry.events).await?;
                }
                Collection::Finance => {
                    registry.finance.delete(&id).await?;
                    report_size(&registry.finance).await?;
                }
            }
        }
    }

    Ok(())
}

/// Re-fetch after a write so the printed count is what the store now holds.
async fn report_size<E: Entity>(registry: &Registry<E>) -> Result<()> {
    let count = registry.all().await?.len();
    println!("  {} {} record(s) in store", count, E::KIND);
    Ok(())
}

async fn print_dashboard(ctx: &ChurchContext) -> Result<()> {
    let summary = ctx.registry.dashboard().await?;

    println!("⛪ Dashboard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Jemaat:    {} ({} aktif)",
        summary.total_members, summary.active_members
    );
    println!(
        "Kegiatan:  {} ({} mendatang)",
        summary.total_events, summary.upcoming_events
    );
    println!("Pemasukan: {}", format_rupiah(summary.total_income));
    println!("Saldo:     {}", format_rupiah(summary.balance));

    println!("\n👥 Jemaat terbaru");
    print_members(&summary.recent_members);
    println!("\n📅 Kegiatan mendatang");
    print_events(&summary.next_events);
    Ok(())
}

fn print_members(members: &[Member]) {
    if members.is_empty() {
        println!("  (none)");
        return;
    }
    for m in members {
        println!(
            "  {:<36}  {:<24} {:<15} {:<12} {}",
            m.id, m.name, m.phone, m.status, m.email
        );
    }
}

fn print_events(events: &[ChurchEvent]) {
    if events.is_empty() {
        println!("  (none)");
        return;
    }
    for e in events {
        println!(
            "  {:<36}  {} {:<6} {:<24} {:<10} {:<11} {}",
            e.id, e.date, e.time, e.name, e.event_type, e.status, e.location
        );
    }
}

fn print_finance(records: &[FinanceRecord]) {
    if records.is_empty() {
        println!("  (none)");
        return;
    }
    for r in records {
        println!(
            "  {:<36}  {} {:<12} {:<20} {:>16}  {}",
            r.id,
            r.date,
            r.kind,
            r.category,
            format_rupiah(r.signed_amount()),
            r.description
        );
    }
}

fn print_totals(summary: &FinanceSummary) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Pemasukan:   {}", format_rupiah(summary.total_income));
    println!("Pengeluaran: {}", format_rupiah(summary.total_expense));
    println!("Saldo:       {}", format_rupiah(summary.balance));
}

#[cfg(feature = "tui")]
async fn run_ui_mode(ctx: &ChurchContext) -> Result<()> {
    let members = ctx.registry.members.all().await?;
    let events = ctx.registry.events.all().await?;
    let finance = ctx.registry.finance.all().await?;
    let user_name = ctx
        .auth
        .current_user()
        .map(|u| u.name)
        .unwrap_or_default();

    let mut app = ui::App::new(members, events, finance, user_name);
    // The terminal loop blocks; keep it off the async workers.
    tokio::task::block_in_place(|| ui::run_ui(&mut app))?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
async fn run_ui_mode(_ctx: &ChurchContext) -> Result<()> {
    bail!("TUI mode not available; rebuild with `--features tui` or use the other commands")
}
