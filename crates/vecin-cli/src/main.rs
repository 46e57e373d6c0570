//! CLI de operación del flujo de aprobación sobre Postgres.
//!
//! `vecin-cli transition --kind reserva --id <UUID> --target rechazada --actor <UUID> --reason "sala ocupada"`
//!
//! Códigos de salida: 0 ok, 2 configuración, 3 conflicto concurrente,
//! 4 rechazo del flujo, 5 infraestructura.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vecin_domain::{ActorRole, EntityKind, Estado, TransitionExtra};
use vecindapp::{pg_service_from_env, AppConfig, AppError, TransitionRequest};

#[derive(Debug, Parser)]
#[command(name = "vecin-cli", version, about = "Flujos de aprobación de la junta de vecinos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Crea una entidad en `pendiente`.
    Submit {
        #[arg(long)]
        kind: EntityKind,
        #[arg(long)]
        requester: Uuid,
        /// Término de la actividad (sólo inscripciones), RFC 3339.
        #[arg(long)]
        activity_end: Option<DateTime<Utc>>,
    },
    /// Aplica una transición de estado.
    Transition {
        #[arg(long)]
        kind: EntityKind,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        target: Estado,
        #[arg(long)]
        actor: Uuid,
        /// Motivo (obligatorio al rechazar).
        #[arg(long)]
        reason: Option<String>,
        /// Estado que el operador vio al decidir.
        #[arg(long)]
        expect: Option<Estado>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    Show {
        #[arg(long)]
        kind: EntityKind,
        #[arg(long)]
        id: Uuid,
    },
    History {
        #[arg(long)]
        kind: EntityKind,
        #[arg(long)]
        id: Uuid,
    },
    /// Estados a los que `actor` puede mover la entidad.
    Targets {
        #[arg(long)]
        kind: EntityKind,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        actor: Uuid,
    },
    /// Bandeja de pendientes de un tipo.
    Pending {
        #[arg(long)]
        kind: EntityKind,
    },
    GrantRole {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        role: ActorRole,
    },
    /// Aplica migraciones pendientes y termina.
    Migrate,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vecin=info"));
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| AppError::Config(format!("salida json: {e}")))?;
    println!("{out}");
    Ok(())
}

fn build_request(kind: EntityKind,
                 id: Uuid,
                 target: Estado,
                 actor: Uuid,
                 reason: Option<String>,
                 expect: Option<Estado>,
                 at: Option<DateTime<Utc>>)
                 -> TransitionRequest {
    let mut req = TransitionRequest::new(kind, id, target, actor).with_extra(TransitionExtra { motivo_rechazo: reason,
                                                                                                at });
    if let Some(estado) = expect {
        req = req.expecting(estado);
    }
    req
}

fn run(cli: Cli) -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    if let Command::Migrate = cli.command {
        let pool = vecin_persistence::build_pool_from_env()?;
        info!("migraciones al día (pool max={})", pool.max_size());
        return Ok(());
    }

    let svc = pg_service_from_env(&cfg)?;
    match cli.command {
        Command::Submit { kind,
                          requester,
                          activity_end, } => print_json(&svc.submit(kind, requester, activity_end)?),
        Command::Transition { kind,
                              id,
                              target,
                              actor,
                              reason,
                              expect,
                              at, } => {
            let req = build_request(kind, id, target, actor, reason, expect, at);
            let done = svc.transition(&req)?;
            info!("transición {} -> {} seq={}", done.record.draft.from, done.record.draft.to, done.record.seq);
            print_json(&done.entity)
        }
        Command::Show { kind, id } => print_json(&svc.get(kind, id)?),
        Command::History { kind, id } => print_json(&svc.history(kind, id)?),
        Command::Targets { kind, id, actor } => print_json(&svc.allowed_targets_for(kind, id, actor)?),
        Command::Pending { kind } => print_json(&svc.store().list_pending(kind).map_err(vecindapp::WorkflowError::from)?),
        Command::GrantRole { actor, role } => {
            svc.roles().grant(actor, role).map_err(vecindapp::WorkflowError::from)?;
            info!("rol {role} asignado a {actor}");
            Ok(())
        }
        Command::Migrate => Ok(()),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
