//! # Database Migrations
//!
//! Signed, step-wise schema migrations loaded at runtime from
//! `DB_MIGRATION_PATH`.
//!
//! ## How Stepping Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Stepping                                 │
//! │                                                                         │
//! │  run_migration(steps)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Load migrations/postgres/*.sql  ──(fails)──► DbError::MigrationFailed │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Open a dedicated connection     ──(fails)──► DbError::MigrationFailed │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Take advisory lock, check _sqlx_migrations                            │
//! │       │                                                                 │
//! │       ├── steps > 0: apply next N pending   0001 ✓  0002 ⬜ ──► ✓     │
//! │       ├── steps < 0: revert last N applied  0002 ✓ ──► ⬜ (down.sql)   │
//! │       └── steps = 0: nothing                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MigrationReport { applied, reverted, current_version, warning }       │
//! │                                                                         │
//! │  Anything that goes wrong after the connection is open becomes a       │
//! │  MigrationWarning: logged with warn!, never an Err.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a pair in `migrations/postgres/` with the next version number
//! 2. Name format: `NNNN_description.up.sql` and `NNNN_description.down.sql`
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. **NEVER** modify existing migrations - always add new ones

use std::collections::BTreeSet;

use sqlx::migrate::{Migrate, MigrateError, Migration, Migrator};
use sqlx::{Connection, PgConnection};
use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::dsn;
use crate::error::{DbError, DbResult, MigrationWarning};

// =============================================================================
// Report
// =============================================================================

/// Outcome of one `run_migration` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// The signed step count that was asked for.
    pub requested: i64,

    /// Versions applied by this call, in order.
    pub applied: Vec<i64>,

    /// Versions reverted by this call, in order.
    pub reverted: Vec<i64>,

    /// Highest applied version afterwards, `None` for an empty schema or
    /// when the tracking table could not be read.
    pub current_version: Option<i64>,

    /// Set when stepping stopped early or had nothing to do.
    pub warning: Option<MigrationWarning>,
}

impl MigrationReport {
    fn new(requested: i64) -> Self {
        MigrationReport {
            requested,
            applied: Vec::new(),
            reverted: Vec::new(),
            current_version: None,
            warning: None,
        }
    }

    /// True when every requested step ran.
    pub fn is_complete(&self) -> bool {
        self.warning.is_none()
    }

    /// True when the schema changed during this call.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty() || !self.reverted.is_empty()
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Applies `steps` migrations relative to the current version.
///
/// Positive values apply pending migrations, negative values revert applied
/// ones. Runs on its own connection so the pool is never blocked by DDL.
///
/// ## Errors
/// [`DbError::MigrationFailed`] only if the migration source cannot be read
/// or the connection cannot be opened. Everything else is reported through
/// [`MigrationReport::warning`].
pub async fn run_steps(config: &DbConfig, steps: i64) -> DbResult<MigrationReport> {
    let migrator = load(config).await?;

    info!(
        steps = steps,
        available = migrator.migrations.len(),
        "Stepping database migrations"
    );

    let mut conn = connect(config).await?;
    let report = step(&mut conn, &migrator, steps).await;

    if let Err(e) = conn.close().await {
        debug!(error = %e, "Migration connection did not close cleanly");
    }

    match &report.warning {
        Some(warning) => warn!(
            steps = steps,
            applied = report.applied.len(),
            reverted = report.reverted.len(),
            current_version = ?report.current_version,
            warning = %warning,
            "Migration stepping finished with a warning"
        ),
        None => info!(
            applied = report.applied.len(),
            reverted = report.reverted.len(),
            current_version = ?report.current_version,
            "Migrations stepped successfully"
        ),
    }

    Ok(report)
}

/// Returns information about migrations.
///
/// ## Returns
/// Tuple of (available up migrations, applied migrations)
///
/// ## Usage
/// For diagnostics and health checks.
pub async fn migration_status(config: &DbConfig) -> DbResult<(usize, usize)> {
    let migrator = load(config).await?;
    let available = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .count();

    let mut conn = connect(config).await?;
    let applied = match conn.ensure_migrations_table().await {
        Ok(()) => conn.list_applied_migrations().await,
        Err(e) => Err(e),
    };
    if let Err(e) = conn.close().await {
        debug!(error = %e, "Migration connection did not close cleanly");
    }

    Ok((available, applied?.len()))
}

// =============================================================================
// Internals
// =============================================================================

async fn load(config: &DbConfig) -> DbResult<Migrator> {
    let dir = config.migration_dir();
    Migrator::new(dir.as_path()).await.map_err(|e| {
        DbError::MigrationFailed(format!(
            "could not load migrations from {}: {}",
            dir.display(),
            e
        ))
    })
}

async fn connect(config: &DbConfig) -> DbResult<PgConnection> {
    let options = dsn::connect_options(config)?;
    PgConnection::connect_with(&options).await.map_err(|e| {
        DbError::MigrationFailed(format!("could not open migration connection: {}", e))
    })
}

async fn step(conn: &mut PgConnection, migrator: &Migrator, steps: i64) -> MigrationReport {
    let mut report = MigrationReport::new(steps);

    if steps == 0 {
        report.warning = Some(MigrationWarning::NoChange);
        return report;
    }

    if let Err(e) = conn.lock().await {
        report.warning = Some(tracking(e));
        return report;
    }

    if let Err(warning) = step_locked(conn, migrator, &mut report).await {
        report.warning = Some(warning);
    }

    if let Err(e) = conn.unlock().await {
        warn!(error = %e, "Could not release migration lock");
        report.warning.get_or_insert(tracking(e));
    }

    report
}

async fn step_locked(
    conn: &mut PgConnection,
    migrator: &Migrator,
    report: &mut MigrationReport,
) -> Result<(), MigrationWarning> {
    conn.ensure_migrations_table().await.map_err(tracking)?;

    if let Some(version) = conn.dirty_version().await.map_err(tracking)? {
        return Err(MigrationWarning::Dirty { version });
    }

    let mut applied: BTreeSet<i64> = conn
        .list_applied_migrations()
        .await
        .map_err(tracking)?
        .into_iter()
        .map(|m| m.version)
        .collect();
    report.current_version = applied.last().copied();

    let plan = plan(&migrator.migrations, &applied, report.requested);

    for migration in plan.migrations {
        let result = match plan.direction {
            Direction::Up => conn.apply(migration).await,
            Direction::Down => conn.revert(migration).await,
        };

        let elapsed = result.map_err(|e| MigrationWarning::Step {
            version: migration.version,
            message: e.to_string(),
        })?;

        match plan.direction {
            Direction::Up => {
                applied.insert(migration.version);
                report.applied.push(migration.version);
            }
            Direction::Down => {
                applied.remove(&migration.version);
                report.reverted.push(migration.version);
            }
        }
        report.current_version = applied.last().copied();

        info!(
            version = migration.version,
            description = %migration.description,
            direction = ?plan.direction,
            elapsed_ms = elapsed.as_millis() as u64,
            "Migration step complete"
        );
    }

    plan.warning.map_or(Ok(()), Err)
}

fn tracking(err: MigrateError) -> MigrationWarning {
    MigrationWarning::Tracking {
        message: err.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// The scripts to run for one call, decided before touching the schema.
#[derive(Debug)]
struct Plan<'m> {
    direction: Direction,
    migrations: Vec<&'m Migration>,
    warning: Option<MigrationWarning>,
}

fn plan<'m>(migrations: &'m [Migration], applied: &BTreeSet<i64>, steps: i64) -> Plan<'m> {
    let requested = steps.unsigned_abs();

    if steps >= 0 {
        let mut pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .filter(|m| !applied.contains(&m.version))
            .collect();
        pending.sort_by_key(|m| m.version);
        pending.truncate(requested as usize);

        let warning = shortfall(requested, pending.len());
        return Plan {
            direction: Direction::Up,
            migrations: pending,
            warning,
        };
    }

    let mut reverts = Vec::new();
    let mut warning = None;
    for version in applied.iter().rev().take(requested as usize) {
        let down = migrations
            .iter()
            .find(|m| m.version == *version && m.migration_type.is_down_migration());
        match down {
            Some(migration) => reverts.push(migration),
            None => {
                warning = Some(MigrationWarning::MissingDownMigration { version: *version });
                break;
            }
        }
    }

    Plan {
        direction: Direction::Down,
        warning: warning.or_else(|| shortfall(requested, reverts.len())),
        migrations: reverts,
    }
}

fn shortfall(requested: u64, available: usize) -> Option<MigrationWarning> {
    let available = available as u64;
    if available == 0 {
        Some(MigrationWarning::NoChange)
    } else if available < requested {
        Some(MigrationWarning::ShortLimit {
            requested,
            applied: available,
        })
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn migration_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, sql) in files {
            fs::write(dir.path().join(name), sql).unwrap();
        }
        dir
    }

    fn reversible_pair() -> TempDir {
        migration_dir(&[
            ("0001_create_pet.up.sql", "CREATE TABLE pet (id TEXT PRIMARY KEY);"),
            ("0001_create_pet.down.sql", "DROP TABLE pet;"),
            ("0002_pet_name.up.sql", "CREATE INDEX pet_name ON pet (name);"),
            ("0002_pet_name.down.sql", "DROP INDEX pet_name;"),
        ])
    }

    async fn load_dir(dir: &TempDir) -> Migrator {
        Migrator::new(dir.path()).await.unwrap()
    }

    fn versions(plan: &Plan<'_>) -> Vec<i64> {
        plan.migrations.iter().map(|m| m.version).collect()
    }

    #[tokio::test]
    async fn test_load_reads_runtime_directory() {
        let dir = reversible_pair();
        let config = DbConfig::new(
            "postgres://localhost/pets",
            format!("file://{}", dir.path().display()),
        );

        let migrator = load(&config).await.unwrap();
        let ups = migrator
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .count();
        assert_eq!(ups, 2);
    }

    #[tokio::test]
    async fn test_load_missing_directory_fails() {
        let config = DbConfig::new("postgres://localhost/pets", "/definitely/not/here");
        let err = load(&config).await.unwrap_err();
        assert!(matches!(err, DbError::MigrationFailed(_)));
    }

    #[tokio::test]
    async fn test_plan_up_applies_pending_in_order() {
        let dir = reversible_pair();
        let migrator = load_dir(&dir).await;

        let plan = plan(&migrator.migrations, &BTreeSet::new(), 2);
        assert_eq!(plan.direction, Direction::Up);
        assert_eq!(versions(&plan), vec![1, 2]);
        assert_eq!(plan.warning, None);

        let applied = BTreeSet::from([1]);
        let plan = super::plan(&migrator.migrations, &applied, 1);
        assert_eq!(versions(&plan), vec![2]);
    }

    #[tokio::test]
    async fn test_plan_up_short_limit() {
        let dir = reversible_pair();
        let migrator = load_dir(&dir).await;

        let plan = plan(&migrator.migrations, &BTreeSet::new(), 5);
        assert_eq!(versions(&plan), vec![1, 2]);
        assert_eq!(
            plan.warning,
            Some(MigrationWarning::ShortLimit {
                requested: 5,
                applied: 2
            })
        );
    }

    #[tokio::test]
    async fn test_plan_up_nothing_pending() {
        let dir = reversible_pair();
        let migrator = load_dir(&dir).await;

        let plan = plan(&migrator.migrations, &BTreeSet::from([1, 2]), 1);
        assert!(plan.migrations.is_empty());
        assert_eq!(plan.warning, Some(MigrationWarning::NoChange));
    }

    #[tokio::test]
    async fn test_plan_down_reverts_latest_first() {
        let dir = reversible_pair();
        let migrator = load_dir(&dir).await;
        let applied = BTreeSet::from([1, 2]);

        let plan = plan(&migrator.migrations, &applied, -2);
        assert_eq!(plan.direction, Direction::Down);
        assert_eq!(versions(&plan), vec![2, 1]);
        assert!(plan
            .migrations
            .iter()
            .all(|m| m.migration_type.is_down_migration()));
        assert_eq!(plan.warning, None);
    }

    #[tokio::test]
    async fn test_plan_down_on_empty_schema() {
        let dir = reversible_pair();
        let migrator = load_dir(&dir).await;

        let plan = plan(&migrator.migrations, &BTreeSet::new(), -1);
        assert!(plan.migrations.is_empty());
        assert_eq!(plan.warning, Some(MigrationWarning::NoChange));
    }

    #[tokio::test]
    async fn test_plan_down_without_down_script() {
        let dir = migration_dir(&[(
            "0001_create_pet.up.sql",
            "CREATE TABLE pet (id TEXT PRIMARY KEY);",
        )]);
        let migrator = load_dir(&dir).await;

        let plan = plan(&migrator.migrations, &BTreeSet::from([1]), -1);
        assert!(plan.migrations.is_empty());
        assert_eq!(
            plan.warning,
            Some(MigrationWarning::MissingDownMigration { version: 1 })
        );
    }

    #[test]
    fn test_report_flags() {
        let mut report = MigrationReport::new(1);
        assert!(report.is_complete());
        assert!(!report.changed());

        report.applied.push(1);
        report.warning = Some(MigrationWarning::ShortLimit {
            requested: 2,
            applied: 1,
        });
        assert!(report.changed());
        assert!(!report.is_complete());
    }
}
