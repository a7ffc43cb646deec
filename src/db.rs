use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode},
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use tracing::{info, warn};

use crate::auth::repo::{MySqlUserStore, PgUserStore, UserStore};
use crate::config::{DatabaseConfig, DbKind};

const MAX_CONNECTIONS: u32 = 25;
const CONN_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Connect to the configured database, run its migrations and return the
/// matching user store.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    info!(
        db_type = %cfg.kind,
        user = %cfg.user,
        host = %cfg.host,
        port = cfg.port,
        database = %cfg.name,
        "connecting to database"
    );

    match cfg.kind {
        DbKind::Postgres => {
            let ssl_mode: PgSslMode = cfg
                .ssl_mode
                .parse()
                .with_context(|| format!("invalid DB_SSLMODE {:?}", cfg.ssl_mode))?;
            let options = PgConnectOptions::new()
                .host(&cfg.host)
                .port(cfg.port)
                .username(&cfg.user)
                .password(&cfg.password)
                .database(&cfg.name)
                .ssl_mode(ssl_mode);
            let pool = PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .max_lifetime(CONN_MAX_LIFETIME)
                .connect_with(options)
                .await
                .context("connect to postgres")?;

            info!("running database migrations");
            sqlx::migrate!("./migrations/postgres")
                .run(&pool)
                .await
                .context("run postgres migrations")?;

            match sqlx::query_scalar::<_, String>("SELECT version()")
                .fetch_one(&pool)
                .await
            {
                Ok(version) => info!(%version, "connected to database"),
                Err(e) => warn!(error = %e, "could not read server version"),
            }
            Ok(Arc::new(PgUserStore::new(pool)))
        }
        DbKind::MySql => {
            let options = MySqlConnectOptions::new()
                .host(&cfg.host)
                .port(cfg.port)
                .username(&cfg.user)
                .password(&cfg.password)
                .database(&cfg.name)
                .ssl_mode(mysql_ssl_mode(&cfg.ssl_mode));
            let pool = MySqlPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .max_lifetime(CONN_MAX_LIFETIME)
                .connect_with(options)
                .await
                .context("connect to mysql")?;

            info!("running database migrations");
            sqlx::migrate!("./migrations/mysql")
                .run(&pool)
                .await
                .context("run mysql migrations")?;

            match sqlx::query_scalar::<_, String>("SELECT VERSION()")
                .fetch_one(&pool)
                .await
            {
                Ok(version) => info!(%version, "connected to database"),
                Err(e) => warn!(error = %e, "could not read server version"),
            }
            Ok(Arc::new(MySqlUserStore::new(pool)))
        }
    }
}

/// Accepts the libpq-style names used for postgres as well as MySQL's own.
fn mysql_ssl_mode(mode: &str) -> MySqlSslMode {
    match mode.to_ascii_lowercase().as_str() {
        "disable" | "disabled" => MySqlSslMode::Disabled,
        "require" | "required" => MySqlSslMode::Required,
        "verify-ca" | "verify_ca" => MySqlSslMode::VerifyCa,
        "verify-full" | "verify_identity" => MySqlSslMode::VerifyIdentity,
        _ => MySqlSslMode::Preferred,
    }
}
