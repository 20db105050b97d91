use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a Postgres instance")?;
        let max_connections = parse_max_connections(
            std::env::var("DRIFTCARE_DB_MAX_CONNECTIONS").ok().as_deref(),
        )?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<&str>) -> anyhow::Result<u32> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(value) => {
            let parsed: u32 = value
                .parse()
                .with_context(|| format!("DRIFTCARE_DB_MAX_CONNECTIONS is not a number: {value}"))?;
            anyhow::ensure!(parsed > 0, "DRIFTCARE_DB_MAX_CONNECTIONS must be at least 1");
            Ok(parsed)
        }
    }
}
