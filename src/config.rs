//! Configuración de la aplicación.
//!
//! Se lee una sola vez al arrancar desde variables de entorno (y `.env` si
//! existe). Los valores inválidos son `CoreError::Config`; los ausentes toman
//! los defaults del core.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use chem_core::constants::{DEFAULT_SUBMIT_BUDGET, HEAVY_ATOM_LIMIT};
use chem_core::{GatePolicy, PipelineSettings};
use chem_persistence::DbConfig;
use once_cell::sync::Lazy;

use crate::errors::CoreError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

const PIPELINE_PREFIX: &str = "MOLCALC_PIPELINE_";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub blocked_clients: HashSet<String>,
    pub heavy_atom_limit: usize,
    pub submit_timeout: Duration,
    /// Directorio donde el pipeline deja los trabajos para el backend.
    pub spool_dir: PathBuf,
    pub pipeline_settings: PipelineSettings,
    /// `None` sin `DATABASE_URL`: se usa el store en memoria.
    pub database: Option<DbConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, CoreError>
        where I: IntoIterator<Item = (String, String)>
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let get = |name: &str| vars.get(name).map(String::as_str);

        let blocked_clients = get("MOLCALC_BLOCK_IP").map(parse_block_list).unwrap_or_default();
        let heavy_atom_limit = parse_or(get("MOLCALC_MAX_HEAVY_ATOMS"), "MOLCALC_MAX_HEAVY_ATOMS", HEAVY_ATOM_LIMIT)?;
        let submit_timeout = match get("MOLCALC_SUBMIT_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = parse_or(Some(v), "MOLCALC_SUBMIT_TIMEOUT_SECS", 0)?;
                if secs == 0 {
                    return Err(CoreError::Config("MOLCALC_SUBMIT_TIMEOUT_SECS debe ser > 0".into()));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_SUBMIT_BUDGET,
        };
        let spool_dir = get("MOLCALC_SPOOL_DIR").map(PathBuf::from)
                                                .unwrap_or_else(|| std::env::temp_dir().join("molcalc-spool"));

        let mut pipeline_settings = PipelineSettings::default();
        for (name, value) in vars.iter() {
            if let Some(setting) = name.strip_prefix(PIPELINE_PREFIX) {
                if !setting.is_empty() {
                    pipeline_settings = pipeline_settings.with(setting.to_lowercase(), value.clone());
                }
            }
        }

        let database = get("DATABASE_URL").filter(|url| !url.trim().is_empty())
                                          .map(|url| {
                                              DbConfig::from_parts(url.to_string(),
                                                                   get("DATABASE_MIN_CONNECTIONS"),
                                                                   get("DATABASE_MAX_CONNECTIONS"))
                                          });

        Ok(Self { blocked_clients,
                  heavy_atom_limit,
                  submit_timeout,
                  spool_dir,
                  pipeline_settings,
                  database })
    }

    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy { blocked_clients: self.blocked_clients.clone(),
                     heavy_atom_limit: self.heavy_atom_limit,
                     budget: self.submit_timeout,
                     pipeline_settings: self.pipeline_settings.clone() }
    }
}

fn parse_block_list(raw: &str) -> HashSet<String> {
    raw.split(',')
       .map(str::trim)
       .filter(|ip| !ip.is_empty())
       .map(String::from)
       .collect()
}

fn parse_or<T: std::str::FromStr>(raw: Option<&str>, name: &str, default: T) -> Result<T, CoreError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim()
                    .parse()
                    .map_err(|_| CoreError::Config(format!("{name}={v} no es un número válido"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = AppConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(cfg.heavy_atom_limit, HEAVY_ATOM_LIMIT);
        assert_eq!(cfg.submit_timeout, DEFAULT_SUBMIT_BUDGET);
        assert!(cfg.blocked_clients.is_empty());
        assert!(cfg.database.is_none());
    }

    #[test]
    fn reads_block_list_and_pipeline_settings() {
        let cfg = AppConfig::from_vars(vars(&[("MOLCALC_BLOCK_IP", " 10.0.0.1, ,10.0.0.2"),
                                              ("MOLCALC_PIPELINE_THEORY", "pm3"),
                                              ("MOLCALC_SUBMIT_TIMEOUT_SECS", "5"),
                                              ("DATABASE_URL", "postgres://db/molcalc")])).unwrap();
        assert_eq!(cfg.blocked_clients.len(), 2);
        assert!(cfg.gate_policy().is_blocked("10.0.0.2"));
        assert_eq!(cfg.pipeline_settings.get("theory"), Some("pm3"));
        assert_eq!(cfg.submit_timeout, Duration::from_secs(5));
        assert_eq!(cfg.database.unwrap().url, "postgres://db/molcalc");
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let err = AppConfig::from_vars(vars(&[("MOLCALC_MAX_HEAVY_ATOMS", "many")])).unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m.contains("MOLCALC_MAX_HEAVY_ATOMS")));
        assert!(AppConfig::from_vars(vars(&[("MOLCALC_SUBMIT_TIMEOUT_SECS", "0")])).is_err());
    }
}
