mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Fusion, LexicalMatch, Postgres, Retrieval, Service, Storage, StorageBackend, Temporal,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.fixture.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.fixture must be non-empty.".to_string(),
		});
	}
	if cfg.storage.backend == StorageBackend::Postgres {
		let Some(postgres) = cfg.storage.postgres.as_ref() else {
			return Err(Error::MissingSection { section: "storage.postgres" });
		};

		if postgres.dsn.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.postgres.dsn must be non-empty.".to_string(),
			});
		}
		if postgres.pool_max_conns == 0 {
			return Err(Error::Validation {
				message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
			});
		}
	}
	if cfg.retrieval.candidate_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.candidate_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !cfg.fusion.rrf_k.is_finite() {
		return Err(Error::Validation {
			message: "fusion.rrf_k must be a finite number.".to_string(),
		});
	}
	if cfg.fusion.rrf_k <= 0.0 {
		return Err(Error::Validation {
			message: "fusion.rrf_k must be greater than zero.".to_string(),
		});
	}
	if cfg.fusion.result_size < 0 {
		return Err(Error::Validation {
			message: "fusion.result_size must be zero or greater.".to_string(),
		});
	}

	for (label, weight) in [
		("fusion.vector_weight", cfg.fusion.vector_weight),
		("fusion.lexical_weight", cfg.fusion.lexical_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight <= 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if let Some(postgres) = cfg.storage.postgres.as_mut() {
		postgres.dsn = postgres.dsn.trim().to_string();
	}
	if cfg.temporal.default_window.as_deref().map(|window| window.trim().is_empty()).unwrap_or(false)
	{
		cfg.temporal.default_window = None;
	}
	if cfg.temporal.category.as_deref().map(|category| category.trim().is_empty()).unwrap_or(false)
	{
		cfg.temporal.category = None;
	}
}
