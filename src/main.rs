use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use freevibes_catalog::cache::{CacheMode, CachePolicy, CacheStore};
use freevibes_catalog::catalog::{CatalogService, CatalogSettings, SearchRequest};
use freevibes_catalog::config::Config;
use freevibes_catalog::fallback::FallbackProvider;
use freevibes_catalog::upstream::{InvidiousUpstream, SearchFilter};

const USAGE: &str = "\
uso: freevibes-catalog <comando> [argumentos] [--opción valor]

comandos:
  search <consulta>        [--filter songs|videos|artists|albums|playlists] [--limit N] [--lang L] [--region R]
  find <consulta>          mejor canción para la consulta
  artists <género>         [--limit N] [--lang L] [--region R]
  artist <id>              [--lang L] [--name NOMBRE]
  top                      [--limit N]
  recommend                [--artist A] [--track T] [--limit N]
  genres <g1,g2,...>       recomendaciones por géneros
  charts [región]          [--limit N]
  releases [región]        [--limit N]
  playlists [región]       [--limit N]
  watch <videoId>          [--limit N]
  purge                    borra entradas expiradas
  status                   estado del upstream y de la caché

opciones globales:
  --no-cache               ignora la caché al leer
  --health-check           sale con 0 si el upstream responde";

/// Positional arguments plus `--name value` options.
struct Args {
    positional: Vec<String>,
    options: HashMap<String, String>,
    flags: Vec<String>,
}

impl Args {
    fn parse(raw: impl Iterator<Item = String>) -> Self {
        let mut positional = Vec::new();
        let mut options = HashMap::new();
        let mut flags = Vec::new();
        let mut raw = raw.peekable();

        while let Some(arg) = raw.next() {
            let Some(name) = arg.strip_prefix("--") else {
                positional.push(arg);
                continue;
            };
            let takes_value =
                !is_flag(name) && raw.peek().is_some_and(|next| !next.starts_with("--"));
            if takes_value {
                options.insert(name.to_string(), raw.next().unwrap_or_default());
            } else {
                flags.push(name.to_string());
            }
        }
        Self {
            positional,
            options,
            flags,
        }
    }

    fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }

    fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    fn number(&self, name: &str, default: usize) -> Result<usize> {
        match self.option(name) {
            Some(value) => value
                .parse()
                .with_context(|| format!("--{} debe ser un número: {}", name, value)),
            None => Ok(default),
        }
    }

    /// Positional arguments after the command, joined with spaces.
    fn rest(&self) -> String {
        self.positional.iter().skip(1).cloned().collect::<Vec<_>>().join(" ")
    }
}

fn is_flag(name: &str) -> bool {
    matches!(name, "no-cache" | "health-check" | "help")
}

fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("freevibes_catalog=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse(std::env::args().skip(1));
    if args.flag("help") || (args.positional.is_empty() && !args.flag("health-check")) {
        println!("{}", USAGE);
        return Ok(());
    }

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
        .context("no se pudo crear el runtime de tokio")?;

    runtime.block_on(async move {
        let service = build_service(&config).await?;

        // Manejar health check si es necesario
        if args.flag("health-check") {
            return health_check(&service).await;
        }

        if let Err(e) = run(&service, &config, &args).await {
            error!("❌ {:#}", e);
            return Err(e);
        }
        Ok(())
    })
}

async fn build_service(config: &Config) -> Result<CatalogService> {
    let upstream = InvidiousUpstream::new(config.upstream_instances.clone(), config.upstream_timeout)?;
    info!("🌐 Upstream con {} instancias", upstream.instances().len());

    let store = CacheStore::open(&config.cache_dir, config.cache_ttl).await?;

    Ok(CatalogService::new(
        Arc::new(upstream),
        CachePolicy::new(store),
        FallbackProvider::new(config.fallback_seed),
        CatalogSettings::from(config),
    ))
}

async fn run(service: &CatalogService, config: &Config, args: &Args) -> Result<()> {
    let mode = CacheMode::from_no_cache(args.flag("no-cache"));
    let region = || {
        args.option("region")
            .or_else(|| args.positional.get(1).map(String::as_str))
            .unwrap_or(&config.default_region)
            .to_string()
    };
    let language = args.option("lang").unwrap_or(&config.default_language);
    let command = args.positional.first().map(String::as_str).unwrap_or_default();

    match command {
        "search" => {
            let filter = match args.option("filter") {
                Some(filter) => filter.parse::<SearchFilter>()?,
                None => SearchFilter::default(),
            };
            let request = SearchRequest::new(args.rest())
                .filter(filter)
                .limit(args.number("limit", 10)?)
                .region(args.option("region").unwrap_or(&config.default_region))
                .language(language)
                .mode(mode);
            print(&service.search(&request).await?)
        }
        "find" => {
            let query = args.rest();
            print(&service.find_track("", "", Some(query.as_str()), mode).await?)
        }
        "artists" => {
            let genre = args.rest();
            let region = args.option("region").unwrap_or(&config.default_region);
            print(
                &service
                    .artists_by_genre(&genre, args.number("limit", 10)?, region, language, mode)
                    .await?,
            )
        }
        "artist" => {
            let id = args.rest();
            print(
                &service
                    .artist_detail(&id, language, args.option("name"), mode)
                    .await?,
            )
        }
        "top" => print(&service.top_artists(args.number("limit", 20)?, mode).await?),
        "recommend" => print(
            &service
                .recommendations(
                    args.option("artist").unwrap_or_default(),
                    args.option("track").unwrap_or_default(),
                    args.number("limit", 10)?,
                    mode,
                )
                .await?,
        ),
        "genres" => {
            let genres: Vec<String> = args
                .rest()
                .split(',')
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect();
            print(
                &service
                    .recommendations_by_genres(&genres, 5, 3, 10, mode)
                    .await?,
            )
        }
        "charts" => print(
            &service
                .charts(&region(), args.number("limit", 20)?, mode)
                .await?,
        ),
        "releases" => print(
            &service
                .new_releases(&region(), args.number("limit", 10)?, mode)
                .await?,
        ),
        "playlists" => print(
            &service
                .featured_playlists(&region(), args.number("limit", 10)?, mode)
                .await?,
        ),
        "watch" => print(
            &service
                .watch_playlist(&args.rest(), args.number("limit", 25)?)
                .await?,
        ),
        "purge" => {
            let removed = service.policy().store().purge_expired().await?;
            info!("🧹 {} entradas expiradas eliminadas", removed);
            print(&serde_json::json!({ "removed": removed }))
        }
        "status" => print(&service.status().await?),
        other => {
            println!("{}", USAGE);
            bail!("comando desconocido: {}", other)
        }
    }
}

async fn health_check(service: &CatalogService) -> Result<()> {
    let status = service.status().await?;
    if status.upstream_available {
        println!("OK");
        Ok(())
    } else {
        bail!(
            "Upstream no disponible: {}",
            status.upstream_error.unwrap_or_default()
        );
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Args {
        Args::parse(line.split_whitespace().map(str::to_string))
    }

    #[test]
    fn test_parse_positional_and_options() {
        let parsed = args("search bad bunny --limit 5 --no-cache --filter artists");
        assert_eq!(parsed.rest(), "bad bunny");
        assert_eq!(parsed.number("limit", 10).unwrap(), 5);
        assert_eq!(parsed.option("filter"), Some("artists"));
        assert!(parsed.flag("no-cache"));
    }

    #[test]
    fn test_flags_never_swallow_the_next_argument() {
        let parsed = args("--no-cache charts ES");
        assert!(parsed.flag("no-cache"));
        assert_eq!(parsed.positional, vec!["charts".to_string(), "ES".to_string()]);
        assert!(args("top --limit many").number("limit", 1).is_err());
    }
}
