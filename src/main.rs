use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use ricoh_counter::collector::{CounterCollector, FaultPolicy, FetchPolicy};
use ricoh_counter::config::AppConfig;
use ricoh_counter::formatter::{HostResult, JsonFormatter};
use ricoh_counter::snmp::SnmpV2cTransport;

/// Опрашивает счетчики МФУ по SNMPv2c и печатает отчет в JSON.
#[derive(Debug, Parser)]
#[command(name = "ricoh-counter", version, about)]
struct Args {
    /// Хосты принтеров (по умолчанию из SNMP_TARGET)
    #[arg(value_name = "HOST")]
    hosts: Vec<String>,

    /// Файл с таблицей моделей (YAML или JSON)
    #[arg(short, long, default_value = "./profiles/ricoh.yaml")]
    config: PathBuf,

    /// Community string, перекрывает конфигурацию
    #[arg(long)]
    community: Option<String>,

    /// Что подставлять при ошибке транспорта
    #[arg(long, value_enum)]
    fault_mode: Option<FaultPolicy>,

    /// Компактный JSON
    #[arg(long)]
    compact: bool,

    /// Debug логирование
    #[arg(short, long)]
    debug: bool,

    /// Trace логирование
    #[arg(short = 'D', long = "trace")]
    trace: bool,
}

impl Args {
    fn init_tracing(&self) {
        let filter = if self.trace {
            "ricoh_counter=trace"
        } else if self.debug {
            "ricoh_counter=debug"
        } else {
            "ricoh_counter=warn"
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.init_tracing();

    let config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ошибка загрузки конфигурации: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(
        models = config.table.models().count(),
        "Загружена таблица моделей {}",
        args.config.display()
    );

    let hosts = if args.hosts.is_empty() {
        config.get_targets()
    } else {
        args.hosts.clone()
    };
    if hosts.is_empty() {
        eprintln!("Не указан ни один хост (аргументы или SNMP_TARGET)");
        return ExitCode::FAILURE;
    }

    let community = match &args.community {
        Some(community) => community.clone().into_bytes(),
        None => config.get_community(),
    };
    let transport = Arc::new(SnmpV2cTransport::new(&community, config.get_port()));
    let policy = FetchPolicy {
        timeouts: config.get_timeouts(),
        on_fault: args.fault_mode.unwrap_or(config.settings.fault_mode),
    };
    let collector = Arc::new(CounterCollector::new(
        Arc::new(config.table),
        transport,
        policy,
    ));

    // Хосты опрашиваются параллельно, OID одного хоста - последовательно
    let mut tasks = JoinSet::new();
    for (index, host) in hosts.into_iter().enumerate() {
        let collector = collector.clone();
        tasks.spawn(async move {
            let report = collector.get_counters(&host).await;
            (index, (host, report))
        });
    }

    let mut results: Vec<(usize, HostResult)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!("Задача опроса упала: {}", e),
        }
    }
    results.sort_by_key(|(index, _)| *index);
    let results: Vec<HostResult> = results.into_iter().map(|(_, r)| r).collect();

    let output = if args.compact {
        JsonFormatter::to_json_compact(&results)
    } else {
        JsonFormatter::to_json_string(&results)
    };

    match output {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Ошибка JSON сериализации: {}", e);
            ExitCode::FAILURE
        }
    }
}
