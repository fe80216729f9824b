use anyhow::Context;
use brt_tracking::app::{retry_with_policy, RetryPolicy};
use brt_tracking::utils::error::{BrtError, ErrorSeverity};
use brt_tracking::utils::logger::{self, LogFormat};
use brt_tracking::utils::validation::Validate;
use brt_tracking::{BrtConfig, BrtTrackingClient, Cli, Command, WsdlCache};
use clap::Parser;
use serde_json::{json, Value};
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "brt.toml";

fn load_config(cli: &Cli) -> brt_tracking::Result<BrtConfig> {
    let config = match &cli.config {
        Some(path) => BrtConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => BrtConfig::from_file(DEFAULT_CONFIG_FILE)?,
        None => BrtConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn run(command: &Command, config: &BrtConfig) -> brt_tracking::Result<Value> {
    if let Command::CacheWsdl = command {
        let cache = WsdlCache::new(
            &config.wsdl_cache_path,
            config.definition_urls(),
            config.transport_settings(),
        );
        let report = cache.cache_and_patch().await?;
        return Ok(json!({
            "cache_dir": cache.cache_dir(),
            "cached": report.cached,
            "skipped": report
                .skipped
                .iter()
                .map(|(url, reason)| json!({ "url": url, "reason": reason }))
                .collect::<Vec<_>>(),
        }));
    }

    let client = BrtTrackingClient::from_config(config);
    let policy = RetryPolicy::from(&config.retry);

    let value = match command {
        Command::CacheWsdl => Value::Null,
        Command::Track {
            shipment_id,
            year,
            lang,
        } => to_value(
            retry_with_policy(policy, || {
                client.track_by_id(shipment_id, *year, lang.as_deref())
            })
            .await?,
        )?,
        Command::IdByRmn { reference } => {
            json!(retry_with_policy(policy, || client.shipment_id_by_rmn(reference)).await?)
        }
        Command::IdByRma { reference } => {
            json!(retry_with_policy(policy, || client.shipment_id_by_rma(reference)).await?)
        }
        Command::IdByParcel { parcel_id } => to_value(
            retry_with_policy(policy, || client.shipment_id_by_parcel(parcel_id)).await?,
        )?,
        Command::StatusLegend { lang } => to_value(
            retry_with_policy(policy, || client.status_legend(lang.as_deref())).await?,
        )?,
        Command::EventLegend { lang } => to_value(
            retry_with_policy(policy, || client.event_legend(lang.as_deref())).await?,
        )?,
    };
    Ok(value)
}

fn to_value<T: serde::Serialize>(record: T) -> brt_tracking::Result<Value> {
    serde_json::to_value(record).map_err(|e| BrtError::transport(format!("cannot encode result: {}", e)))
}

fn exit_with(e: &BrtError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ BRT call failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2, // 可重試
        ErrorSeverity::High => 1,   // BRT 拒絕
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(cli.verbose, "info", LogFormat::Compact);
            tracing::error!("❌ Configuration validation failed: {}", e);
            exit_with(&e);
        }
    };

    // 初始化日誌
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        config.log_format()
    };
    logger::init_cli_logger(cli.verbose, &config.logging.level, format);

    tracing::info!("🚀 Starting brt-tracking");
    if cli.verbose {
        tracing::debug!("Command: {:?}", cli.command);
    }

    match run(&cli.command, &config).await {
        Ok(value) => {
            let output = serde_json::to_string_pretty(&value).context("rendering result")?;
            println!("{}", output);
            tracing::info!("✅ Done");
            Ok(())
        }
        Err(e) => exit_with(&e),
    }
}
