use clap::Parser;
use pawcare::config::toml_config::LogFormat;
use pawcare::utils::error::ErrorSeverity;
use pawcare::utils::{logger, validation::Validate};
use pawcare::{CliConfig, Console};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入配置 (TOML -> 環境變數 -> 命令列)
    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match settings.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose, settings.log_level.as_deref()),
        LogFormat::Json => logger::init_json_logger(cli.verbose, settings.log_level.as_deref()),
    }

    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::debug!("🔗 API: {}", settings.api_base_url);

    let console = Console::new(settings);
    match console.run(cli.command).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 1,      // 輸入錯誤
                ErrorSeverity::Medium => 2,   // 可重試
                ErrorSeverity::High => 3,     // API 拒絕
                ErrorSeverity::Critical => 4, // 本機環境問題
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
