// 视频评论区分析器 - 主库

// 声明模块
pub mod analysis;
pub mod cli;
pub mod commands;
pub mod error;
pub mod llm;
pub mod logger;
pub mod models;
pub mod settings;
pub mod storage;
pub mod utils;

use anyhow::Result;
use tracing::{error, info};

use cli::{Cli, Command};
use commands::{CommandContext, RunSummary};
use llm::LLMManager;
use settings::SettingsManager;

/// 执行一次命令行调用
///
/// 返回各步骤的批处理结果；存在失败的视频时由调用方决定退出码
pub async fn run(cli: Cli) -> Result<RunSummary> {
    let settings = SettingsManager::new(cli.global.config.clone()).await?;
    let config = settings.apply_overrides(cli.global.seed).await;

    // 日志目录：命令行 > 配置文件 > 系统默认位置
    let log_dir = cli
        .global
        .log_dir
        .clone()
        .or_else(|| config.log_dir.clone())
        .unwrap_or_else(utils::default_log_dir);
    let _guard = logger::init(&log_dir, cli.global.verbose)?;

    info!("使用配置文件: {:?}", settings.path());

    // 只有需要调用模型的命令才创建 LLM 客户端
    let force = cli.global.force;
    let context = || -> Result<CommandContext> {
        let llm = LLMManager::from_config(&config.llm)?;
        Ok(CommandContext::new(config.clone(), llm, force))
    };

    let summary = match cli.command {
        Command::Inspect { input } => {
            for stats in commands::inspect(&input, &config.schema)? {
                println!("{}", stats);
            }
            RunSummary::default()
        }
        Command::Comments { input, output } => {
            commands::run_comments(&context()?, &input, &output).await?
        }
        Command::Images {
            input,
            output,
            slice,
            rubric,
            no_rubric,
        } => {
            let rubric = Command::rubric_override(rubric, no_rubric);
            commands::run_images(&context()?, &input, &output, slice, rubric).await?
        }
        Command::Memes { input, report } => {
            commands::run_memes(&context()?, &input, &report).await?
        }
        Command::Run {
            input,
            output,
            report,
        } => commands::run_pipeline(&context()?, &input, &output, report.as_deref()).await?,
    };

    for step in &summary.steps {
        for message in &step.messages {
            error!("[{}] {}", step.step, message);
        }
    }
    if summary.has_failures() {
        error!("共有 {} 个视频处理失败，已保存其余结果", summary.failed());
    } else {
        info!("全部处理完成");
    }

    Ok(summary)
}
