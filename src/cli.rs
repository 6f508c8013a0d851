// 命令行参数定义

use crate::analysis::ImageSlice;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "comment-analyzer", version, about = "视频评论区情感与有害图片分析工具")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// 配置文件路径，不存在时写出默认配置
    #[arg(long, global = true, default_value = "comment-analyzer.json")]
    pub config: PathBuf,

    /// 忽略已有结果，重新调用模型
    #[arg(long, global = true)]
    pub force: bool,

    /// 评论抽样的随机种子（覆盖配置文件）
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// 日志目录（覆盖配置文件）
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 分析每个视频的评论区整体氛围
    Comments { input: PathBuf, output: PathBuf },

    /// 判定评论区图片是否有害
    Images {
        input: PathBuf,
        output: PathBuf,

        /// 要判定的图片切片
        #[arg(long, value_enum, default_value_t = ImageSlice::All)]
        slice: ImageSlice,

        /// 附带判定原则（rest/all 的默认行为）
        #[arg(long, conflicts_with = "no_rubric")]
        rubric: bool,

        /// 不附带判定原则（top 的默认行为）
        #[arg(long)]
        no_rubric: bool,
    },

    /// 提取高赞有害图片的模因，写出 JSON 报告
    Memes { input: PathBuf, report: PathBuf },

    /// 依次执行评论区分析、高赞图片、其余图片与模因提取
    Run {
        input: PathBuf,
        output: PathBuf,

        /// 模因报告路径，默认为 `{输出文件名}_memes.json`
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// 只读取数据表，输出每个视频的统计信息
    Inspect { input: PathBuf },
}

impl Command {
    /// 命令行显式指定的判定原则开关
    pub fn rubric_override(rubric: bool, no_rubric: bool) -> Option<bool> {
        match (rubric, no_rubric) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_images_command() {
        let cli = Cli::try_parse_from([
            "comment-analyzer",
            "images",
            "in.csv",
            "out.csv",
            "--slice",
            "top",
            "--rubric",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.global.seed, Some(7));
        match cli.command {
            Command::Images {
                slice,
                rubric,
                no_rubric,
                ..
            } => {
                assert_eq!(slice, ImageSlice::Top);
                assert_eq!(Command::rubric_override(rubric, no_rubric), Some(true));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_rubric_flags() {
        let result = Cli::try_parse_from([
            "comment-analyzer",
            "images",
            "in.csv",
            "out.csv",
            "--rubric",
            "--no-rubric",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["comment-analyzer", "inspect", "in.csv", "--verbose"]).unwrap();
        assert!(cli.global.verbose);
        assert!(matches!(cli.command, Command::Inspect { .. }));
        assert_eq!(Command::rubric_override(false, false), None);
    }
}
