//! 分析命令
//!
//! 每个命令读取数据表、逐个视频调用模型、最后一次性写出结果。
//! 单个视频失败只记录错误并继续处理下一个视频。

use super::{BatchReport, CommandContext, RunSummary};
use crate::analysis::{CommentSentimentAnalyzer, ImageClassifier, ImageSlice, MemeExtractor};
use crate::models::VideoRecord;
use crate::storage::{self, MemeReport};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

type Videos = BTreeMap<String, VideoRecord>;

/// 未指定报告路径时，报告与输出表放在一起：`{stem}_memes.json`
pub fn default_report_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}_memes.json", stem))
}

/// 先确认所有输出都不会覆盖输入，再读取数据表
fn load(ctx: &CommandContext, input: &Path, outputs: &[&Path]) -> Result<Videos> {
    for output in outputs {
        storage::ensure_not_input(input, output)?;
    }
    let (_, videos) = storage::load_videos(input, &ctx.config.schema)
        .with_context(|| format!("读取数据表失败: {:?}", input))?;
    Ok(videos)
}

/// 评论区整体氛围分析
async fn comment_step(ctx: &CommandContext, videos: &mut Videos) -> BatchReport {
    let analyzer =
        CommentSentimentAnalyzer::new(ctx.llm.provider(), &ctx.config.selection, ctx.force);
    let mut report = BatchReport::new("comments", videos.len());

    for (video_id, video) in videos.iter_mut() {
        match analyzer.analyze(video).await {
            Ok(outcome) => {
                report.processed += 1;
                if !outcome.cached {
                    info!("视频 {} 评论区氛围: {}", video_id, outcome.sentiment);
                }
            }
            Err(e) => {
                error!("视频 {} 评论区分析失败: {:#}", video_id, e);
                report.record_failure(video_id, &e);
            }
        }
    }

    report
}

/// 图片有害性判定，`rubric` 为空时按切片的默认方式决定是否附带判定原则
async fn image_step(
    ctx: &CommandContext,
    videos: &mut Videos,
    slice: ImageSlice,
    rubric: Option<bool>,
) -> BatchReport {
    let mut classifier = ImageClassifier::new(
        ctx.llm.provider(),
        &ctx.images,
        &ctx.config.selection,
        slice,
    )
    .with_force(ctx.force);
    if let Some(use_rubric) = rubric {
        classifier = classifier.with_rubric(use_rubric);
    }

    let mut report = BatchReport::new(format!("images:{}", slice.as_str()), videos.len());

    for (video_id, video) in videos.iter_mut() {
        match classifier.classify(video).await {
            Ok(labels) => {
                report.processed += 1;
                if !labels.is_empty() {
                    info!(
                        "视频 {} 完成 {} 张图片判定，有害图片累计 {} 张",
                        video_id,
                        labels.len(),
                        video.harmful_count()
                    );
                }
            }
            Err(e) => {
                error!("视频 {} 图片判定失败: {:#}", video_id, e);
                report.record_failure(video_id, &e);
            }
        }
    }

    report
}

/// 高赞有害图片模因提取
async fn meme_step(ctx: &CommandContext, videos: &Videos, memes: &mut MemeReport) -> BatchReport {
    let extractor = MemeExtractor::new(ctx.llm.provider(), &ctx.images, &ctx.config.selection);
    let mut report = BatchReport::new("memes", videos.len());

    for (video_id, video) in videos {
        match extractor.extract(video).await {
            Ok(found) => {
                report.processed += 1;
                memes.insert(video_id.clone(), found);
            }
            Err(e) => {
                error!("视频 {} 模因提取失败: {:#}", video_id, e);
                report.record_failure(video_id, &e);
            }
        }
    }

    report
}

/// 分析每个视频的评论区整体氛围并写出新表
pub async fn run_comments(ctx: &CommandContext, input: &Path, output: &Path) -> Result<RunSummary> {
    let mut videos = load(ctx, input, &[output])?;
    let report = comment_step(ctx, &mut videos).await;
    info!("{}", report);

    storage::save_comments_sentiment(&videos, input, output, &ctx.config.schema)
        .with_context(|| format!("写出结果失败: {:?}", output))?;
    Ok(report.into())
}

/// 判定指定切片的图片并写出新表
pub async fn run_images(
    ctx: &CommandContext,
    input: &Path,
    output: &Path,
    slice: ImageSlice,
    rubric: Option<bool>,
) -> Result<RunSummary> {
    let mut videos = load(ctx, input, &[output])?;
    let report = image_step(ctx, &mut videos, slice, rubric).await;
    info!("{}", report);

    storage::save_images_sentiment(&videos, input, output, &ctx.config.schema)
        .with_context(|| format!("写出结果失败: {:?}", output))?;
    Ok(report.into())
}

/// 从已标注的数据表中提取高赞有害图片的模因，写出 JSON 报告
pub async fn run_memes(
    ctx: &CommandContext,
    input: &Path,
    report_path: &Path,
) -> Result<RunSummary> {
    let videos = load(ctx, input, &[report_path])?;
    let mut memes = MemeReport::new();
    let report = meme_step(ctx, &videos, &mut memes).await;
    info!("{}", report);

    memes.save(report_path).await?;
    Ok(report.into())
}

/// 完整流水线：评论区氛围 → 高赞图片 → 其余图片 → 模因，最后统一写出
pub async fn run_pipeline(
    ctx: &CommandContext,
    input: &Path,
    output: &Path,
    report_path: Option<&Path>,
) -> Result<RunSummary> {
    let report_path = report_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_report_path(output));

    storage::ensure_not_input(output, &report_path).context("模因报告不能覆盖输出数据表")?;
    let mut videos = load(ctx, input, &[output, report_path.as_path()])?;
    let mut summary = RunSummary::default();

    summary.steps.push(comment_step(ctx, &mut videos).await);
    summary
        .steps
        .push(image_step(ctx, &mut videos, ImageSlice::Top, None).await);
    summary
        .steps
        .push(image_step(ctx, &mut videos, ImageSlice::Rest, None).await);

    let mut memes = MemeReport::new();
    summary.steps.push(meme_step(ctx, &videos, &mut memes).await);

    for step in &summary.steps {
        info!("{}", step);
    }

    storage::save_all_sentiment(&videos, input, output, &ctx.config.schema)
        .with_context(|| format!("写出结果失败: {:?}", output))?;
    memes.save(&report_path).await?;

    Ok(summary)
}
