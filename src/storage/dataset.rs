//! 评论数据表
//!
//! 一行一条评论，视频 ID 在行间重复。负责：
//! - 读取 CSV 并按视频 ID 聚合为 `VideoRecord`
//! - 将评论区情感与图片情感按标识写回，输出到新的 CSV 文件
//!
//! 原始列和行顺序在写回时保持不变，缺失的情感列在首次使用时追加为空列。

use crate::error::{DatasetError, DatasetResult};
use crate::models::{
    CommentSentiment, ImageComment, ImageId, ImageSentiment, ImageSource, PlainComment,
    VideoRecord,
};
use crate::utils::same_file;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// 数据表列名配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub video_id: String,
    /// 视频描述（标题）
    pub title: String,
    pub comment: String,
    /// 图片标识（用户评论 ID）
    pub image_id: String,
    /// 非空即为图片评论
    pub image_url: String,
    pub likes: String,
    /// 非空的行承载视频级字段
    pub link: String,
    pub cover: String,
    pub overall_sentiment: String,
    pub pn_sentiment: String,
    pub image_sentiment: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            video_id: "video_id".to_string(),
            title: "desc".to_string(),
            comment: "comment".to_string(),
            image_id: "cid".to_string(),
            image_url: "image_url".to_string(),
            likes: "digg_count".to_string(),
            link: "Link".to_string(),
            cover: "cover".to_string(),
            overall_sentiment: "overall_sentiment".to_string(),
            pn_sentiment: "pn_sentiment".to_string(),
            image_sentiment: "image_sentiment".to_string(),
        }
    }
}

impl TableSchema {
    fn required_columns(&self) -> [&str; 6] {
        [
            &self.video_id,
            &self.title,
            &self.comment,
            &self.image_id,
            &self.image_url,
            &self.likes,
        ]
    }
}

/// 内存中的评论数据表
#[derive(Debug, Clone)]
pub struct CommentTable {
    schema: TableSchema,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CommentTable {
    /// 从文件读取数据表
    pub fn read(path: &Path, schema: &TableSchema) -> DatasetResult<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file, schema)?;
        info!("已读取数据表 {:?}: {} 行", path, table.rows.len());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, schema: &TableSchema) -> DatasetResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        for column in schema.required_columns() {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetError::MissingColumn(column.to_string()));
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        let mut table = Self {
            schema: schema.clone(),
            headers,
            rows,
        };

        // 情感列缺失时补为空列
        table.ensure_column(&schema.overall_sentiment);
        table.ensure_column(&schema.pn_sentiment);
        table.ensure_column(&schema.image_sentiment);

        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    fn cell(&self, row: usize, column: Option<usize>) -> Option<&str> {
        let value = self.rows[row].get(column?)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// 表格行号（1 起始，含表头）
    fn line_number(row: usize) -> usize {
        row + 2
    }

    /// 按视频 ID 分组，得到每个视频的行下标（保持原始顺序）
    fn group_rows(&self) -> BTreeMap<String, Vec<usize>> {
        let id_col = self.column(&self.schema.video_id);
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for index in 0..self.rows.len() {
            match self.cell(index, id_col) {
                Some(id) => groups.entry(id.to_string()).or_default().push(index),
                None => warn!("第 {} 行缺少视频 ID，已忽略", Self::line_number(index)),
            }
        }
        groups
    }

    /// 承载视频级字段的行：Link 非空的行；没有 Link 列或该视频没有 Link 值时为第一行
    fn anchor_rows(&self, rows: &[usize]) -> Vec<usize> {
        let linked: Vec<usize> = match self.column(&self.schema.link) {
            Some(link_col) => rows
                .iter()
                .copied()
                .filter(|&row| self.cell(row, Some(link_col)).is_some())
                .collect(),
            None => Vec::new(),
        };
        if linked.is_empty() {
            rows.first().copied().into_iter().collect()
        } else {
            linked
        }
    }

    /// 解析为视频实例，键为视频 ID
    pub fn videos(&self) -> DatasetResult<BTreeMap<String, VideoRecord>> {
        let schema = &self.schema;
        let title_col = self.column(&schema.title);
        let comment_col = self.column(&schema.comment);
        let image_id_col = self.column(&schema.image_id);
        let image_url_col = self.column(&schema.image_url);
        let likes_col = self.column(&schema.likes);
        let cover_col = self.column(&schema.cover);
        let overall_col = self.column(&schema.overall_sentiment);
        let pn_col = self.column(&schema.pn_sentiment);
        let image_sentiment_col = self.column(&schema.image_sentiment);

        let mut videos = BTreeMap::new();

        for (video_id, rows) in self.group_rows() {
            let info_row = self
                .anchor_rows(&rows)
                .first()
                .copied()
                .unwrap_or(rows[0]);

            let mut video = VideoRecord::new(
                video_id.clone(),
                self.cell(info_row, title_col).map(str::to_string),
            );
            video.cover = self.cell(info_row, cover_col).and_then(ImageSource::parse);
            video.overall_sentiment = self.cell(info_row, overall_col).map(str::to_string);
            video.pn_sentiment = self
                .cell(info_row, pn_col)
                .map(|raw| {
                    raw.parse::<CommentSentiment>()
                        .map_err(|_| DatasetError::InvalidLabel {
                            row: Self::line_number(info_row),
                            column: schema.pn_sentiment.clone(),
                            value: raw.to_string(),
                        })
                })
                .transpose()?;

            let mut seen_images = HashSet::new();
            for &row in &rows {
                let likes = parse_likes(self.cell(row, likes_col), row)?;
                let comment = self.cell(row, comment_col).map(str::to_string);

                if self.cell(row, image_url_col).is_some() {
                    let id = self
                        .cell(row, image_id_col)
                        .map(ImageId::new)
                        .ok_or(DatasetError::MissingImageId {
                            row: Self::line_number(row),
                        })?;
                    if !seen_images.insert(id.clone()) {
                        return Err(DatasetError::DuplicateImage {
                            video_id,
                            image_id: id.to_string(),
                        });
                    }
                    let sentiment = self
                        .cell(row, image_sentiment_col)
                        .map(|raw| {
                            raw.parse::<ImageSentiment>()
                                .map_err(|_| DatasetError::InvalidLabel {
                                    row: Self::line_number(row),
                                    column: schema.image_sentiment.clone(),
                                    value: raw.to_string(),
                                })
                        })
                        .transpose()?;
                    video.images.push(ImageComment {
                        id,
                        likes,
                        text: comment,
                        sentiment,
                    });
                } else if let Some(content) = comment {
                    video.comments.push(PlainComment { content, likes });
                }
            }

            videos.insert(video_id, video);
        }

        Ok(videos)
    }

    /// 写入评论区整体情感（只改动承载视频级字段的行）
    pub fn apply_comment_sentiment(&mut self, videos: &BTreeMap<String, VideoRecord>) -> usize {
        let overall_col = self.ensure_column(&self.schema.overall_sentiment.clone());
        let pn_col = self.ensure_column(&self.schema.pn_sentiment.clone());
        let mut updated = 0;

        for (video_id, rows) in self.group_rows() {
            let Some(video) = videos.get(&video_id) else {
                continue;
            };
            for row in self.anchor_rows(&rows) {
                self.rows[row][overall_col] = video.overall_sentiment.clone().unwrap_or_default();
                self.rows[row][pn_col] = video
                    .pn_sentiment
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default();
                updated += 1;
            }
        }

        updated
    }

    /// 按 (视频 ID, 图片标识) 写入图片情感
    pub fn apply_image_sentiment(&mut self, videos: &BTreeMap<String, VideoRecord>) -> usize {
        let sentiment_col = self.ensure_column(&self.schema.image_sentiment.clone());
        let image_id_col = self.column(&self.schema.image_id);
        let image_url_col = self.column(&self.schema.image_url);
        let mut updated = 0;

        for (video_id, rows) in self.group_rows() {
            let Some(video) = videos.get(&video_id) else {
                continue;
            };
            for row in rows {
                if self.cell(row, image_url_col).is_none() {
                    continue;
                }
                let Some(id) = self.cell(row, image_id_col).map(ImageId::new) else {
                    continue;
                };
                if let Some(image) = video.images.iter().find(|image| image.id == id) {
                    self.rows[row][sentiment_col] = image
                        .sentiment
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default();
                    updated += 1;
                }
            }
        }

        updated
    }

    pub fn write_to<W: Write>(&self, writer: W) -> DatasetResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// 写入新的文件，拒绝覆盖输入文件
    pub fn write(&self, input: &Path, output: &Path) -> DatasetResult<()> {
        ensure_not_input(input, output)?;
        crate::utils::ensure_parent_dir(output)?;
        let file = std::fs::File::create(output)?;
        self.write_to(std::io::BufWriter::new(file))?;
        info!("已保存到 {:?}", output);
        Ok(())
    }
}

/// 输出文件（数据表或报告）不能指向输入文件
pub fn ensure_not_input(input: &Path, output: &Path) -> DatasetResult<()> {
    if same_file(input, output) {
        return Err(DatasetError::OutputIsInput(output.display().to_string()));
    }
    Ok(())
}

/// 点赞数：空值视为 0，兼容 `12.0` 这类浮点写法，小数部分非零时报错
fn parse_likes(raw: Option<&str>, row: usize) -> DatasetResult<u64> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(value);
    }
    match raw.parse::<f64>() {
        // 只接受整数值的浮点写法，且不超过 u64 范围
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 => {
            Ok(value as u64)
        }
        _ => Err(DatasetError::InvalidLikeCount {
            row: CommentTable::line_number(row),
            value: raw.to_string(),
        }),
    }
}

/// 读取数据表并解析出所有视频
pub fn load_videos(
    path: &Path,
    schema: &TableSchema,
) -> DatasetResult<(CommentTable, BTreeMap<String, VideoRecord>)> {
    let table = CommentTable::read(path, schema)?;
    let videos = table.videos()?;
    info!("共解析出 {} 个视频", videos.len());
    Ok((table, videos))
}

/// 将评论区情感写入新的 CSV 文件
pub fn save_comments_sentiment(
    videos: &BTreeMap<String, VideoRecord>,
    input: &Path,
    output: &Path,
    schema: &TableSchema,
) -> DatasetResult<()> {
    let mut table = CommentTable::read(input, schema)?;
    let updated = table.apply_comment_sentiment(videos);
    info!("写入评论区情感: {} 行", updated);
    table.write(input, output)
}

/// 将图片情感写入新的 CSV 文件
pub fn save_images_sentiment(
    videos: &BTreeMap<String, VideoRecord>,
    input: &Path,
    output: &Path,
    schema: &TableSchema,
) -> DatasetResult<()> {
    let mut table = CommentTable::read(input, schema)?;
    let updated = table.apply_image_sentiment(videos);
    info!("写入图片情感: {} 行", updated);
    table.write(input, output)
}

/// 同时写入评论区情感与图片情感
pub fn save_all_sentiment(
    videos: &BTreeMap<String, VideoRecord>,
    input: &Path,
    output: &Path,
    schema: &TableSchema,
) -> DatasetResult<()> {
    let mut table = CommentTable::read(input, schema)?;
    let comment_rows = table.apply_comment_sentiment(videos);
    let image_rows = table.apply_image_sentiment(videos);
    info!(
        "写入情感结果: 评论区 {} 行, 图片 {} 行",
        comment_rows, image_rows
    );
    table.write(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
video_id,desc,comment,cid,image_url,digg_count,Link
100,跨国情侣日常,,,,,https://v.example/100
100,,好甜,1,,12,
100,,哈哈哈,2,img/2.jpg,30,
100,,,3,img/3.jpg,5.0,
200,,第一条,7,,,https://v.example/200
200,,图,8,img/8.jpg,3,
";

    fn sample_table() -> CommentTable {
        CommentTable::from_reader(SAMPLE.as_bytes(), &TableSchema::default()).unwrap()
    }

    #[test]
    fn test_group_rows_into_videos() {
        let videos = sample_table().videos().unwrap();
        assert_eq!(videos.len(), 2);

        let video = &videos["100"];
        assert_eq!(video.title, "跨国情侣日常");
        assert_eq!(video.comments.len(), 1);
        assert_eq!(video.comments[0].content, "好甜");
        assert_eq!(video.comments[0].likes, 12);
        assert_eq!(video.images.len(), 2);
        assert_eq!(video.images[0].id, ImageId::new("2"));
        assert_eq!(video.images[0].text.as_deref(), Some("哈哈哈"));
        assert_eq!(video.images[1].likes, 5);
        assert_eq!(video.images[1].text, None);
        assert!(video.images.iter().all(|image| image.sentiment.is_none()));

        let video = &videos["200"];
        assert_eq!(video.title, "无标题_200");
        assert_eq!(video.comments[0].likes, 0);
    }

    #[test]
    fn test_missing_sentiment_columns_are_created() {
        let table = sample_table();
        for column in ["overall_sentiment", "pn_sentiment", "image_sentiment"] {
            assert!(table.headers().iter().any(|h| h == column));
        }
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "video_id,desc,comment,cid,digg_count\n1,,hi,1,0\n";
        let err = CommentTable::from_reader(csv.as_bytes(), &TableSchema::default()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "image_url"));
    }

    #[test]
    fn test_invalid_like_count() {
        let csv = "video_id,desc,comment,cid,image_url,digg_count\n1,,hi,1,,-3\n";
        let table = CommentTable::from_reader(csv.as_bytes(), &TableSchema::default()).unwrap();
        let err = table.videos().unwrap_err();
        assert!(matches!(err, DatasetError::InvalidLikeCount { row: 2, .. }));
    }

    #[test]
    fn test_invalid_stored_label() {
        let csv = "video_id,desc,comment,cid,image_url,digg_count,image_sentiment\n\
                   1,,,1,a.jpg,0,sort of harmful\n";
        let table = CommentTable::from_reader(csv.as_bytes(), &TableSchema::default()).unwrap();
        assert!(matches!(
            table.videos().unwrap_err(),
            DatasetError::InvalidLabel { row: 2, .. }
        ));
    }

    #[test]
    fn test_duplicate_image_id() {
        let csv = "video_id,desc,comment,cid,image_url,digg_count\n\
                   1,,,9,a.jpg,0\n\
                   1,,,9,b.jpg,0\n";
        let table = CommentTable::from_reader(csv.as_bytes(), &TableSchema::default()).unwrap();
        assert!(matches!(
            table.videos().unwrap_err(),
            DatasetError::DuplicateImage { .. }
        ));
    }

    #[test]
    fn test_write_back_sentiment() {
        let mut table = sample_table();
        let mut videos = table.videos().unwrap();

        let video = videos.get_mut("100").unwrap();
        video.overall_sentiment = Some("评论区以调侃为主".to_string());
        video.pn_sentiment = Some(CommentSentiment::Negative);
        video.images[0].sentiment = Some(ImageSentiment::Harmful);

        assert_eq!(table.apply_comment_sentiment(&videos), 2);
        assert_eq!(table.apply_image_sentiment(&videos), 3);

        let reloaded = table.videos().unwrap();
        let video = &reloaded["100"];
        assert_eq!(video.pn_sentiment, Some(CommentSentiment::Negative));
        assert_eq!(video.overall_sentiment.as_deref(), Some("评论区以调侃为主"));
        assert_eq!(video.images[0].sentiment, Some(ImageSentiment::Harmful));
        assert_eq!(video.images[1].sentiment, None);
        assert_eq!(reloaded["200"].pn_sentiment, None);
    }

    #[test]
    fn test_first_row_anchors_without_link_column() {
        let csv = "video_id,desc,comment,cid,image_url,digg_count\n\
                   5,标题,一,1,,1\n\
                   5,,二,2,,2\n";
        let mut table = CommentTable::from_reader(csv.as_bytes(), &TableSchema::default()).unwrap();
        let mut videos = table.videos().unwrap();
        videos.get_mut("5").unwrap().pn_sentiment = Some(CommentSentiment::Positive);
        assert_eq!(table.apply_comment_sentiment(&videos), 1);
        assert_eq!(
            table.videos().unwrap()["5"].pn_sentiment,
            Some(CommentSentiment::Positive)
        );
    }

    #[test]
    fn test_first_row_anchors_when_video_has_no_link() {
        let csv = "video_id,desc,comment,cid,image_url,digg_count,Link\n\
                   1,有链接,,,,,https://v/1\n\
                   2,无链接,一,1,,1,\n\
                   2,,二,2,,2,\n";
        let mut table = CommentTable::from_reader(csv.as_bytes(), &TableSchema::default()).unwrap();
        let mut videos = table.videos().unwrap();
        for video in videos.values_mut() {
            video.overall_sentiment = Some(format!("{} 的评论区", video.title));
            video.pn_sentiment = Some(CommentSentiment::Negative);
        }
        assert_eq!(table.apply_comment_sentiment(&videos), 2);

        let reloaded = table.videos().unwrap();
        let video = &reloaded["2"];
        assert_eq!(video.pn_sentiment, Some(CommentSentiment::Negative));
        assert_eq!(video.overall_sentiment.as_deref(), Some("无链接 的评论区"));
        assert!(video.has_comment_sentiment());
    }

    #[test]
    fn test_like_count_must_be_whole_number() {
        assert_eq!(parse_likes(Some("12.0"), 0).unwrap(), 12);
        assert_eq!(parse_likes(Some("7"), 0).unwrap(), 7);
        assert_eq!(parse_likes(None, 0).unwrap(), 0);
        for raw in ["12.7", "1e30", "NaN", "inf", "-1"] {
            assert!(
                matches!(
                    parse_likes(Some(raw), 3),
                    Err(DatasetError::InvalidLikeCount { row: 5, .. })
                ),
                "{} 应被拒绝",
                raw
            );
        }
    }

    #[test]
    fn test_round_trip_preserves_aggregates() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        let output = dir.path().join("output.csv");
        std::fs::write(&input, SAMPLE).unwrap();

        let schema = TableSchema::default();
        let (_, videos) = load_videos(&input, &schema).unwrap();
        save_all_sentiment(&videos, &input, &output, &schema).unwrap();
        let (_, reloaded) = load_videos(&output, &schema).unwrap();

        assert_eq!(videos, reloaded);
        assert_eq!(std::fs::read_to_string(&input).unwrap(), SAMPLE);
    }

    #[test]
    fn test_refuse_to_overwrite_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, SAMPLE).unwrap();

        let schema = TableSchema::default();
        let (_, videos) = load_videos(&input, &schema).unwrap();
        let err = save_comments_sentiment(&videos, &input, &input, &schema).unwrap_err();
        assert!(matches!(err, DatasetError::OutputIsInput(_)));
    }
}
