//! 选取策略
//!
//! 从视频的评论或图片中按点赞数选出送给 LLM 的代表性子集：
//! - 图片：按点赞数前 `top_image_percent`% 与其余部分切分（向上取整）
//! - 评论：点赞数前 K 条，再从剩余评论中按固定种子随机抽取若干条

use crate::models::{ImageComment, PlainComment};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// 选取参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// 随机抽样种子
    pub seed: u64,
    /// 按点赞数保留的评论条数
    pub top_comments: usize,
    /// 从剩余评论中随机抽取的条数
    pub sampled_comments: usize,
    /// 高赞图片所占百分比
    pub top_image_percent: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            top_comments: 20,
            sampled_comments: 5,
            top_image_percent: 10,
        }
    }
}

/// 图片分析所针对的切片
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlice {
    /// 点赞数前 10% 的高赞图片
    Top,
    /// 其余 90% 的图片
    Rest,
    /// 全部图片
    All,
}

impl ImageSlice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Rest => "rest",
            Self::All => "all",
        }
    }
}

/// ceil(len × percent / 100)，整数运算避免浮点误差
pub fn top_count(len: usize, percent: u32) -> usize {
    let percent = percent.min(100) as usize;
    (len * percent + 99) / 100
}

/// 按点赞数降序排列（点赞数相同时保持原有顺序）
fn sorted_by_likes<T, F>(items: &[T], likes: F) -> Vec<&T>
where
    F: Fn(&T) -> u64,
{
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| likes(b).cmp(&likes(a)));
    sorted
}

/// 将图片切分为高赞部分与其余部分，两者不重叠且合起来覆盖全部图片
pub fn split_by_popularity(
    images: &[ImageComment],
    top_percent: u32,
) -> (Vec<&ImageComment>, Vec<&ImageComment>) {
    let mut sorted = sorted_by_likes(images, |image| image.likes);
    let rest = sorted.split_off(top_count(images.len(), top_percent));
    (sorted, rest)
}

/// 取出指定切片的图片（按点赞数降序）
pub fn select_images<'a>(
    images: &'a [ImageComment],
    slice: ImageSlice,
    config: &SelectionConfig,
) -> Vec<&'a ImageComment> {
    let (top, rest) = split_by_popularity(images, config.top_image_percent);
    match slice {
        ImageSlice::Top => top,
        ImageSlice::Rest => rest,
        ImageSlice::All => top.into_iter().chain(rest).collect(),
    }
}

/// 选出高赞评论，再追加从剩余评论中随机抽取的评论
pub fn select_comments<'a>(
    comments: &'a [PlainComment],
    config: &SelectionConfig,
) -> Vec<&'a PlainComment> {
    let mut selected = sorted_by_likes(comments, |comment| comment.likes);
    let remaining = selected.split_off(config.top_comments.min(selected.len()));

    let mut rng = StdRng::seed_from_u64(config.seed);
    let amount = config.sampled_comments.min(remaining.len());
    selected.extend(remaining.choose_multiple(&mut rng, amount).copied());
    selected
}

/// 合并评论内容，以换行分隔
pub fn merge_comments(comments: &[&PlainComment]) -> String {
    comments
        .iter()
        .map(|comment| comment.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageId;

    fn images(likes: &[u64]) -> Vec<ImageComment> {
        likes
            .iter()
            .enumerate()
            .map(|(i, &likes)| ImageComment {
                id: ImageId::new(i.to_string()),
                likes,
                text: None,
                sentiment: None,
            })
            .collect()
    }

    fn comments(count: usize) -> Vec<PlainComment> {
        (0..count)
            .map(|i| PlainComment {
                content: format!("评论{}", i),
                likes: i as u64,
            })
            .collect()
    }

    #[test]
    fn test_top_count_rounds_up() {
        assert_eq!(top_count(0, 10), 0);
        assert_eq!(top_count(1, 10), 1);
        assert_eq!(top_count(10, 10), 1);
        assert_eq!(top_count(11, 10), 2);
        assert_eq!(top_count(12, 10), 2);
        // 30 * 0.1 在浮点下会得到 3.0000000000000004
        assert_eq!(top_count(30, 10), 3);
        assert_eq!(top_count(5, 150), 5);
    }

    #[test]
    fn test_split_partitions_images() {
        for n in 0..60 {
            let likes: Vec<u64> = (0..n as u64).collect();
            let images = images(&likes);
            let (top, rest) = split_by_popularity(&images, 10);
            assert_eq!(top.len(), top_count(n, 10));
            assert_eq!(top.len() + rest.len(), n);

            let mut ids: Vec<_> = top.iter().chain(rest.iter()).map(|i| i.id.clone()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), n);
        }
    }

    #[test]
    fn test_twelve_images_example() {
        let images = images(&[20, 50, 10, 40, 30, 5, 1, 2, 3, 4, 6, 7]);
        let (top, rest) = split_by_popularity(&images, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(rest.len(), 10);
        assert_eq!(top[0].likes, 50);
        assert_eq!(top[1].likes, 40);
        assert!(rest.iter().all(|image| image.likes <= 30));

        let config = SelectionConfig::default();
        assert_eq!(select_images(&images, ImageSlice::Top, &config).len(), 2);
        assert_eq!(select_images(&images, ImageSlice::Rest, &config).len(), 10);
        assert_eq!(select_images(&images, ImageSlice::All, &config).len(), 12);
    }

    #[test]
    fn test_comment_selection_bounds() {
        let config = SelectionConfig::default();
        for n in [0, 1, 19, 20, 21, 24, 25, 26, 100] {
            let comments = comments(n);
            let selected = select_comments(&comments, &config);
            assert!(selected.len() <= 25);
            assert_eq!(selected.len(), n.min(25));
        }
    }

    #[test]
    fn test_comment_selection_order() {
        let comments = comments(40);
        let selected = select_comments(&comments, &SelectionConfig::default());

        let top: Vec<u64> = selected[..20].iter().map(|c| c.likes).collect();
        let expected: Vec<u64> = (20..40).rev().collect();
        assert_eq!(top, expected);
        assert!(selected[20..].iter().all(|c| c.likes < 20));
    }

    #[test]
    fn test_comment_sampling_is_deterministic() {
        let comments = comments(200);
        let config = SelectionConfig::default();
        let first: Vec<_> = select_comments(&comments, &config)
            .iter()
            .map(|c| c.content.clone())
            .collect();
        let second: Vec<_> = select_comments(&comments, &config)
            .iter()
            .map(|c| c.content.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_comments() {
        let comments = comments(3);
        let refs: Vec<&PlainComment> = comments.iter().collect();
        assert_eq!(merge_comments(&refs), "评论0\n评论1\n评论2");
    }
}
