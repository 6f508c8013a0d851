// 提示词构建 - 评论区氛围、图片有害性与模因提取

use super::plugin::{CommentSentimentRequest, ImageJudgmentRequest, MemeRequest};

/// 评论区氛围缺失时的占位文本
const UNKNOWN_SENTIMENT: &str = "（暂无评论区整体氛围分析）";

/// 分辨有害图片的十二条原则
pub const HARM_PRINCIPLES: &str = r#"1. 语言和符号：是否含有针对特定种族、文化或跨种族关系的侮辱、贬低或攻击性文字与符号。
2. 视觉表达：是否夸张或丑化特定外貌特征，从而激发偏见或敌意。
3. 语境和意图：结合整体语境判断其是否意在制造分裂、传播仇恨，或让某一群体感到不被接纳、不被尊重。
4. 情感激发：是否刻意渲染仇恨、不安等负面情绪来引导观众反应。
5. 种族和文化表现：是否使用夸张的面部特征、肤色、服饰等种族刻板印象，或嘲讽、贬低文化符号与习俗。
6. 性暗示和性别偏见：是否以低俗、物化的方式表现跨种族关系，或贬低女性角色、强化跨种族婚恋中的性别刻板印象。
7. 符号性元素和象征意义：是否借助负面符号、选择性展示或暗示，把某一群体与负面事件或道德评价联系起来。
8. 文化和社会影响：是否通过不当的文化对比贬低跨文化婚恋，或助长社会偏见与误解。
9. 讽刺与反语：是否以反语或讽刺暗示跨种族关系不正常、不可接受。
10. 直接攻击性：是否直接使用侮辱性语言、图像或符号羞辱、攻击某一群体或个人。
11. 污名化元素：是否传播负面信息，造成对某一群体、跨种族关系或性别角色的污名化。
12. 道德争议和社会联系：是否把特定群体或关系与负面社会观念、道德争议绑定，加深公众的污名化倾向。"#;

fn sentiment_or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        UNKNOWN_SENTIMENT
    } else {
        text
    }
}

pub fn comment_sentiment_prompt(request: &CommentSentimentRequest) -> String {
    let comments = if request.comments.trim().is_empty() {
        "（该视频没有可用的文字评论）"
    } else {
        request.comments.as_str()
    };

    format!(
        r#"# 任务：总结视频评论区的整体氛围
这是一个讲述黑人与中国人之间跨种族关系的视频。请结合视频标题、封面（如有）与评论内容，
总结视频作者的态度以及评论区观众看待这种跨种族关系的整体氛围。

分析时请特别注意：
1. 对黑人的负面情绪；
2. 借暗讽与性暗示表达的歧视和污名化内容；
3. 反语，尤其是用重复表达、简单却非常正面的词语或表情来表达嘲讽。

## 视频标题
{title}

## 评论（高赞评论与部分随机抽取的普通评论，需要结合上下文理解，可忽略无意义内容）
{comments}

## 输出格式（必须是合法 JSON）
{{
  "video_comment_sentiment_analysis": "评论区整体氛围的中文描述",
  "sentiment": "positive 或 negative（除去难以判断的评论，哪种声音更多）"
}}"#,
        title = request.video_title,
        comments = comments,
    )
}

pub fn image_judgment_prompt(request: &ImageJudgmentRequest) -> String {
    let caption = request
        .comments
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or("（无）");

    let principles = match &request.principles {
        Some(principles) => format!(
            "\n## 分辨 harmful 与 non_harmful 图片的原则\n{}\n\n语境仅供参考，并不绝对准确，请以上述原则为主做出判断。\n",
            principles
        ),
        None => "\n语境仅供参考，并不绝对准确；如果有充足的理由或证据，请做出更准确的判断。\n"
            .to_string(),
    };

    format!(
        r#"# 任务：判断评论区图片是否有害
这张图片来自一个与黑人和中国人跨种族关系有关的视频评论区。请结合视频标题和评论区整体氛围，
分析图片中的元素及其可能的含义，判断它是 harmful 还是 non_harmful。
{principles}
## 视频标题
{title}

## 评论区整体氛围
{sentiment}

## 与图片一同出现的评论文字
{caption}

## 输出格式（必须是合法 JSON）
{{
  "analysis": "简要说明判断依据（中文）",
  "sentiment": "harmful 或 non_harmful"
}}"#,
        principles = principles,
        title = request.video_title,
        sentiment = sentiment_or_placeholder(&request.video_comment_sentiment),
        caption = caption,
    )
}

pub fn meme_prompt(request: &MemeRequest) -> String {
    format!(
        r#"# 任务：提取高赞有害图片的模因
这是一张被判定为有害（harmful）的评论区高赞图片。请结合下面的语境分析图片元素，
具体说明它在该语境下是如何造成伤害的，例如使用了怎样的比喻、反语、讽刺、性暗示、
污名化、刻板印象或直接攻击。

## 视频标题
{title}

## 评论区对黑人与中国人跨种族关系的整体氛围
{sentiment}

## 输出格式（必须是合法 JSON，请分点具体说明）
{{
  "memes_of_harmful_images": ["第一点分析", "第二点分析"]
}}"#,
        title = request.video_title,
        sentiment = sentiment_or_placeholder(&request.video_comment_sentiment),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageSource;
    use std::path::PathBuf;

    fn image_request(principles: Option<String>) -> ImageJudgmentRequest {
        ImageJudgmentRequest {
            video_title: "异国恋第100天".to_string(),
            video_comment_sentiment: String::new(),
            image: ImageSource::Path(PathBuf::from("a.jpg")),
            comments: Some("  ".to_string()),
            principles,
        }
    }

    #[test]
    fn test_principles_has_twelve_items() {
        let numbered = HARM_PRINCIPLES
            .lines()
            .filter(|line| line.split('.').next().map_or(false, |n| n.parse::<u32>().is_ok()))
            .count();
        assert_eq!(numbered, 12);
    }

    #[test]
    fn test_image_prompt_with_and_without_rubric() {
        let with_rubric = image_judgment_prompt(&image_request(Some(HARM_PRINCIPLES.to_string())));
        assert!(with_rubric.contains("12. 道德争议和社会联系"));
        assert!(with_rubric.contains("异国恋第100天"));
        assert!(with_rubric.contains(UNKNOWN_SENTIMENT));
        assert!(with_rubric.contains("（无）"));

        let without = image_judgment_prompt(&image_request(None));
        assert!(!without.contains("道德争议和社会联系"));
    }

    #[test]
    fn test_comment_prompt_handles_empty_comments() {
        let prompt = comment_sentiment_prompt(&CommentSentimentRequest {
            video_title: "标题".to_string(),
            video_cover: None,
            comments: String::new(),
        });
        assert!(prompt.contains("没有可用的文字评论"));
        assert!(prompt.contains("\"sentiment\""));
    }
}
