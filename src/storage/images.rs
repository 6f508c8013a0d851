// 图片文件定位 - 按图片标识拼出本地路径

use crate::models::{ImageId, ImageSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 图片目录配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageStoreConfig {
    /// 图片所在目录
    pub image_dir: PathBuf,
    /// 图片扩展名（不含点）
    pub extension: String,
}

impl Default for ImageStoreConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("data/images"),
            extension: "jpg".to_string(),
        }
    }
}

/// 图片仓库，图片以 `{image_dir}/{id}.{extension}` 存放
#[derive(Debug, Clone)]
pub struct ImageStore {
    config: ImageStoreConfig,
}

impl ImageStore {
    pub fn new(config: ImageStoreConfig) -> Self {
        Self { config }
    }

    pub fn path_for(&self, id: &ImageId) -> PathBuf {
        let extension = self.config.extension.trim_start_matches('.');
        self.config
            .image_dir
            .join(format!("{}.{}", id.as_str(), extension))
    }

    pub fn locate(&self, id: &ImageId) -> ImageSource {
        ImageSource::Path(self.path_for(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_image() {
        let store = ImageStore::new(ImageStoreConfig {
            image_dir: PathBuf::from("/data/img"),
            extension: ".png".to_string(),
        });
        assert_eq!(
            store.locate(&ImageId::new("7421")),
            ImageSource::Path(PathBuf::from("/data/img/7421.png"))
        );
    }
}
