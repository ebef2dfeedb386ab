use super::input_source::directory_path::DirectoryPath;
use super::input_source::path_error::PathError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// SfMが成立するために必要な最小の画像枚数。
pub const MIN_IMAGES: usize = 3;

// --- 構造体定義 ---

/// 検証済みの入力画像セット。
///
/// `from_directory` を通じてのみインスタンス化でき、その際に以下の点が保証されます。
/// - 入力ディレクトリが存在し、読み取り可能であること
/// - 認識できる画像ファイルが `MIN_IMAGES` 枚以上含まれていること
#[derive(Debug, PartialEq)]
pub struct ImageSet {
    dir: PathBuf,
    images: Vec<PathBuf>,
}

// --- エラー定義 ---

/// 入力画像セットの検証エラー。
#[derive(Debug, Error)]
pub enum ImageSetError {
    #[error(transparent)]
    Path(#[from] PathError),

    /// 画像が足りない場合。`found` には見つかった枚数が入ります。
    #[error(
        "'{dir}' に画像が {found} 枚しかありません。少なくとも {required} 枚の jpg/jpeg/png/tif/tiff が必要です。"
    )]
    TooFewImages {
        dir: PathBuf,
        found: usize,
        required: usize,
    },
}

// --- 実装ブロック ---

impl ImageSet {
    /// ディレクトリを検証し、画像セットを作成します。
    ///
    /// # 戻り値
    /// * `Ok(ImageSet)`: 画像が `MIN_IMAGES` 枚以上ある場合。
    /// * `Err(ImageSetError)`: ディレクトリが無効か、画像が足りない場合。
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, ImageSetError> {
        let dir = DirectoryPath::new(dir)?;
        let images = dir.image_files()?;

        if images.len() < MIN_IMAGES {
            return Err(ImageSetError::TooFewImages {
                dir: dir.path,
                found: images.len(),
                required: MIN_IMAGES,
            });
        }

        Ok(Self {
            dir: dir.path,
            images,
        })
    }

    /// 保持している画像の枚数を返します。
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// 常に `false`（空の画像セットは作成できないため）。
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    // --- ゲッターメソッド ---

    pub fn dir(&self) -> &Path {
        &self.dir
    }
    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }
}

// --- テストモジュール ---
