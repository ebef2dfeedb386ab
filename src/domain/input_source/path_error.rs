use thiserror::Error;

/// 入力パスの検証で発生するエラー。
#[derive(Debug, Error)]
pub enum PathError {
    #[error("無効なパスです: {0}")]
    InvalidPath(String),

    #[error("I/Oエラー: {0}")]
    IoError(#[from] std::io::Error),
}
