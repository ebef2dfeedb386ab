//! 1回のパイプライン実行で使う作業ディレクトリ。
//!
//! 外部ツールが期待するレイアウトは次のとおりです。
//!
//! ```text
//! <workspace>/
//!   images        -> 入力ディレクトリへのシンボリックリンク
//!   database.db   COLMAP の特徴量データベース
//!   sparse/0/     疎な再構成結果（OpenSplat が読む）
//! ```

use super::image_set::ImageSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = "splat-";
const IMAGES_DIR: &str = "images";
const DATABASE_FILE: &str = "database.db";
const SPARSE_DIR: &str = "sparse";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("作業ディレクトリを '{root}' に作成できません: {source}")]
    Create { root: PathBuf, source: io::Error },

    #[error("作業ディレクトリに入力画像を配置できません: {source}")]
    Images { source: io::Error },

    #[error("作業ディレクトリ内に '{path}' を作成できません: {source}")]
    Layout { path: PathBuf, source: io::Error },
}

/// 準備済みの作業ディレクトリ。
///
/// 準備が完了した時点で削除ガードは外されており、成功時も失敗時もディスク上に残ります。
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// `root` の下に一意な名前の作業ディレクトリを作り、画像と出力先を配置します。
    ///
    /// 途中で失敗した場合、作りかけのディレクトリは削除されます。
    pub fn prepare(root: &Path, images: &ImageSet) -> Result<Self, WorkspaceError> {
        let create_err = |source| WorkspaceError::Create {
            root: root.to_path_buf(),
            source,
        };
        let root = std::path::absolute(root).map_err(create_err)?;
        fs::create_dir_all(&root).map_err(create_err)?;

        // ここで失敗した場合は guard の drop でディレクトリごと消える
        let guard = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&root)
            .map_err(create_err)?;

        let workspace = Self {
            dir: guard.path().to_path_buf(),
        };
        link_images(images, &workspace.images_dir())
            .map_err(|source| WorkspaceError::Images { source })?;
        let sparse = workspace.sparse_dir();
        fs::create_dir(&sparse).map_err(|source| WorkspaceError::Layout {
            path: sparse.clone(),
            source,
        })?;

        let dir = guard.keep();
        debug!(workspace = %dir.display(), "作業ディレクトリを準備しました");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.join(IMAGES_DIR)
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.join(DATABASE_FILE)
    }

    /// 再構成ツールの出力先 (`sparse/`)。
    pub fn sparse_dir(&self) -> PathBuf {
        self.dir.join(SPARSE_DIR)
    }

    /// 番号付きモデルのディレクトリ (`sparse/<index>`)。
    pub fn model_dir(&self, index: usize) -> PathBuf {
        self.sparse_dir().join(index.to_string())
    }

    /// 指定したモデルが空でないディレクトリとして存在するか。
    pub fn has_model(&self, index: usize) -> bool {
        fs::read_dir(self.model_dir(index))
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// `path` が作業ディレクトリそのもの、またはその配下を指しているか。
    ///
    /// `..` やシンボリックリンクを経由した指定も解決して比較します。
    pub fn contains(&self, path: &Path) -> bool {
        let (Ok(dir), Ok(target)) = (fs::canonicalize(&self.dir), resolve_path(path)) else {
            return false;
        };
        target.starts_with(dir)
    }
}

/// 存在する最も深い祖先を正規化し、残り（まだ存在しない部分）を字句的に連結します。
fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    let mut existing = abs.as_path();
    let mut missing = Vec::new();
    let mut resolved = loop {
        match fs::canonicalize(existing) {
            Ok(resolved) => break resolved,
            Err(_) => {
                let (Some(last), Some(parent)) =
                    (existing.components().next_back(), existing.parent())
                else {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("'{}' を解決できません", path.display()),
                    ));
                };
                missing.push(last.as_os_str().to_os_string());
                existing = parent;
            }
        }
    };
    for name in missing.into_iter().rev() {
        match Path::new(&name).components().next() {
            Some(Component::ParentDir) => {
                resolved.pop();
            }
            Some(Component::CurDir) => {}
            _ => resolved.push(name),
        }
    }
    Ok(resolved)
}

/// `images` を入力ディレクトリへのリンクにします。リンクが作れない環境では画像をコピーします。
fn link_images(images: &ImageSet, link: &Path) -> io::Result<()> {
    let target = fs::canonicalize(images.dir())?;
    match symlink_dir(&target, link) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(error = %e, "シンボリックリンクを作成できないため、画像をコピーします");
            copy_images(images, link)
        }
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_dir(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

fn copy_images(images: &ImageSet, dest: &Path) -> io::Result<()> {
    fs::create_dir(dest)?;
    for image in images.images() {
        if let Some(name) = image.file_name() {
            fs::copy(image, dest.join(name))?;
        }
    }
    Ok(())
}
