use super::path_error::PathError;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 認識する画像の拡張子（小文字）。
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "tif", "tiff"];

// 構造体としてDirectoryPathを定義
#[derive(Debug)]
pub struct DirectoryPath {
    pub path: PathBuf,
}

impl DirectoryPath {
    // コンストラクタ: パスを受け取り、存在・ディレクトリ・読み取り可能の3点を検証する
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, PathError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PathError::InvalidPath(format!(
                "パス '{}' は存在しません。",
                path.display()
            )));
        }
        if !path.is_dir() {
            return Err(PathError::InvalidPath(format!(
                "パス '{}' はディレクトリではありません。",
                path.display()
            )));
        }
        if let Err(e) = fs::read_dir(path) {
            return Err(PathError::InvalidPath(format!(
                "ディレクトリ '{}' を読み取れません: {}",
                path.display(),
                e
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// ディレクトリ直下（非再帰）の画像ファイルをソート済みで返します。
    pub fn image_files(&self) -> Result<Vec<PathBuf>, PathError> {
        let mut images = Vec::new();
        for entry in WalkDir::new(&self.path).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| match e.into_io_error() {
                Some(io) => PathError::IoError(io),
                None => PathError::InvalidPath(format!(
                    "ディレクトリ '{}' の走査に失敗しました。",
                    self.path.display()
                )),
            })?;
            if is_image_file(entry.path()) {
                images.push(entry.into_path());
            }
        }
        // 読み取り順序は保証されないためソートする
        images.sort();
        Ok(images)
    }
}

/// パスがサポートされている画像ファイルであるか、拡張子で判定します。
pub fn is_image_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    // `.jpg` のようなドットファイルは拡張子なしと解釈されるので、ここで除外される
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// 正常なディレクトリパスでDirectoryPathが作成できるかテスト
    #[test]
    fn test_valid_directory_path() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path();

        let dir_path_instance = DirectoryPath::new(path).expect("valid dir");
        assert_eq!(dir_path_instance.path, path);
    }

    /// 存在しないパスでエラーが返されるかテスト
    #[test]
    fn test_non_existent_path_returns_error() {
        let path = PathBuf::from("this_directory_should_not_exist");
        let err = DirectoryPath::new(&path).unwrap_err();
        if let PathError::InvalidPath(msg) = err {
            assert!(msg.contains("存在しません"));
        } else {
            panic!("予期せぬエラーが返されました: {:?}", err);
        }
    }

    /// ファイルパスでエラーが返されるかテスト
    #[test]
    fn test_file_path_returns_error() {
        let file_path = PathBuf::from("Cargo.toml"); // 常に存在するファイル
        let err = DirectoryPath::new(&file_path).unwrap_err();
        if let PathError::InvalidPath(msg) = err {
            assert!(msg.contains("ディレクトリではありません"));
        } else {
            panic!("予期せぬエラーが返されました: {:?}", err);
        }
    }

    /// 画像だけを非再帰で拾い、拡張子の大文字小文字を区別しないこと
    #[test]
    fn test_image_files_filters_by_extension() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path();
        for name in ["b.JPG", "a.jpeg", "c.png", "d.Tif", "e.tiff", "notes.txt", "f.gif"] {
            fs::write(path.join(name), b"x").expect("Failed to create file");
        }
        fs::write(path.join(".jpg"), b"x").expect("Failed to create dotfile");
        fs::create_dir(path.join("nested.png")).expect("Failed to create subdir");
        fs::create_dir(path.join("sub")).expect("Failed to create subdir");
        fs::write(path.join("sub").join("deep.jpg"), b"x").expect("Failed to create file");

        let dir_path = DirectoryPath::new(path).unwrap();
        let names: Vec<String> = dir_path
            .image_files()
            .expect("image_files should not fail")
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.jpeg", "b.JPG", "c.png", "d.Tif", "e.tiff"]);
    }

    /// 空のディレクトリでは空のリストが返ること
    #[test]
    fn test_image_files_empty_directory() {
        let dir = tempdir().expect("Failed to create empty directory");
        let dir_path = DirectoryPath::new(dir.path()).unwrap();
        assert!(dir_path.image_files().unwrap().is_empty());
    }

    /// 検証をスキップして存在しないパスを持たせた場合はI/Oエラーになること
    #[test]
    fn test_image_files_returns_io_error() {
        let dir_path = DirectoryPath {
            path: PathBuf::from("this_path_definitely_does_not_exist"),
        };
        let err = dir_path.image_files().unwrap_err();
        if let PathError::IoError(e) = err {
            assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
        } else {
            panic!("予期せぬエラーが返されました: {:?}", err);
        }
    }
}
