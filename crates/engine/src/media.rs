//! Media artifacts under `files/media`

use std::path::Path;

use runscope_core::MediaFile;
use walkdir::WalkDir;

/// Subdirectory of the run directory holding media
pub const MEDIA_DIR: &str = "media";

/// Extensions counted as media
pub const MEDIA_EXTENSIONS: [&str; 2] = ["gif", "mp4"];

/// Check whether a path names a media file
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// At least one media file exists anywhere under `media_dir`
pub fn has_media(media_dir: &Path) -> bool {
    WalkDir::new(media_dir)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| entry.file_type().is_file() && is_media_file(entry.path()))
}

/// List media files under `media_dir`, sorted by epoch
///
/// `files_dir` is the run's `files/` directory; each entry's
/// `relative_path` is taken against it. Files are ordered by path first so
/// that files sharing an epoch (or lacking one) come out in a stable order.
pub fn list_media(files_dir: &Path, media_dir: &Path) -> Vec<MediaFile> {
    let mut files: Vec<MediaFile> = WalkDir::new(media_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_media_file(entry.path()))
        .map(|entry| {
            let path = entry.into_path();
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let name = path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let relative_path = path
                .strip_prefix(files_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            MediaFile {
                epoch: MediaFile::epoch_from_name(&name),
                path,
                filename,
                name,
                relative_path,
            }
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    MediaFile::sort_by_epoch(&mut files);
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_has_media_recursive() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("files").join(MEDIA_DIR);
        assert!(!has_media(&media));

        touch(media.join("notes.txt"));
        assert!(!has_media(&media));

        touch(media.join("videos").join("deep").join("clip.mp4"));
        assert!(has_media(&media));
    }

    #[test]
    fn test_list_media_sorted_by_epoch() {
        let dir = TempDir::new().unwrap();
        let files = dir.path().join("files");
        let media = files.join(MEDIA_DIR);
        touch(media.join("videos").join("nomatch.gif"));
        touch(media.join("videos").join("epoch10_y.gif"));
        touch(media.join("videos").join("epoch2_x.gif"));
        touch(media.join("videos").join("epoch2_a.mp4"));
        touch(media.join("videos").join("readme.md"));

        let listed = list_media(&files, &media);
        let names: Vec<_> = listed.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["epoch2_a.mp4", "epoch2_x.gif", "epoch10_y.gif", "nomatch.gif"]
        );
        assert_eq!(listed[0].epoch, Some(2));
        assert_eq!(listed[0].name, "epoch2_a");
        assert_eq!(
            listed[0].relative_path,
            PathBuf::from("media").join("videos").join("epoch2_a.mp4")
        );
        assert_eq!(listed[3].epoch, None);
    }

    #[test]
    fn test_list_media_missing_dir() {
        let dir = TempDir::new().unwrap();
        let files = dir.path().join("files");
        assert!(list_media(&files, &files.join(MEDIA_DIR)).is_empty());
    }
}
