use crate::utils::error::{InstallerError, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::ZipArchive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub index: usize,
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// 위치 지정 읽기로 하나의 파일 핸들을 여러 스레드가 공유하는 리더
#[derive(Debug, Clone)]
pub struct SharedFile {
    file: Arc<File>,
    len: u64,
    pos: u64,
}

impl SharedFile {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file: Arc::new(file),
            len,
            pos: 0,
        })
    }
}

impl Read for SharedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = read_at(&self.file, buf, self.pos)?;
        self.pos += read as u64;
        Ok(read)
    }
}

impl Seek for SharedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let next = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        let Some(next) = next else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            ));
        };
        self.pos = next;
        Ok(next)
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

/// 설치 아카이브 핸들
///
/// 중앙 디렉토리는 한 번만 파싱하고, 복제본마다 독립적인 엔트리 스트림을 연다.
#[derive(Debug, Clone)]
pub struct InstallArchive {
    path: PathBuf,
    inner: ZipArchive<SharedFile>,
}

impl InstallArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let file = SharedFile::open(path).map_err(|e| InstallerError::ArchiveOpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let inner = ZipArchive::new(file).map_err(|e| InstallerError::ArchiveOpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(self.inner.len());
        for index in 0..self.inner.len() {
            let file =
                self.inner
                    .by_index_raw(index)
                    .map_err(|e| InstallerError::ArchiveOpenFailed {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    })?;
            entries.push(ArchiveEntry {
                index,
                name: file.name().to_string(),
                size: file.size(),
                is_dir: file.is_dir(),
            });
        }
        Ok(entries)
    }

    /// 엔트리의 압축 해제 스트림을 열어 `read`에 넘긴다.
    pub fn read_entry<T>(
        &mut self,
        entry: &ArchiveEntry,
        read: impl FnOnce(&mut dyn Read) -> io::Result<T>,
    ) -> io::Result<T> {
        let mut file = self.inner.by_index(entry.index).map_err(io::Error::from)?;
        read(&mut file)
    }
}
