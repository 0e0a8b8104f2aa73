// Minimal Electron asar codec: just enough to unpack Slack's resource
// archive, rewrite one member and pack it back. The container is two
// little-endian "pickle" blocks followed by the concatenated file contents:
//
//   u32 = 4                      size of the first pickle payload
//   u32 = header block length    (second pickle, including its own lengths)
//   u32 = header payload length
//   u32 = JSON string length
//   JSON directory, zero-padded to a 4-byte boundary
//   file contents, at the offsets recorded in the JSON (as decimal strings)
//
// Unsupported asar features (unpacked files, symlinks, executable flags,
// integrity blocks) are rejected or ignored rather than half-handled.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

const PICKLE_SIZE_LEN: u32 = 4;

/// The parsed archive header: the raw directory JSON (hashed for the
/// integrity diagnostic) and the absolute offset of the content region.
#[derive(Debug)]
pub struct Header {
    pub json: String,
    pub files_offset: u64,
}

/// One node of the JSON directory tree. Directories carry a `files` map,
/// files carry `size` and a stringified `offset` (JavaScript numbers cannot
/// hold 64-bit offsets, so asar stores them as strings).
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Entry {
    Dir { files: BTreeMap<String, Entry> },
    File { size: u64, offset: String },
}

/// Reads and validates the archive header without touching file contents.
pub fn read_header(archive: &Path) -> Result<Header> {
    let mut file =
        File::open(archive).with_context(|| format!("open {}", archive.display()))?;

    let mut lengths = [0u8; 16];
    file.read_exact(&mut lengths)
        .context("archive too short for asar header")?;
    let magic = u32::from_le_bytes(lengths[0..4].try_into().unwrap());
    let header_block_len = u32::from_le_bytes(lengths[4..8].try_into().unwrap());
    let payload_len = u32::from_le_bytes(lengths[8..12].try_into().unwrap());
    let json_len = u32::from_le_bytes(lengths[12..16].try_into().unwrap());

    if magic != PICKLE_SIZE_LEN {
        bail!("not an asar archive (bad size pickle: {})", magic);
    }
    if json_len > payload_len || u64::from(payload_len) + 8 < u64::from(header_block_len) {
        bail!(
            "inconsistent asar header lengths (block {}, payload {}, json {})",
            header_block_len,
            payload_len,
            json_len
        );
    }

    let mut json = vec![0u8; json_len as usize];
    file.read_exact(&mut json).context("truncated asar header")?;
    let json = String::from_utf8(json).context("asar header is not UTF-8")?;

    Ok(Header {
        json,
        files_offset: 8 + u64::from(header_block_len),
    })
}

/// Unpacks the whole archive into `dest`, recreating the directory tree.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let header = read_header(archive)?;
    let root: Entry =
        serde_json::from_str(&header.json).context("failed to parse asar directory")?;
    let Entry::Dir { ref files } = root else {
        bail!("asar root entry is not a directory");
    };

    let mut file =
        File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let archive_len = file
        .metadata()
        .with_context(|| format!("stat {}", archive.display()))?
        .len();
    std::fs::create_dir_all(dest)
        .with_context(|| format!("create_dir_all failed for {}", dest.display()))?;
    extract_dir(&mut file, header.files_offset, archive_len, files, dest)
}

fn extract_dir(
    file: &mut File,
    files_offset: u64,
    archive_len: u64,
    entries: &BTreeMap<String, Entry>,
    dest: &Path,
) -> Result<()> {
    for (name, entry) in entries {
        check_member_name(name)?;
        let path = dest.join(name);
        match entry {
            Entry::Dir { files } => {
                std::fs::create_dir_all(&path)
                    .with_context(|| format!("create_dir_all failed for {}", path.display()))?;
                extract_dir(file, files_offset, archive_len, files, &path)?;
            }
            Entry::File { size, offset } => {
                let offset: u64 = offset
                    .parse()
                    .with_context(|| format!("bad offset \"{}\" for {}", offset, name))?;
                // Sizes and offsets come from the untrusted header. Check
                // them against the real file length before allocating, or a
                // crafted archive could abort the process on allocation.
                let end = files_offset
                    .checked_add(offset)
                    .and_then(|start| start.checked_add(*size));
                match end {
                    Some(end) if end <= archive_len => {}
                    _ => bail!(
                        "member {} claims {} bytes at offset {}, past the end of the archive",
                        name,
                        size,
                        offset
                    ),
                }
                let mut contents = vec![0u8; *size as usize];
                file.seek(SeekFrom::Start(files_offset + offset))?;
                file.read_exact(&mut contents)
                    .with_context(|| format!("truncated contents for {}", name))?;
                std::fs::write(&path, contents)
                    .with_context(|| format!("write {}", path.display()))?;
            }
        }
    }
    Ok(())
}

// Archive members are attacker-ish input; never let one escape `dest`.
fn check_member_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !ok {
        bail!("unsafe member name \"{}\" in archive", name);
    }
    Ok(())
}

/// Packs the tree under `src` into a fresh archive at `archive`,
/// overwriting any existing file. Entries are written in sorted name order,
/// so packing the output of `extract` reproduces the archive byte for byte.
pub fn create_package(src: &Path, archive: &Path) -> Result<()> {
    let mut contents: Vec<std::path::PathBuf> = Vec::new();
    let mut next_offset = 0u64;
    let root = Entry::Dir {
        files: scan_dir(src, &mut next_offset, &mut contents)?,
    };
    let json = serde_json::to_string(&root).context("failed to serialize asar directory")?;

    let mut file =
        File::create(archive).with_context(|| format!("create {}", archive.display()))?;
    write_header(&mut file, json.as_bytes())?;
    for path in contents {
        let bytes =
            std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        file.write_all(&bytes)?;
    }
    Ok(())
}

fn scan_dir(
    dir: &Path,
    next_offset: &mut u64,
    contents: &mut Vec<std::path::PathBuf>,
) -> Result<BTreeMap<String, Entry>> {
    let mut names: Vec<String> = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))?
    {
        let name = entry?.file_name();
        match name.into_string() {
            Ok(name) => names.push(name),
            Err(name) => bail!("non-UTF-8 file name {:?} under {}", name, dir.display()),
        }
    }
    // Offsets are assigned in the same sorted order the BTreeMap serializes
    // in, which is also the order contents are appended in.
    names.sort();

    let mut entries = BTreeMap::new();
    for name in names {
        let path = dir.join(&name);
        if path.is_dir() {
            let files = scan_dir(&path, next_offset, contents)?;
            entries.insert(name, Entry::Dir { files });
        } else {
            let size = std::fs::metadata(&path)
                .with_context(|| format!("stat {}", path.display()))?
                .len();
            entries.insert(
                name,
                Entry::File {
                    size,
                    offset: next_offset.to_string(),
                },
            );
            contents.push(path);
            *next_offset += size;
        }
    }
    Ok(entries)
}

fn write_header(file: &mut File, json: &[u8]) -> Result<()> {
    let json_len = u32::try_from(json.len()).context("asar header over 4GiB")?;
    let padded_len = json_len.div_ceil(4) * 4;
    let payload_len = 4 + padded_len;
    let header_block_len = 8 + padded_len;

    file.write_all(&PICKLE_SIZE_LEN.to_le_bytes())?;
    file.write_all(&header_block_len.to_le_bytes())?;
    file.write_all(&payload_len.to_le_bytes())?;
    file.write_all(&json_len.to_le_bytes())?;
    file.write_all(json)?;
    file.write_all(&vec![0u8; (padded_len - json_len) as usize])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn build_tree(root: &Path, files: &[(&str, &[u8])]) {
        for (name, contents) in files {
            let path = root.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
    }

    #[test]
    fn packs_and_extracts_a_tree() {
        let tmp_dir = TempDir::new("asar_test").unwrap();
        let src = tmp_dir.path().join("src");
        build_tree(
            &src,
            &[
                ("dist/preload.bundle.js", b"// original"),
                ("dist/nested/data.json", b"{}"),
                ("package.json", b"{\"name\":\"x\"}"),
            ],
        );

        let archive = tmp_dir.path().join("app.asar");
        create_package(&src, &archive).unwrap();

        let out = tmp_dir.path().join("out");
        extract(&archive, &out).unwrap();
        assert_eq!(
            std::fs::read(out.join("dist/preload.bundle.js")).unwrap(),
            b"// original"
        );
        assert_eq!(std::fs::read(out.join("dist/nested/data.json")).unwrap(), b"{}");
        assert_eq!(
            std::fs::read(out.join("package.json")).unwrap(),
            b"{\"name\":\"x\"}"
        );
    }

    #[test]
    fn repacking_an_extracted_archive_is_byte_identical() {
        let tmp_dir = TempDir::new("asar_test").unwrap();
        let src = tmp_dir.path().join("src");
        build_tree(&src, &[("dist/preload.bundle.js", b"abc"), ("b.txt", b"b")]);

        let first = tmp_dir.path().join("first.asar");
        create_package(&src, &first).unwrap();

        let out = tmp_dir.path().join("out");
        extract(&first, &out).unwrap();
        let second = tmp_dir.path().join("second.asar");
        create_package(&out, &second).unwrap();

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn header_json_describes_the_tree() {
        let tmp_dir = TempDir::new("asar_test").unwrap();
        let src = tmp_dir.path().join("src");
        build_tree(&src, &[("dist/preload.bundle.js", b"// original")]);

        let archive = tmp_dir.path().join("app.asar");
        create_package(&src, &archive).unwrap();

        let header = read_header(&archive).unwrap();
        assert_eq!(
            header.json,
            r#"{"files":{"dist":{"files":{"preload.bundle.js":{"size":11,"offset":"0"}}}}}"#
        );
        // 16 bytes of lengths plus the padded JSON.
        let padded = header.json.len().div_ceil(4) * 4;
        assert_eq!(header.files_offset, 16 + padded as u64);
    }

    #[test]
    fn rejects_non_asar_files() {
        let tmp_dir = TempDir::new("asar_test").unwrap();
        let bogus = tmp_dir.path().join("bogus.asar");
        std::fs::write(&bogus, b"definitely not an archive").unwrap();
        assert!(read_header(&bogus).is_err());

        let short = tmp_dir.path().join("short.asar");
        std::fs::write(&short, b"\x04\x00").unwrap();
        assert!(read_header(&short).is_err());
    }

    // A header is free to claim any size or offset; none of them may be
    // trusted before checking them against the archive's real length.
    fn archive_with_header(dir: &Path, json: &str) -> std::path::PathBuf {
        let archive = dir.join("crafted.asar");
        let mut file = File::create(&archive).unwrap();
        write_header(&mut file, json.as_bytes()).unwrap();
        archive
    }

    #[test]
    fn member_size_past_end_of_archive_is_an_error() {
        let tmp_dir = TempDir::new("asar_test").unwrap();
        let archive = archive_with_header(
            tmp_dir.path(),
            r#"{"files":{"big.bin":{"size":9223372036854775807,"offset":"0"}}}"#,
        );
        assert!(extract(&archive, &tmp_dir.path().join("out")).is_err());
    }

    #[test]
    fn member_offset_overflow_is_an_error() {
        let tmp_dir = TempDir::new("asar_test").unwrap();
        let archive = archive_with_header(
            tmp_dir.path(),
            r#"{"files":{"a.bin":{"size":1,"offset":"18446744073709551615"}}}"#,
        );
        assert!(extract(&archive, &tmp_dir.path().join("out")).is_err());
    }

    #[test]
    fn rejects_escaping_member_names() {
        assert!(check_member_name("../evil").is_err());
        assert!(check_member_name("/abs").is_err());
        assert!(check_member_name("ok.js").is_ok());
    }
}
