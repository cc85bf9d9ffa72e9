// usbtime - platform/fs.rs
//
// Filesystem helpers used by the app layer. Core never opens files itself.

use std::io;
use std::path::Path;

/// Read the full content of a file as a string.
///
/// For files with invalid UTF-8, uses lossy conversion; kernel logs
/// captured over serial consoles routinely contain stray bytes.
pub fn read_file_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Create (or truncate) an output file behind a buffered writer.
pub fn create_output(path: &Path) -> io::Result<io::BufWriter<std::fs::File>> {
    let file = std::fs::File::create(path)?;
    Ok(io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_file_lossy_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dmesg.log");
        std::fs::write(&path, b"[ 1.0] usb 1-1: usb ok\xff\n").unwrap();
        let content = read_file_lossy(&path).unwrap();
        assert!(content.starts_with("[ 1.0] usb 1-1: usb ok"));
        assert!(content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_create_output_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old contents that are longer").unwrap();
        {
            let mut w = create_output(&path).unwrap();
            w.write_all(b"new").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
